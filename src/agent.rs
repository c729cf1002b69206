use crate::conversation::Conversation;
use crate::error::AgentError;
use crate::llm_client::{EventStream, LlmClient};
use crate::prompts::SYSTEM_PROMPT;
use crate::search::{SearchClient, SearchQuery};
use crate::tool_registry::ToolRegistry;
use crate::types::{Message, StreamEvent, ToolCall, ToolCallDelta};
use crate::utils::decode_or_default;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type TextStream = BoxStream<'static, Result<String, AgentError>>;

fn boxed_text<S>(stream: S) -> TextStream
where
    S: futures::Stream<Item = Result<String, AgentError>> + Send + 'static,
{
    Box::pin(stream)
}

#[async_trait]
pub trait CompletionsApi: Send + Sync {
    async fn complete(&self, messages: &[Message], tools: &Value) -> Result<Message, AgentError>;
    async fn complete_streaming(&self, messages: &[Message], tools: &Value) -> Result<EventStream, AgentError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<String, AgentError>;
}

// Implement traits for the real clients
#[async_trait]
impl CompletionsApi for LlmClient {
    async fn complete(&self, messages: &[Message], tools: &Value) -> Result<Message, AgentError> {
        LlmClient::complete(self, messages, tools).await
    }

    async fn complete_streaming(&self, messages: &[Message], tools: &Value) -> Result<EventStream, AgentError> {
        LlmClient::complete_streaming(self, messages, tools).await
    }
}

#[async_trait]
impl SearchApi for SearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<String, AgentError> {
        SearchClient::search(self, query).await
    }
}

#[derive(Clone, Debug)]
pub struct AgentOptions {
    pub system_prompt: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamPhase {
    StreamingPass1,
    ToolsPending,
    StreamingPass2,
    Done,
}

// A fragment with an id not seen on the current call starts a new call;
// fragments without an id extend the current one.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    current: Option<ToolCall>,
    finished: Vec<ToolCall>,
}

impl ToolCallAccumulator {
    pub fn accept(&mut self, delta: ToolCallDelta) {
        let starts_new = match (&delta.id, &self.current) {
            (Some(id), Some(current)) => *id != current.id,
            (_, None) => true,
            (None, Some(_)) => false,
        };

        if starts_new {
            self.flush();
            let id = delta
                .id
                .clone()
                .unwrap_or_else(|| format!("call_{}", delta.index.unwrap_or(0)));
            self.current = Some(ToolCall::function(id, "", ""));
        }

        if let Some(call) = self.current.as_mut() {
            if let Some(name) = delta.name {
                call.function.name.push_str(&name);
            }
            if let Some(arguments) = delta.arguments {
                call.function.arguments.push_str(&arguments);
            }
        }
    }

    fn flush(&mut self) {
        if let Some(call) = self.current.take() {
            self.finished.push(call);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.finished.is_empty()
    }

    pub fn finish(mut self) -> Vec<ToolCall> {
        self.flush();
        self.finished
    }
}

#[derive(Clone)]
pub struct Agent {
    llm: Arc<dyn CompletionsApi>,
    search: Arc<dyn SearchApi>,
    tools: Arc<ToolRegistry>,
    opts: Arc<AgentOptions>,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn CompletionsApi>,
        search: Arc<dyn SearchApi>,
        tools: ToolRegistry,
        opts: AgentOptions,
    ) -> Self {
        Self {
            llm,
            search,
            tools: Arc::new(tools),
            opts: Arc::new(opts),
        }
    }

    fn prepare(&self, messages: Vec<Message>) -> Result<Conversation, AgentError> {
        let mut conversation = Conversation::from_messages(messages)?;
        if conversation.ensure_system_prompt(&self.opts.system_prompt) {
            debug!(conversation = %conversation.id(), "inserted system prompt");
        }
        Ok(conversation)
    }

    pub async fn chat(&self, messages: Vec<Message>) -> Result<String, AgentError> {
        let mut conversation = self.prepare(messages)?;

        let first = self
            .llm
            .complete(conversation.messages(), self.tools.schemas())
            .await?;

        let tool_calls = first.tool_calls().to_vec();
        if tool_calls.is_empty() {
            return Ok(first.into_content());
        }

        info!(conversation = %conversation.id(), calls = tool_calls.len(), "model requested tools");
        conversation.push(first)?;
        self.run_tools(&mut conversation, &tool_calls).await?;

        // Tools stay declared on the second pass; its answer is final either way.
        let second = self
            .llm
            .complete(conversation.messages(), self.tools.schemas())
            .await?;
        if !second.tool_calls().is_empty() {
            warn!(conversation = %conversation.id(), "ignoring tool calls on second pass");
        }
        Ok(second.into_content())
    }

    pub fn chat_stream(&self, messages: Vec<Message>) -> Result<TextStream, AgentError> {
        let mut conversation = self.prepare(messages)?;
        let agent = self.clone();

        let stream = async_stream::try_stream! {
            let mut phase = StreamPhase::StreamingPass1;
            let mut pass1_content = String::new();
            let mut pending: Vec<ToolCall> = Vec::new();

            loop {
                debug!(conversation = %conversation.id(), ?phase, "stream phase");
                match phase {
                    StreamPhase::StreamingPass1 => {
                        let mut events = agent
                            .llm
                            .complete_streaming(conversation.messages(), agent.tools.schemas())
                            .await?;
                        let mut accumulator = ToolCallAccumulator::default();
                        while let Some(event) = events.next().await {
                            match event? {
                                StreamEvent::Content(text) => {
                                    pass1_content.push_str(&text);
                                    yield text;
                                }
                                StreamEvent::ToolCallDelta(delta) => accumulator.accept(delta),
                            }
                        }
                        pending = accumulator.finish();
                        phase = if pending.is_empty() {
                            StreamPhase::Done
                        } else {
                            StreamPhase::ToolsPending
                        };
                    }
                    StreamPhase::ToolsPending => {
                        info!(conversation = %conversation.id(), calls = pending.len(), "model requested tools");
                        let calls = std::mem::take(&mut pending);
                        let content = std::mem::take(&mut pass1_content);
                        conversation.push(Message::assistant_tool_calls(Some(content), calls.clone()))?;
                        agent.run_tools(&mut conversation, &calls).await?;
                        phase = StreamPhase::StreamingPass2;
                    }
                    StreamPhase::StreamingPass2 => {
                        let mut events = agent
                            .llm
                            .complete_streaming(conversation.messages(), agent.tools.schemas())
                            .await?;
                        while let Some(event) = events.next().await {
                            match event? {
                                StreamEvent::Content(text) => {
                                    yield text;
                                }
                                StreamEvent::ToolCallDelta(_) => {
                                    debug!(conversation = %conversation.id(), "ignoring tool call fragment on second pass");
                                }
                            }
                        }
                        phase = StreamPhase::Done;
                    }
                    StreamPhase::Done => break,
                }
            }
        };
        Ok(boxed_text(stream))
    }

    async fn run_tools(&self, conversation: &mut Conversation, calls: &[ToolCall]) -> Result<(), AgentError> {
        for call in calls {
            if !self.tools.supports(&call.function.name) {
                warn!(tool = %call.function.name, id = %call.id, "unsupported tool, not dispatching");
                continue;
            }

            let query: SearchQuery = decode_or_default(&call.function.arguments, "tool arguments");
            info!(
                id = %call.id,
                query = %query.query,
                search_type = ?query.search_type,
                tbs = %query.time_range,
                "dispatching search"
            );
            let digest = self.search.search(&query).await?;
            conversation.push(Message::tool_result(call, digest))?;
        }
        Ok(())
    }
}
