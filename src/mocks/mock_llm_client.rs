use crate::agent::CompletionsApi;
use crate::error::AgentError;
use crate::llm_client::EventStream;
use crate::types::{Message, StreamEvent, ToolCall, ToolCallDelta};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted completions provider. Responses are handed out in the order they
/// were added; every call records the messages it was sent.
#[derive(Clone, Default)]
pub struct MockLlmClient {
    responses: Arc<Mutex<VecDeque<Result<Message, AgentError>>>>,
    stream_responses: Arc<Mutex<VecDeque<Result<Vec<Result<StreamEvent, AgentError>>, AgentError>>>>,
    call_history: Arc<Mutex<Vec<Vec<Message>>>>,
    timeline: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text_response(&self, content: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Message::assistant(content)));
    }

    pub fn add_tool_call_response(&self, tool_name: &str, args: &str) {
        self.add_tool_calls_response(vec![ToolCall::function("test-call-123", tool_name, args)]);
    }

    pub fn add_tool_calls_response(&self, tool_calls: Vec<ToolCall>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Message::assistant_tool_calls(None, tool_calls)));
    }

    pub fn add_error_response(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Err(AgentError::Upstream {
            service: "completions",
            status,
            body: body.to_string(),
        }));
    }

    pub fn add_stream_response(&self, events: Vec<StreamEvent>) {
        self.stream_responses
            .lock()
            .unwrap()
            .push_back(Ok(events.into_iter().map(Ok).collect()));
    }

    /// A stream that yields `events` and then fails mid-body.
    pub fn add_broken_stream_response(&self, events: Vec<StreamEvent>) {
        let mut items: Vec<Result<StreamEvent, AgentError>> = events.into_iter().map(Ok).collect();
        items.push(Err(AgentError::Decode("connection reset".to_string())));
        self.stream_responses.lock().unwrap().push_back(Ok(items));
    }

    pub fn add_stream_error_response(&self, status: u16, body: &str) {
        self.stream_responses.lock().unwrap().push_back(Err(AgentError::Upstream {
            service: "completions",
            status,
            body: body.to_string(),
        }));
    }

    pub fn get_call_history(&self) -> Vec<Vec<Message>> {
        self.call_history.lock().unwrap().clone()
    }

    /// Shared log of requests; tests append their own entries to check ordering.
    pub fn timeline(&self) -> Arc<Mutex<Vec<String>>> {
        self.timeline.clone()
    }

    fn record(&self, messages: &[Message]) {
        let mut history = self.call_history.lock().unwrap();
        history.push(messages.to_vec());
        self.timeline
            .lock()
            .unwrap()
            .push(format!("request {}", history.len()));
    }
}

#[async_trait]
impl CompletionsApi for MockLlmClient {
    async fn complete(&self, messages: &[Message], _tools: &Value) -> Result<Message, AgentError> {
        self.record(messages);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Message::assistant("No more mock responses configured")))
    }

    async fn complete_streaming(&self, messages: &[Message], _tools: &Value) -> Result<EventStream, AgentError> {
        self.record(messages);
        let events = self
            .stream_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

pub fn content(text: &str) -> StreamEvent {
    StreamEvent::Content(text.to_string())
}

pub fn call_start(id: &str, name: &str) -> StreamEvent {
    StreamEvent::ToolCallDelta(ToolCallDelta {
        index: Some(0),
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        arguments: None,
    })
}

pub fn call_args(fragment: &str) -> StreamEvent {
    StreamEvent::ToolCallDelta(ToolCallDelta {
        index: Some(0),
        id: None,
        name: None,
        arguments: Some(fragment.to_string()),
    })
}
