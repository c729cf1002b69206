use crate::config::Config;
use crate::error::AgentError;
use crate::sse::{SseLine, SseLineBuffer, parse_line};
use crate::types::{Message, StreamEvent};
use crate::utils::ensure_success;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Duration;
use tracing::debug;

const SERVICE: &str = "completions";
const REFERER: &str = "https://github.com/soroban";
const TITLE: &str = "Soroban Simple Agent";

pub type EventStream = BoxStream<'static, Result<StreamEvent, AgentError>>;

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Message,
}

#[derive(Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // No request timeout; streamed answers can run for minutes.
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: config.completions_base_url.clone(),
            api_key: config.completions_api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            http,
        })
    }

    fn request(&self, messages: &[Message], tools: &Value, stream: bool) -> reqwest::RequestBuilder {
        let url = format!("{}/chat/completions", self.base_url);
        let mut req = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "tools": tools,
            "max_tokens": self.max_tokens,
        });
        if stream {
            req["stream"] = Value::Bool(true);
        }

        self.http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&req)
    }

    pub async fn complete(&self, messages: &[Message], tools: &Value) -> Result<Message, AgentError> {
        debug!(model = %self.model, messages = messages.len(), "requesting completion");
        let resp = self.request(messages, tools, false).send().await?;
        let resp = ensure_success(SERVICE, resp).await?;

        let text = resp.text().await?;
        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| AgentError::Decode(format!("completion body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::Decode("no choices in completion response".to_string()))
    }

    // Status errors surface here; transport errors surface as stream items.
    pub async fn complete_streaming(
        &self,
        messages: &[Message],
        tools: &Value,
    ) -> Result<EventStream, AgentError> {
        debug!(model = %self.model, messages = messages.len(), "opening completion stream");
        let resp = self.request(messages, tools, true).send().await?;
        let resp = ensure_success(SERVICE, resp).await?;
        Ok(decode_event_stream(resp.bytes_stream()))
    }
}

pub fn decode_event_stream<S, B, E>(body: S) -> EventStream
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<AgentError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut lines = SseLineBuffer::default();
        let mut done = false;
        futures::pin_mut!(body);

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err::<StreamEvent, AgentError>(e.into());
                    return;
                }
            };
            for line in lines.push(chunk.as_ref()) {
                match parse_line(&line) {
                    SseLine::Events(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    SseLine::Done => {
                        done = true;
                        break;
                    }
                    SseLine::Ignored => {}
                }
            }
            if done {
                break;
            }
        }

        if !done {
            if let Some(line) = lines.finish() {
                if let SseLine::Events(events) = parse_line(&line) {
                    for event in events {
                        yield Ok(event);
                    }
                }
            }
        }
    };
    Box::pin(stream)
}
