use crate::types::{StreamEvent, ToolCallDelta};
use crate::utils::decode_or_default;
use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(to_line(&raw[..raw.len() - 1]));
        }
        lines
    }

    // Whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buf);
        Some(to_line(&raw))
    }
}

fn to_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end_matches('\r').to_string()
}

#[derive(Debug, PartialEq)]
pub enum SseLine {
    Events(Vec<StreamEvent>),
    Done,
    Ignored,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCallDelta {
    index: Option<u32>,
    id: Option<String>,
    function: Option<WireFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct WireFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

pub fn parse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Ignored;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return SseLine::Ignored;
    }
    if payload == DONE_SENTINEL {
        return SseLine::Done;
    }

    let Some(chunk) = decode_or_default::<Option<ChunkPayload>>(payload, "stream event") else {
        return SseLine::Ignored;
    };

    let mut events = Vec::new();
    for choice in chunk.choices {
        let delta = choice.delta;
        if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
            events.push(StreamEvent::Content(content));
        }
        for tc in delta.tool_calls.unwrap_or_default() {
            let (name, arguments) = match tc.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            events.push(StreamEvent::ToolCallDelta(ToolCallDelta {
                index: tc.index,
                id: tc.id.filter(|id| !id.is_empty()),
                name: name.filter(|n| !n.is_empty()),
                arguments: arguments.filter(|a| !a.is_empty()),
            }));
        }
    }

    if events.is_empty() {
        SseLine::Ignored
    } else {
        SseLine::Events(events)
    }
}
