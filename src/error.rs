use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{service} returned HTTP {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("request to upstream failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
    #[error("invalid conversation: {0}")]
    InvalidConversation(String),
}

impl AgentError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        AgentError::InvalidConversation(reason.into())
    }

    /// Status reported by the upstream provider, when there was one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AgentError::Upstream { status, .. } => Some(*status),
            AgentError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("unknown LOG_FORMAT {0:?} (expected pretty, compact or json)")]
    UnknownLogFormat(String),
}
