use crate::error::AgentError;
use serde::de::DeserializeOwned;

pub fn clip(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = s[..end].to_string();
    out.push_str("… [truncated]");
    out
}

pub fn decode_or_default<T>(raw: &str, what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw = %clip(raw, 200),
                "malformed {}, using default",
                what
            );
            T::default()
        }
    }
}

pub async fn ensure_success(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, AgentError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::error!(service, status = status.as_u16(), body = %clip(&body, 500), "upstream call failed");
    Err(AgentError::Upstream {
        service,
        status: status.as_u16(),
        body,
    })
}
