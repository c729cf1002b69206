use crate::agent::Agent;
use crate::analysis::{Analysis, extract_analysis};
use crate::error::AgentError;
use crate::types::Message;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span, error, info_span, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub agent: Agent,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AgentError::InvalidConversation(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            AgentError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AgentError::Transport(_) => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
            AgentError::Decode(_) => (StatusCode::BAD_GATEWAY, "upstream_decode_error"),
        };
        let body = ErrorResponse {
            error: ErrorBody {
                message: self.to_string(),
                kind,
                upstream_status: self.upstream_status(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub fn build_router(agent: Agent) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/agent/chat", post(chat))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { agent })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// Enters `span` around every poll so logs from a stream consumed after the
// handler returns still carry the request's fields.
fn in_span<S>(span: Span, stream: S) -> impl Stream<Item = S::Item> + Send + 'static
where
    S: Stream + Send + 'static,
{
    let mut stream = Box::pin(stream);
    futures::stream::poll_fn(move |cx| {
        let _entered = span.enter();
        stream.as_mut().poll_next(cx)
    })
}

// SSE `data` lines split on `\n`; a bare `\r` would be read as a line break too.
fn event_data(text: &str) -> Event {
    Event::default().data(text.replace("\r\n", "\n").replace('\r', "\n"))
}

pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, stream = request.stream, messages = request.messages.len());

    if request.stream {
        let _guard = span.enter();
        return match state.agent.chat_stream(request.messages) {
            Ok(fragments) => {
                let events = in_span(span.clone(), fragments)
                    .map(move |fragment| {
                        fragment
                            .map(|text| event_data(&text))
                            .inspect_err(|e| error!(%request_id, error = %e, "chat stream failed"))
                    })
                    .chain(futures::stream::once(async {
                        Ok::<_, AgentError>(Event::default().data("[DONE]"))
                    }));
                Sse::new(events)
                    .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
                    .into_response()
            }
            Err(e) => {
                warn!(error = %e, "rejected chat request");
                e.into_response()
            }
        };
    }

    async move {
        match state.agent.chat(request.messages).await {
            Ok(response) => {
                let analysis = extract_analysis(&response);
                if let Some(analysis) = &analysis {
                    let unbalanced = analysis.unbalanced_questions();
                    if !unbalanced.is_empty() {
                        warn!(?unbalanced, "analysis percentages do not sum to 100");
                    }
                }
                Json(ChatResponse { response, analysis }).into_response()
            }
            Err(e) => {
                error!(error = %e, "chat request failed");
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}
