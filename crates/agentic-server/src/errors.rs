use agentic_core::{EventType, MessageParseError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Invalid server configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {key}={value:?}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// The consumer went away while an event was being emitted.
    #[error("event sink closed while emitting {event_type}")]
    Sink { event_type: EventType },
}

/// Request rejected before any event is streamed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    InvalidHistory(#[from] MessageParseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::InvalidBody(detail) => serde_json::json!({
                "error": "Invalid request body",
                "details": [detail],
            }),
            ApiError::InvalidHistory(err) => serde_json::json!({
                "error": "Invalid message history",
                "details": err.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
