use std::time::Duration;

use agentic_core::DecodeError;

/// Invalid client configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {key}={value:?}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Failure to establish the stream. Reported once, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),
    /// DNS, TCP, TLS or request construction failure.
    #[error("request to {endpoint} failed: {message}")]
    Send { endpoint: String, message: String },
    #[error("stream request failed with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Stream I/O failure after the connection was established.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("no data received within {0:?}")]
    ReadTimeout(Duration),
    #[error("stream read failed: {0}")]
    Read(String),
}

/// Terminal failure of a [`StreamSession`](crate::StreamSession).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to process stream event: {0}")]
    EventProcessing(#[from] DecodeError),
}

/// Errors returned by [`run_chat`](crate::run_chat).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("failed to establish stream connection: {0}")]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
