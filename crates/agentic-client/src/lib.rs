//! Streaming consumer for agentic event streams.
//!
//! [`StreamClient::open`] posts a run request and returns a [`StreamSession`]
//! yielding typed events until the stream ends, fails or is cancelled.
//! [`run_chat`] drives one run end to end and hands projected lines to a
//! front end over a channel.

/// Chat driver and the updates it sends to the front end.
pub mod chat;
/// HTTP client that opens run streams.
pub mod client;
/// Client configuration and env loading.
pub mod config;
/// Public error types.
pub mod errors;
/// Live session over one run stream.
pub mod session;
mod sse;

pub use chat::{ChatOutcome, ChatUpdate, build_run_input, run_chat};
pub use client::StreamClient;
pub use config::{ClientConfig, DecodeFailurePolicy};
pub use errors::{ChatError, ConfigError, ConnectionError, SessionError, TransportError};
pub use session::{SessionStep, StreamSession};
