//! Run server for agentic event streams.
//!
//! Accepts a run request, validates its history and streams the scripted
//! run produced by [`RunOrchestrator`] as server-sent events.

/// Server configuration and env loading.
pub mod config;
/// Public error types.
pub mod errors;
/// Scripted run state machine and event sinks.
pub mod orchestrator;
/// HTTP routes.
pub mod routes;

pub use config::ServerConfig;
pub use errors::{ApiError, ConfigError, OrchestratorError};
pub use orchestrator::{EventSink, RunContext, RunOrchestrator, RunOutcome, RunPhase};
pub use routes::router;
