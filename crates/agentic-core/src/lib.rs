//! Typed event model shared by the agentic stream server and client.
//!
//! One agent run is an ordered sequence of [`Event`]s. This crate owns the
//! catalog, its wire codec, the request payload, the projection of events to
//! display lines and the boundary to a tool-invoking backend.
//!
//! ```
//! use agentic_core::prelude::*;
//!
//! let frame = encode_frame(&Event::run_started("thread-1", "run-1"));
//! let event = decode_frame(&frame).expect("valid frame");
//! let lines = project(&event, &ProjectionStyle::default()).expect("rendered");
//! assert_eq!(lines[0].text, "Assistant: Run started");
//! ```

/// Cancellation handle, signal and drop guard.
pub mod abort;
/// Tool-call backend contracts and the driver loop.
pub mod adapter;
/// Frame payload encode/decode.
pub mod codec;
/// Public error types.
pub mod errors;
/// Event catalog, messages and tool calls.
pub mod event;
/// Identifier generation.
pub mod ids;
/// Run request payload and history parsing.
pub mod input;
/// Process-wide tracing setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Event to display line projection.
pub mod projector;

pub use abort::{AbortGuard, AbortHandle, AbortSignal, abort_pair};
pub use adapter::{
    BackendReply, DEFAULT_ITERATION_BUDGET, DriveOutcome, ToolBackend, ToolExecutor,
    ToolInvocation, ToolSpec, drive,
};
pub use codec::{Frame, decode, decode_frame, encode, encode_frame};
pub use errors::{
    DecodeError, DriverError, FieldIssue, FieldProblem, MessageParseError, ProjectError,
};
pub use event::{Event, EventType, FunctionCall, Message, PatchOp, PatchOpKind, Role, ToolCall};
pub use input::{RunAgentInput, parse_history};
pub use projector::{DisplayLine, ProjectionStyle, project};
