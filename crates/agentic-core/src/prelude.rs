//! Common imports for producers and consumers of agent event streams.
pub use crate::{
    AbortHandle, AbortSignal, DecodeError, DisplayLine, Event, EventType, Frame, Message,
    ProjectError, ProjectionStyle, Role, RunAgentInput, ToolCall, abort_pair, decode_frame,
    encode_frame, parse_history, project,
};
