use std::fmt;

use crate::event::EventType;

/// Failure to turn one frame payload into an [`Event`](crate::Event).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not a JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// The discriminator names no catalog entry (empty when absent).
    #[error("unknown event type: {discriminator:?}")]
    UnknownEventType { discriminator: String },
    /// The payload does not have the shape its discriminator declares.
    #[error("payload does not match {event_type}: {reason}")]
    SchemaMismatch {
        event_type: EventType,
        reason: String,
    },
}

/// An event that decoded fine but cannot be turned into display lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectError {
    /// The remote reported a `RUN_ERROR`.
    #[error("run failed: {message}")]
    RunFailed {
        message: String,
        code: Option<String>,
    },
    /// Known catalog entry this consumer does not render yet.
    #[error("event type {0} is not yet supported")]
    Unsupported(EventType),
}

/// What is wrong with one field of an inbound history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    InvalidType { expected: &'static str },
    InvalidValue(String),
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => f.write_str("missing"),
            FieldProblem::InvalidType { expected } => write!(f, "expected {expected}"),
            FieldProblem::InvalidValue(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Position of the record in the submitted history.
    pub index: usize,
    /// Field path inside the record, e.g. `tool_calls[0].function.name`.
    pub field: String,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "messages[{}].{}: {}", self.index, self.field, self.problem)
    }
}

/// Every invalid field found while parsing a submitted history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParseError {
    pub issues: Vec<FieldIssue>,
}

impl fmt::Display for MessageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid message history")?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MessageParseError {}

/// Errors raised by the tool-call driver loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("tool `{name}` failed: {message}")]
    Tool { name: String, message: String },
    #[error("backend proposed unknown tool `{0}`")]
    UnknownTool(String),
    #[error("iteration budget of {budget} exhausted without a text answer")]
    BudgetExhausted { budget: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_lists_every_issue() {
        let err = MessageParseError {
            issues: vec![
                FieldIssue {
                    index: 0,
                    field: "role".into(),
                    problem: FieldProblem::InvalidValue("unknown role `bot`".into()),
                },
                FieldIssue {
                    index: 2,
                    field: "content".into(),
                    problem: FieldProblem::InvalidType { expected: "string" },
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "invalid message history: messages[0].role: unknown role `bot`; messages[2].content: expected string"
        );
    }
}
