//! Boundary to an LLM/tool-invocation backend.
//!
//! No backend ships in this workspace. [`drive`] is the loop an orchestrator
//! runs against one: ask the backend, execute proposed tool calls, feed the
//! results back as `tool` messages, stop on a text answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::DriverError;
use crate::event::{Message, ToolCall};
use crate::ids::generate_message_id;

pub const DEFAULT_ITERATION_BUDGET: u32 = 8;

/// Tool advertised to the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the arguments.
    #[serde(default)]
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Opaque, usually JSON.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendReply {
    Text(String),
    Invoke(ToolInvocation),
}

/// Produces the next assistant step for a history.
#[async_trait::async_trait]
pub trait ToolBackend: Send + Sync {
    async fn respond(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<BackendReply, DriverError>;
}

/// Executes a tool invocation and returns its result content.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, invocation: &ToolInvocation) -> Result<String, DriverError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveOutcome {
    pub answer: String,
    /// Input history plus every message produced by the loop.
    pub messages: Vec<Message>,
    /// Backend calls made, including the one that produced the answer.
    pub iterations: u32,
}

/// Runs the backend until it answers with text or `budget` calls are spent.
///
/// An empty `tools` list means discovery is open and any proposed tool name
/// is passed to the executor.
pub async fn drive(
    backend: &dyn ToolBackend,
    executor: &dyn ToolExecutor,
    input: Vec<Message>,
    tools: &[ToolSpec],
    budget: u32,
) -> Result<DriveOutcome, DriverError> {
    let mut messages = input;
    for iteration in 1..=budget {
        match backend.respond(&messages, tools).await? {
            BackendReply::Text(answer) => {
                debug!(iteration, "backend answered with text");
                messages.push(Message::assistant_text(generate_message_id(), answer.clone()));
                return Ok(DriveOutcome {
                    answer,
                    messages,
                    iterations: iteration,
                });
            }
            BackendReply::Invoke(invocation) => {
                if !tools.is_empty() && !tools.iter().any(|t| t.name == invocation.name) {
                    return Err(DriverError::UnknownTool(invocation.name));
                }
                debug!(iteration, tool = %invocation.name, "executing tool call");
                messages.push(Message::assistant_tool_calls(
                    generate_message_id(),
                    vec![ToolCall::function(
                        invocation.id.clone(),
                        invocation.name.clone(),
                        invocation.arguments.clone(),
                    )],
                ));
                let result = executor.execute(&invocation).await?;
                messages.push(Message::tool_result(
                    generate_message_id(),
                    invocation.id,
                    result,
                ));
            }
        }
    }
    Err(DriverError::BudgetExhausted { budget })
}
