//! Scripted, cancellation-aware run producer.
//!
//! One run emits `RUN_STARTED`, a single `MESSAGES_SNAPSHOT` and
//! `RUN_FINISHED`. The snapshot carries the caller's history plus one
//! assistant reply: a `generate_haiku` tool call, or a plain text
//! acknowledgement when the last inbound message is a tool result.

use std::fmt;
use std::time::Duration;

use agentic_core::ids::{
    generate_message_id, generate_run_id, generate_thread_id, generate_tool_call_id,
};
use agentic_core::{
    AbortSignal, Event, Message, MessageParseError, Role, RunAgentInput, ToolCall, parse_history,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::OrchestratorError;

pub const HAIKU_TOOL: &str = "generate_haiku";
pub const HAIKU_CREATED: &str = "Haiku created";

#[derive(Serialize)]
struct Haiku {
    japanese: [&'static str; 3],
    english: [&'static str; 3],
}

const HAIKU: Haiku = Haiku {
    japanese: ["エーアイの", "橋つなぐ道", "コパキット"],
    english: ["From AI's realm", "A bridge-road linking us—", "CopilotKit."],
};

/// JSON arguments of the scripted `generate_haiku` call.
pub fn haiku_arguments() -> String {
    serde_json::to_string(&HAIKU).expect("haiku serialization is infallible")
}

/// Destination of emitted events.
#[async_trait::async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: Event) -> Result<(), OrchestratorError>;
}

#[async_trait::async_trait]
impl EventSink for mpsc::Sender<Event> {
    async fn emit(&mut self, event: Event) -> Result<(), OrchestratorError> {
        let event_type = event.event_type();
        self.send(event)
            .await
            .map_err(|_| OrchestratorError::Sink { event_type })
    }
}

#[async_trait::async_trait]
impl EventSink for Vec<Event> {
    async fn emit(&mut self, event: Event) -> Result<(), OrchestratorError> {
        self.push(event);
        Ok(())
    }
}

/// Last state the run reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    RunStarted,
    Deciding,
    MessagesSnapshot,
    RunFinished,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::RunStarted => "run-started",
            RunPhase::Deciding => "deciding",
            RunPhase::MessagesSnapshot => "messages-snapshot",
            RunPhase::RunFinished => "run-finished",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    /// Cancellation was observed after reaching `phase`; nothing further was emitted.
    Cancelled { phase: RunPhase },
}

/// Identity and validated history of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunContext {
    pub thread_id: String,
    pub run_id: String,
    pub history: Vec<Message>,
}

impl RunContext {
    /// Validates the request history, generating missing ids.
    pub fn from_input(input: &RunAgentInput) -> Result<Self, MessageParseError> {
        let history = parse_history(&input.messages)?;
        Ok(Self {
            thread_id: non_empty(input.thread_id.as_deref()).unwrap_or_else(generate_thread_id),
            run_id: non_empty(input.run_id.as_deref()).unwrap_or_else(generate_run_id),
            history,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(ToOwned::to_owned)
}

/// Produces the scripted event sequence for a run.
#[derive(Clone, Debug)]
pub struct RunOrchestrator {
    step_delay: Duration,
}

impl RunOrchestrator {
    pub fn new(step_delay: Duration) -> Self {
        Self { step_delay }
    }

    /// Emits the run into `sink`, checking `cancel` before every emission.
    pub async fn run<S>(
        &self,
        context: RunContext,
        sink: &mut S,
        cancel: &mut AbortSignal,
    ) -> Result<RunOutcome, OrchestratorError>
    where
        S: EventSink + ?Sized,
    {
        let RunContext {
            thread_id,
            run_id,
            history,
        } = context;
        let cancelled = |phase: RunPhase| {
            info!(%thread_id, %run_id, %phase, "run cancelled");
            Ok(RunOutcome::Cancelled { phase })
        };

        if cancel.is_aborted() {
            return cancelled(RunPhase::Idle);
        }
        sink.emit(Event::run_started(thread_id.clone(), run_id.clone()))
            .await?;
        info!(%thread_id, %run_id, messages = history.len(), "run started");
        if cancel.is_aborted() || !self.pause(cancel).await {
            return cancelled(RunPhase::RunStarted);
        }

        let reply = decide(&history);
        debug!(%run_id, tool_calls = reply.tool_calls.len(), "assistant reply decided");
        let mut messages = history;
        messages.push(reply);
        if cancel.is_aborted() {
            return cancelled(RunPhase::Deciding);
        }
        sink.emit(Event::messages_snapshot(messages)).await?;

        if !self.pause(cancel).await || cancel.is_aborted() {
            return cancelled(RunPhase::MessagesSnapshot);
        }
        sink.emit(Event::run_finished(thread_id.clone(), run_id.clone()))
            .await?;
        info!(%thread_id, %run_id, "run finished");
        Ok(RunOutcome::Finished)
    }

    /// Waits one step delay; `false` when cancelled meanwhile.
    async fn pause(&self, cancel: &mut AbortSignal) -> bool {
        if self.step_delay.is_zero() {
            return !cancel.is_aborted();
        }
        tokio::select! {
            _ = tokio::time::sleep(self.step_delay) => true,
            _ = cancel.aborted() => false,
        }
    }
}

/// Assistant reply for a history: acknowledge a tool result, otherwise
/// propose the haiku tool call.
fn decide(history: &[Message]) -> Message {
    let last_is_tool = history
        .last()
        .is_some_and(|message| message.role == Some(Role::Tool));
    if last_is_tool {
        Message::assistant_text(generate_message_id(), HAIKU_CREATED)
    } else {
        Message::assistant_tool_calls(
            generate_message_id(),
            vec![ToolCall::function(
                generate_tool_call_id(),
                HAIKU_TOOL,
                haiku_arguments(),
            )],
        )
    }
}
