//! Event -> display line projection.
//!
//! Each event maps to zero or more lines independently of previous events:
//! streamed text deltas are never merged.

use std::fmt;

use serde_json::Value;

use crate::errors::ProjectError;
use crate::event::{Event, PatchOp, Role};

/// Labels and colour used when rendering lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectionStyle {
    /// Prefix for assistant-originated lines.
    pub nameplate: String,
    /// Prefix for state delta lines.
    pub server_label: String,
    /// Prefix for tool call lines in a messages snapshot.
    pub tool_call_label: String,
    /// 256-colour ANSI index applied by [`DisplayLine::render`].
    pub color: Option<u8>,
}

impl Default for ProjectionStyle {
    fn default() -> Self {
        Self {
            nameplate: "Assistant: ".to_string(),
            server_label: "Server:".to_string(),
            tool_call_label: "Tool Call: ".to_string(),
            color: None,
        }
    }
}

impl ProjectionStyle {
    /// Same labels, with the assistant colour used by the console client.
    pub fn colored() -> Self {
        Self {
            color: Some(21),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    pub color: Option<u8>,
}

impl DisplayLine {
    /// Text with ANSI escapes when a colour is set.
    pub fn render(&self) -> String {
        match self.color {
            Some(code) => format!("\x1b[38;5;{code}m{}\x1b[0m", self.text),
            None => self.text.clone(),
        }
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

struct Lines<'a> {
    style: &'a ProjectionStyle,
    out: Vec<DisplayLine>,
}

impl<'a> Lines<'a> {
    fn new(style: &'a ProjectionStyle) -> Self {
        Self {
            style,
            out: Vec::new(),
        }
    }

    fn raw(&mut self, text: String) {
        self.out.push(DisplayLine {
            text,
            color: self.style.color,
        });
    }

    fn assistant(&mut self, text: impl fmt::Display) {
        self.raw(format!("{}{text}", self.style.nameplate));
    }

    fn delta(&mut self, op: &PatchOp) {
        self.raw(format!(
            "{} Operation: {}, Path: {}, Value: {}",
            self.style.server_label,
            op.op,
            op.path,
            compact_or_empty(&op.value)
        ));
    }
}

fn compact_or_empty(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Maps one decoded event to its display lines.
///
/// `RUN_ERROR` and the variants this consumer does not render are returned
/// as errors so callers can show a notice and keep going.
pub fn project(event: &Event, style: &ProjectionStyle) -> Result<Vec<DisplayLine>, ProjectError> {
    let mut lines = Lines::new(style);
    match event {
        Event::RunStarted(_) => lines.assistant("Run started"),
        Event::RunFinished(_) => lines.assistant("Run finished"),
        Event::RunError(e) => {
            return Err(ProjectError::RunFailed {
                message: e.message.clone(),
                code: e.code.clone(),
            });
        }
        Event::TextMessageStart(_) => lines.assistant("text message started"),
        Event::TextMessageContent(e) => lines.assistant(&e.delta),
        Event::TextMessageEnd(_) => lines.assistant("text message ended"),
        Event::ToolCallStart(_) => lines.assistant("tool call started"),
        Event::ToolCallArgs(e) => lines.assistant(format_args!("tool call args: {}", e.delta)),
        Event::ToolCallEnd(_) => lines.assistant("tool call ended"),
        Event::ToolCallResult(e) => lines.assistant(&e.content),
        Event::StateSnapshot(e) => {
            if !e.snapshot.is_null() {
                lines.assistant(&e.snapshot);
            }
        }
        Event::StateDelta(e) => {
            for op in &e.delta {
                lines.delta(op);
            }
        }
        Event::MessagesSnapshot(e) => {
            for message in &e.messages {
                if message.role != Some(Role::User)
                    && let Some(content) = message.content.as_deref().filter(|c| !c.is_empty())
                {
                    lines.assistant(content);
                }
                for call in &message.tool_calls {
                    let text = format!(
                        "{}{} - {}",
                        style.tool_call_label, call.function.name, call.function.arguments
                    );
                    lines.raw(text);
                }
            }
        }
        Event::Custom(e) => lines.assistant(&e.value),
        Event::StepStarted(_)
        | Event::StepFinished(_)
        | Event::ThinkingStart(_)
        | Event::ThinkingEnd(_)
        | Event::ThinkingTextMessageStart(_)
        | Event::ThinkingTextMessageContent(_)
        | Event::ThinkingTextMessageEnd(_)
        | Event::Raw(_) => return Err(ProjectError::Unsupported(event.event_type())),
    }
    Ok(lines.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::*;
    use serde_json::json;

    fn texts(event: &Event) -> Vec<String> {
        project(event, &ProjectionStyle::default())
            .expect("projected")
            .into_iter()
            .map(|line| line.text)
            .collect()
    }

    #[test]
    fn lifecycle_events_use_the_nameplate() {
        assert_eq!(texts(&Event::run_started("t", "r")), ["Assistant: Run started"]);
        assert_eq!(texts(&Event::run_finished("t", "r")), ["Assistant: Run finished"]);
        let start = Event::ToolCallStart(ToolCallStart {
            tool_call_id: "c".into(),
            tool_call_name: "f".into(),
            parent_message_id: None,
        });
        assert_eq!(texts(&start), ["Assistant: tool call started"]);
        let args = Event::ToolCallArgs(ToolCallArgs {
            tool_call_id: "c".into(),
            delta: "{\"a\":".into(),
        });
        assert_eq!(texts(&args), ["Assistant: tool call args: {\"a\":"]);
    }

    #[test]
    fn text_deltas_are_never_merged() {
        let style = ProjectionStyle::default();
        let first = project(&Event::text_message_content("m", "Hel"), &style).expect("first");
        let second = project(&Event::text_message_content("m", "lo"), &style).expect("second");
        assert_eq!(first[0].text, "Assistant: Hel");
        assert_eq!(second[0].text, "Assistant: lo");
    }

    #[test]
    fn messages_snapshot_skips_user_content_and_lists_tool_calls() {
        let event = Event::messages_snapshot(vec![
            Message::user("u", "hi"),
            Message::assistant_tool_calls(
                "a",
                vec![ToolCall::function("c", "generate_haiku", "{\"x\":1}")],
            ),
            Message::assistant_text("b", "Haiku created"),
            Message::assistant_text("e", ""),
        ]);
        assert_eq!(
            texts(&event),
            [
                "Tool Call: generate_haiku - {\"x\":1}",
                "Assistant: Haiku created",
            ]
        );
    }

    #[test]
    fn state_events_render_compact_json() {
        let snapshot = Event::StateSnapshot(StateSnapshot {
            snapshot: json!({"count": 1}),
        });
        assert_eq!(texts(&snapshot), ["Assistant: {\"count\":1}"]);
        let empty = Event::StateSnapshot(StateSnapshot {
            snapshot: Value::Null,
        });
        assert!(texts(&empty).is_empty());

        let delta = Event::StateDelta(StateDelta {
            delta: vec![
                PatchOp {
                    op: PatchOpKind::Replace,
                    path: "/count".into(),
                    value: json!(2),
                    from: None,
                },
                PatchOp {
                    op: PatchOpKind::Remove,
                    path: "/old".into(),
                    value: Value::Null,
                    from: None,
                },
            ],
        });
        assert_eq!(
            texts(&delta),
            [
                "Server: Operation: replace, Path: /count, Value: 2",
                "Server: Operation: remove, Path: /old, Value: ",
            ]
        );
        let custom = Event::Custom(Custom {
            name: "ping".into(),
            value: json!({"n": 1}),
        });
        assert_eq!(texts(&custom), ["Assistant: {\"n\":1}"]);
    }

    #[test]
    fn run_error_and_unrendered_variants_are_errors() {
        let style = ProjectionStyle::default();
        let err = project(
            &Event::RunError(RunError {
                message: "boom".into(),
                code: Some("E1".into()),
            }),
            &style,
        )
        .expect_err("run error");
        assert_eq!(
            err,
            ProjectError::RunFailed {
                message: "boom".into(),
                code: Some("E1".into())
            }
        );
        let step = Event::StepStarted(StepStarted {
            step_name: "plan".into(),
        });
        assert_eq!(
            project(&step, &style),
            Err(ProjectError::Unsupported(EventType::StepStarted))
        );
        let raw = Event::Raw(Raw {
            event: json!({}),
            source: None,
        });
        assert_eq!(
            project(&raw, &style),
            Err(ProjectError::Unsupported(EventType::Raw))
        );
    }

    #[test]
    fn colour_only_affects_rendering() {
        let lines = project(&Event::run_started("t", "r"), &ProjectionStyle::colored())
            .expect("projected");
        assert_eq!(lines[0].text, "Assistant: Run started");
        assert_eq!(lines[0].render(), "\x1b[38;5;21mAssistant: Run started\x1b[0m");
    }
}
