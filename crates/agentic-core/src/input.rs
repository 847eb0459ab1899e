//! Run request payload and the validated parse of its message history.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adapter::ToolSpec;
use crate::errors::{FieldIssue, FieldProblem, MessageParseError};
use crate::event::{FunctionCall, Message, Role, ToolCall, function_kind};

/// Body of a run request (client -> server).
///
/// `messages` stays untyped on the wire; [`parse_history`] turns it into
/// [`Message`]s or reports every invalid field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentInput {
    #[serde(default, alias = "thread_id", skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, alias = "run_id", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub messages: Vec<Value>,
    /// Empty requests full tool discovery.
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub context: Vec<Value>,
    #[serde(default, alias = "forwarded_props")]
    pub forwarded_props: Value,
}

impl RunAgentInput {
    /// Creates a payload with empty state and forwarded props.
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            run_id: Some(run_id.into()),
            state: Value::Object(Map::new()),
            messages: Vec::new(),
            tools: Vec::new(),
            context: Vec::new(),
            forwarded_props: Value::Object(Map::new()),
        }
    }

    /// Appends a history record in the `tool_calls` wire form.
    pub fn push_message(&mut self, message: &Message) {
        let mut record = Map::new();
        record.insert("id".into(), Value::String(message.id.clone()));
        if let Some(role) = message.role {
            record.insert("role".into(), Value::String(role.as_str().into()));
        }
        if let Some(content) = &message.content {
            record.insert("content".into(), Value::String(content.clone()));
        }
        if !message.tool_calls.is_empty() {
            let calls = message
                .tool_calls
                .iter()
                .map(|call| {
                    serde_json::json!({
                        "id": call.id,
                        "type": call.kind,
                        "function": {
                            "name": call.function.name,
                            "arguments": call.function.arguments,
                        },
                    })
                })
                .collect();
            record.insert("tool_calls".into(), Value::Array(calls));
        }
        if let Some(tool_call_id) = &message.tool_call_id {
            record.insert("tool_call_id".into(), Value::String(tool_call_id.clone()));
        }
        self.messages.push(Value::Object(record));
    }

    pub fn with_message(mut self, message: &Message) -> Self {
        self.push_message(message);
        self
    }
}

/// Parses submitted history records.
///
/// Absent (or null) fields fall back to their empty form; fields of the wrong
/// kind, unknown roles and tool calls without a function name are collected
/// and reported together.
pub fn parse_history(records: &[Value]) -> Result<Vec<Message>, MessageParseError> {
    let mut issues = Vec::new();
    let mut messages = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let mut fields = RecordFields {
            index,
            issues: &mut issues,
        };
        let Some(object) = record.as_object() else {
            fields.push("", FieldProblem::InvalidType { expected: "object" });
            continue;
        };
        messages.push(fields.message(object));
    }
    if issues.is_empty() {
        Ok(messages)
    } else {
        Err(MessageParseError { issues })
    }
}

struct RecordFields<'a> {
    index: usize,
    issues: &'a mut Vec<FieldIssue>,
}

impl RecordFields<'_> {
    fn push(&mut self, field: impl Into<String>, problem: FieldProblem) {
        self.issues.push(FieldIssue {
            index: self.index,
            field: field.into(),
            problem,
        });
    }

    fn optional_string(&mut self, object: &Map<String, Value>, field: &str) -> Option<String> {
        self.optional_string_at(object, field, field)
    }

    fn optional_string_at(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<String> {
        match object.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(path, FieldProblem::InvalidType { expected: "string" });
                None
            }
        }
    }

    fn message(&mut self, object: &Map<String, Value>) -> Message {
        let id = self.optional_string(object, "id").unwrap_or_default();
        let content = self.optional_string(object, "content");
        let role = match self.optional_string(object, "role").as_deref() {
            None | Some("") => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(reason) => {
                    self.push("role", FieldProblem::InvalidValue(reason));
                    None
                }
            },
        };
        let tool_call_id = match object.get("tool_call_id") {
            Some(_) => self.optional_string(object, "tool_call_id"),
            None => self.optional_string(object, "toolCallId"),
        };
        let (calls_key, calls) = match object.get("tool_calls") {
            Some(value) => ("tool_calls", Some(value)),
            None => ("toolCalls", object.get("toolCalls")),
        };
        let tool_calls = match calls {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| self.tool_call(&format!("{calls_key}[{i}]"), item))
                .collect(),
            Some(_) => {
                self.push(calls_key, FieldProblem::InvalidType { expected: "array" });
                Vec::new()
            }
        };
        Message {
            id,
            role,
            content,
            tool_calls,
            tool_call_id,
        }
    }

    fn tool_call(&mut self, path: &str, item: &Value) -> Option<ToolCall> {
        let Some(object) = item.as_object() else {
            self.push(path, FieldProblem::InvalidType { expected: "object" });
            return None;
        };
        let id = self
            .optional_string_at(object, "id", &format!("{path}.id"))
            .unwrap_or_default();
        let kind = self
            .optional_string_at(object, "type", &format!("{path}.type"))
            .unwrap_or_else(function_kind);
        let function_path = format!("{path}.function");
        let function = match object.get("function") {
            None | Some(Value::Null) => {
                self.push(function_path, FieldProblem::Missing);
                return None;
            }
            Some(Value::Object(function)) => function,
            Some(_) => {
                self.push(function_path, FieldProblem::InvalidType { expected: "object" });
                return None;
            }
        };
        let name_path = format!("{function_path}.name");
        let name = match self.optional_string_at(function, "name", &name_path) {
            Some(name) if !name.is_empty() => name,
            Some(_) | None => {
                if !matches!(function.get("name"), Some(v) if !v.is_string()) {
                    self.push(name_path, FieldProblem::Missing);
                }
                return None;
            }
        };
        let arguments = self
            .optional_string_at(function, "arguments", &format!("{function_path}.arguments"))
            .unwrap_or_default();
        Some(ToolCall {
            id,
            kind,
            function: FunctionCall { name, arguments },
        })
    }
}
