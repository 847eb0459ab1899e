//! Frame payload <-> [`Event`] conversion.
//!
//! Decoding is all-or-nothing: the payload must be a JSON object, its
//! discriminator must name a catalog entry, and the whole object must match
//! that entry's shape.

use serde_json::Value;

use crate::errors::DecodeError;
use crate::event::{Event, EventType};

/// One unit of the wire stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Optional type hint taken from the envelope (the SSE `event:` line).
    pub event: Option<String>,
    /// Raw payload bytes (joined SSE `data:` lines), not yet checked as UTF-8.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(event: Option<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            event,
            data: data.into(),
        }
    }

    /// The payload as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// Decodes one payload, using `hint` only when the payload has no `type`.
pub fn decode(raw: &[u8], hint: Option<&str>) -> Result<Event, DecodeError> {
    let mut value: Value = serde_json::from_slice(raw)
        .map_err(|e| DecodeError::MalformedPayload(format!("invalid JSON frame: {e}")))?;
    let Some(object) = value.as_object_mut() else {
        return Err(DecodeError::MalformedPayload(
            "frame payload is not a JSON object".into(),
        ));
    };

    let discriminator = match object.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => {
            return Err(DecodeError::UnknownEventType {
                discriminator: other.to_string(),
            });
        }
        None => hint.unwrap_or_default().to_string(),
    };
    let event_type: EventType = discriminator.parse()?;
    object.insert("type".into(), Value::String(event_type.as_str().into()));

    let event: Event =
        serde_json::from_value(value).map_err(|e| DecodeError::SchemaMismatch {
            event_type,
            reason: e.to_string(),
        })?;
    debug_assert_eq!(event.event_type(), event_type);
    Ok(event)
}

/// Decodes a frame, falling back to its envelope type hint.
pub fn decode_frame(frame: &Frame) -> Result<Event, DecodeError> {
    decode(&frame.data, frame.event.as_deref())
}

/// Encodes an event as its JSON payload.
pub fn encode(event: &Event) -> Vec<u8> {
    serde_json::to_vec(event).expect("event serialization is infallible")
}

/// Encodes an event as a frame whose hint is the wire type.
pub fn encode_frame(event: &Event) -> Frame {
    Frame::new(Some(event.event_type().as_str().to_string()), encode(event))
}
