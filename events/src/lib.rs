//! Event model and JSON frame decoder for the real-time messaging stream.
//!
//! Decoding happens in two steps. The envelope (`type`, `subtype`) is read
//! first and picks an [`EventKind`]; the full payload is then decoded into
//! that variant's record. Both steps work on a single parsed
//! [`serde_json::Value`], so a frame is parsed once.
//!
//! This crate is pure: no I/O, no async, no hidden state.

mod model;

pub use model::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`decode_event`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is not a JSON object, or its `type`/`subtype` are not strings.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    /// The envelope named a known variant but the payload does not fit its shape.
    #[error("malformed {variant} event: {source}")]
    MalformedVariant {
        variant: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Whether the stream can no longer be trusted after this error.
    ///
    /// A frame without a readable discriminator is fatal; a bad payload for
    /// a known discriminator only spoils that one frame.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedEnvelope(_))
    }
}

/// The discriminating fields of an inbound frame.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub subtype: String,
}

impl Envelope {
    #[must_use]
    pub fn event_kind(&self) -> EventKind {
        EventKind::select(&self.kind, &self.subtype)
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode raw frame bytes into a typed event.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedEnvelope`] when the bytes are not a JSON
/// object with a string `type`, and [`DecodeError::MalformedVariant`] when
/// a known variant's fields have the wrong shape. Unrecognised types are
/// not errors; they decode to [`Event::Unknown`].
pub fn decode_event(bytes: &[u8]) -> Result<Event, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;
    decode_value(value)
}

/// Decode an already-parsed JSON value. Same contract as [`decode_event`].
///
/// # Errors
///
/// See [`decode_event`].
pub fn decode_value(value: Value) -> Result<Event, DecodeError> {
    let envelope = read_envelope(&value)?;
    let kind = envelope.event_kind();

    let event = match kind {
        EventKind::Hello => Event::Hello,
        EventKind::Pong => Event::Pong(variant(kind, &value)?),
        EventKind::UserTyping => Event::UserTyping(variant(kind, &value)?),
        EventKind::Message => Event::Message(variant(kind, &value)?),
        EventKind::MessageChanged => Event::MessageChanged(variant(kind, &value)?),
        EventKind::MessageDeleted => Event::MessageDeleted(variant(kind, &value)?),
        EventKind::DesktopNotification => Event::DesktopNotification(variant(kind, &value)?),
        EventKind::ReactionAdded => Event::ReactionAdded(variant(kind, &value)?),
        EventKind::ReactionRemoved => Event::ReactionRemoved(variant(kind, &value)?),
        EventKind::Unknown => Event::Unknown(Unknown {
            kind: envelope.kind,
            subtype: envelope.subtype,
            raw: value,
        }),
    };
    Ok(event)
}

/// Read only the discriminator of a frame.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedEnvelope`] when the value is not an
/// object or `type`/`subtype` are not strings.
pub fn read_envelope(value: &Value) -> Result<Envelope, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::MalformedEnvelope(format!(
            "expected a JSON object, got {}",
            json_type_name(value)
        )));
    }
    Envelope::deserialize(value).map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))
}

fn variant<'a, T: Deserialize<'a>>(kind: EventKind, value: &'a Value) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(|source| DecodeError::MalformedVariant { variant: kind, source })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// LIVENESS
// =============================================================================

/// Outbound liveness frame. Serializes as `{"id":..,"type":"ping","time":..}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Ping {
    pub id: u64,
    #[serde(rename = "type")]
    kind: &'static str,
    pub time: u64,
}

impl Ping {
    pub const TEMPLATE_ID: u64 = 1234;
    pub const TEMPLATE_TIME: u64 = 1_403_299_273_342;

    #[must_use]
    pub fn new(id: u64, time: u64) -> Self {
        Self { id, kind: "ping", time }
    }
}

impl Default for Ping {
    /// The fixed template sent on every heartbeat.
    fn default() -> Self {
        Self::new(Self::TEMPLATE_ID, Self::TEMPLATE_TIME)
    }
}

/// Render a ping as the text payload written to the socket.
#[must_use]
pub fn encode_ping(ping: &Ping) -> String {
    // Two integers and a static string; serialization cannot fail.
    serde_json::to_string(ping).unwrap_or_default()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
