//! Event identifiers and parsed events.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EventId
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identifier of an event in the server's stream.
///
/// Servers send ids either as JSON strings or JSON numbers.  Both are kept
/// in textual form so that `42` and `"42"` compare equal, which is also the
/// form the `Last-Event-ID` header carries on reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract an id from a JSON value.  Only strings and numbers qualify;
    /// an empty string is not an id.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        EventId::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a string or number event id, got {value}"))
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Event
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One event delivered by the stream: the full JSON object plus its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    payload: Value,
}

impl Event {
    /// Wrap a JSON object that carries an `id` field.
    pub fn from_json(payload: Value) -> Result<Self> {
        let Some(object) = payload.as_object() else {
            return Err(Error::InvalidEvent(format!("expected a JSON object, got {payload}")));
        };
        let id = object
            .get("id")
            .and_then(EventId::from_json)
            .ok_or_else(|| Error::InvalidEvent(format!("missing `id` in {payload}")))?;
        Ok(Self { id, payload })
    }

    /// Parse a JSON text (an SSE `data:` payload).
    pub fn parse(text: &str) -> Result<Self> {
        let payload: Value = serde_json::from_str(text)?;
        Self::from_json(payload)
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Response body of `GET <endpoint>/events/latest`.
///
/// `id` is `None` when the server has not stored any event yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEvent {
    #[serde(default)]
    pub id: Option<EventId>,
}
