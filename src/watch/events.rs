//! Change events decoded from watch frames.
//!
//! A frame payload is a JSON object of the form
//! `{"type": "ADDED", "object": {"id": "...", ...}}`. The resource object is
//! kept opaque apart from its `id`, which must be a string.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::WatchError;
use super::framer::RawFrame;

/// Classification of a resource mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ChangeType {
    Added,
    Deleted,
    Modified,
    /// Any other tag, preserved verbatim.
    Unknown(String),
}

impl ChangeType {
    /// Parse a change tag, ignoring case.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("added") {
            Self::Added
        } else if tag.eq_ignore_ascii_case("deleted") {
            Self::Deleted
        } else if tag.eq_ignore_ascii_case("modified") {
            Self::Modified
        } else {
            Self::Unknown(tag.to_string())
        }
    }

    /// Returns true for tags this crate does not know how to handle.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<String> for ChangeType {
    fn from(tag: String) -> Self {
        match Self::parse(&tag) {
            Self::Unknown(_) => Self::Unknown(tag),
            known => known,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("ADDED"),
            Self::Deleted => f.write_str("DELETED"),
            Self::Modified => f.write_str("MODIFIED"),
            Self::Unknown(tag) => f.write_str(tag),
        }
    }
}

/// A resource object as delivered by the orchestrator.
///
/// Holds the complete object, field order and number text included, so it
/// can be passed on untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Resource {
    id: String,
    fields: Map<String, Value>,
}

impl Resource {
    /// The resource identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Consume the resource and return the raw JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl TryFrom<Map<String, Value>> for Resource {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = match fields.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => return Err(format!("resource id must be a string, got {other}")),
            None => return Err("resource has no id".to_string()),
        };
        Ok(Self { id, fields })
    }
}

impl TryFrom<Value> for Resource {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            other => Err(format!("resource must be an object, got {other}")),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// One decoded watch event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(rename = "object")]
    pub resource: Resource,
}

impl ChangeEvent {
    /// Decode a frame payload.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Decode` if the payload is not a JSON object with
    /// a string `type` and an `object` carrying a string `id`.
    pub fn decode(frame: &RawFrame) -> Result<Self, WatchError> {
        let event: Self = serde_json::from_slice(frame.as_bytes())?;
        Ok(event)
    }
}
