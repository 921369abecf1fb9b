//! Records and the response envelope.
//!
//! DESIGN
//! ======
//! Records are server-defined, so they stay an ordered JSON object rather
//! than a typed struct per resource. Only the identifier and creation
//! timestamp are assumed present.
//!
//! Endpoints answer either with a bare value or with a
//! `{success, data, error|message}` wrapper. Both shapes decode through
//! [`Envelope`] and come out as one `Result`, so nothing past this module
//! needs to know which shape a given endpoint uses.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::PortalError;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";

// =============================================================================
// RECORD ID
// =============================================================================

/// Stable record identifier. Numeric ids are kept in their decimal form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// One row of a resource collection as returned by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.0.get(ID_FIELD).and_then(RecordId::from_value)
    }

    #[must_use]
    pub fn created_at(&self) -> Option<&str> {
        self.0.get(CREATED_AT_FIELD).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Display text for a field. Missing and null fields are empty; nested
    /// values fall back to compact JSON.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        value_text(self.0.get(field))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

pub(crate) fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

const WRAPPER_FIELDS: [&str; 4] = ["success", "data", "error", "message"];

/// Either `{success, data, error, message}` or the bare payload.
///
/// An object counts as the wrapper when `success` is a boolean and either
/// the call failed, `data` is present, or it has no fields besides the
/// wrapper's own. A bare record that happens to carry its own `success`
/// flag therefore stays a record.
#[derive(Debug)]
pub enum Envelope<T> {
    Wrapped {
        success: bool,
        data: Option<T>,
        error: Option<String>,
        message: Option<String>,
    },
    Bare(T),
}

fn is_wrapper(map: &Map<String, Value>) -> bool {
    match map.get("success") {
        Some(Value::Bool(false)) => true,
        Some(Value::Bool(true)) => {
            map.contains_key("data") || map.keys().all(|k| WRAPPER_FIELDS.contains(&k.as_str()))
        }
        _ => false,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = match Value::deserialize(deserializer)? {
            Value::Object(map) if is_wrapper(&map) => map,
            other => return T::deserialize(other).map(Self::Bare).map_err(D::Error::custom),
        };

        let data = match map.remove("data") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(T::deserialize(raw).map_err(D::Error::custom)?),
        };
        Ok(Self::Wrapped {
            success: map.get("success").and_then(Value::as_bool).unwrap_or(false),
            data,
            error: text_field(&map, "error"),
            message: text_field(&map, "message"),
        })
    }
}

impl<T> Envelope<T> {
    /// Collapse both shapes into one result. `success: false` is reported as
    /// an HTTP error carrying `status` even when the status itself was 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Http`] when the wrapper says the call failed.
    pub fn into_result(self, status: u16) -> Result<Option<T>, PortalError> {
        match self {
            Self::Bare(value) => Ok(Some(value)),
            Self::Wrapped { success: true, data, .. } => Ok(data),
            Self::Wrapped { success: false, error, message, .. } => Err(PortalError::Http {
                status,
                message: error
                    .or(message)
                    .unwrap_or_else(|| "request failed".to_owned()),
            }),
        }
    }
}
