//! Cell values exchanged with the relational engine.
//!
//! [`Value`] is the dynamically typed form every column takes on its way in
//! and out of a statement. [`FromValue`] coerces a fetched value back into the
//! field type of a record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    /// Structured sub-document, persisted as JSON text.
    Json(serde_json::Value),
}

/// A fetched value could not be coerced into the destination type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: String,
}

impl ConversionError {
    pub fn new(expected: &'static str, found: impl Into<String>) -> Self {
        Self {
            expected,
            found: found.into(),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in conversion diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Bool(_) => "bool",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }

    /// Serialize a structured field into a JSON value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }

    /// Decode a structured column into `T`.
    ///
    /// SQL NULL is decoded as JSON `null`, so `Option<T>` destinations come
    /// back as `None` rather than a zero-valued object.
    pub fn decode_json<T: DeserializeOwned>(self) -> Result<T, ConversionError> {
        let json = match self {
            Value::Null => serde_json::Value::Null,
            Value::Json(json) => json,
            Value::Text(text) => serde_json::from_str(&text)
                .map_err(|e| ConversionError::new("json document", e.to_string()))?,
            Value::Blob(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ConversionError::new("json document", e.to_string()))?,
            other => return Err(ConversionError::new("json document", other.kind())),
        };
        serde_json::from_value(json).map_err(|e| ConversionError::new("json document", e.to_string()))
    }

    /// Canonical text form of a timestamp.
    ///
    /// Fixed-width RFC 3339 in UTC with nanoseconds, so that the lexical order
    /// of stored text matches chronological order.
    pub fn timestamp_text(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

// =============================================================================
// Coercion out of a Value
// =============================================================================

/// Conversion from a fetched [`Value`] into a record field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ConversionError::new("text", other.kind())),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Integer(n) => Ok(n),
            Value::Bool(b) => Ok(b as i64),
            other => Err(ConversionError::new("integer", other.kind())),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let n = i64::from_value(value)?;
        i32::try_from(n).map_err(|_| ConversionError::new("32-bit integer", n.to_string()))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Integer(n) => Ok(n as f64),
            other => Err(ConversionError::new("real", other.kind())),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(n) => Err(ConversionError::new("bool", n.to_string())),
            other => Err(ConversionError::new("bool", other.kind())),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| ConversionError::new("RFC 3339 timestamp", s)),
            other => Err(ConversionError::new("timestamp", other.kind())),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(id) => Ok(id),
            Value::Text(s) => Uuid::parse_str(&s).map_err(|_| ConversionError::new("uuid", s)),
            Value::Blob(bytes) => Uuid::from_slice(&bytes)
                .map_err(|_| ConversionError::new("uuid", format!("{} bytes", bytes.len()))),
            other => Err(ConversionError::new("uuid", other.kind())),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value.decode_json()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// =============================================================================
// Conversion into a Value
// =============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Uuid(id)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
