//! Dynamic argument and return values.
//!
//! Intercepted calls hand their arguments to the engine as [`Value`]s, and
//! programmed responses produce them. Equality is structural, which is what
//! exact argument matchers compare with.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Dynamic value for argument matching and programmed responses.
///
/// Wraps `serde_json::Value` so any serializable Rust value can cross the
/// interception boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub JsonValue);

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Self(JsonValue::Null)
    }

    /// Create a boolean value.
    pub fn bool(v: bool) -> Self {
        Self(JsonValue::Bool(v))
    }

    /// Create an integer value.
    pub fn int(v: i64) -> Self {
        Self(JsonValue::Number(v.into()))
    }

    /// Create a floating-point value.
    pub fn float(v: f64) -> Self {
        Self(serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }

    /// Create a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Self(JsonValue::String(v.into()))
    }

    /// Convert any serializable value.
    ///
    /// Values that cannot be represented (maps with non-string keys, for
    /// instance) become null.
    pub fn from_serialize<T: Serialize>(value: &T) -> Self {
        Self(serde_json::to_value(value).unwrap_or(JsonValue::Null))
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Check if the value is an integer.
    pub fn is_integer(&self) -> bool {
        self.0.is_i64() || self.0.is_u64()
    }

    /// Get the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Get the value as an i64, if it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }

    /// Get the value as an f64, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    /// Get the value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_bool()
    }

    /// Get the inner JSON value.
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Consume and return the inner JSON value.
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

/// Diagnostic rendering: strings print raw, everything else as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            JsonValue::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Self(v)
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        v.0
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::string(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or_else(Self::null, Into::into)
    }
}
