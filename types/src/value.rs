//! Loosely-typed property values.
//!
//! Host properties and engine system properties are string/number/boolean
//! scalars. `PropertyValue` is serde-untagged so persisted maps read and
//! write as plain JSON scalars.

use serde::{Deserialize, Serialize};

/// A single property value: text, number, or boolean.
///
/// Variant order matters for untagged deserialization: booleans must be
/// tried before numbers so JSON `true` never coerces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Numeric view used by add/subtract operations.
    ///
    /// Numbers pass through; booleans and text coerce to `0.0`, so applying
    /// a delta to a non-numeric property silently converts it to numeric.
    ///
    /// # Examples
    /// ```
    /// use emblem_types::PropertyValue;
    /// assert_eq!(PropertyValue::Number(3.5).as_number(), 3.5);
    /// assert_eq!(PropertyValue::Bool(true).as_number(), 0.0);
    /// assert_eq!(PropertyValue::from("9").as_number(), 0.0);
    /// ```
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Bool(_) | Self::Text(_) => 0.0,
        }
    }

    /// Truthiness: only `Bool(true)` is true.
    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
