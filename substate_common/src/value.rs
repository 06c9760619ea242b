//! Tagged field values stored in records.
//!
//! Record fields hold one of three kinds. Reads convert through the checked
//! `TryFrom` impls so a field of the wrong kind is reported instead of being
//! silently coerced.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StateError;

/// A single record field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value (speeds, positions, gains).
    Number(f64),
    /// Boolean flag.
    Flag(bool),
    /// Free-form text (named positions, modes).
    Text(String),
}

impl FieldValue {
    /// Name of the value kind, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Flag(_) => "flag",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view, `None` for other kinds.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view, `None` for other kinds.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Flag view, `None` for other kinds.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl TryFrom<FieldValue> for f64 {
    type Error = StateError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Number(v) => Ok(v),
            other => Err(StateError::TypeMismatch {
                expected: "number",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<FieldValue> for bool {
    type Error = StateError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Flag(b) => Ok(b),
            other => Err(StateError::TypeMismatch {
                expected: "flag",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<FieldValue> for String {
    type Error = StateError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Text(s) => Ok(s),
            other => Err(StateError::TypeMismatch {
                expected: "text",
                found: other.kind(),
            }),
        }
    }
}
