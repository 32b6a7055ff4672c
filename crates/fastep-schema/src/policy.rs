//! # Additional-Properties Policy
//!
//! Decides what a response schema says about object members that are not
//! declared under `properties`.
//!
//! ## The Inverted Flag
//!
//! [`AdditionalPropertiesPolicy::Remove`] carries a *remove* flag, not the
//! value written into the schema. `Remove(true)` writes
//! `"additionalProperties": false` (undeclared members are stripped from the
//! response); `Remove(false)` writes `"additionalProperties": true`. Callers
//! depend on this mapping, so it must not be flipped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::error::SchemaError;

/// A JSON Schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `array`
    Array,
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `null`
    Null,
    /// `number`
    Number,
    /// `object`
    Object,
    /// `string`
    String,
}

impl PrimitiveType {
    /// The keyword spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Null => "null",
            Self::Number => "number",
            Self::Object => "object",
            Self::String => "string",
        }
    }

    /// The most specific type of a JSON value. Integral numbers written
    /// without a fraction report `integer`; everything else numeric is
    /// `number`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether `value` is an instance of this type under JSON Schema rules
    /// (`1.0` is an integer, every integer is a number).
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (Self::Number, Value::Number(_)) => true,
            (other, value) => Self::of(value) == other,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(Self::Array),
            "boolean" => Ok(Self::Boolean),
            "integer" => Ok(Self::Integer),
            "null" => Ok(Self::Null),
            "number" => Ok(Self::Number),
            "object" => Ok(Self::Object),
            "string" => Ok(Self::String),
            other => Err(SchemaError::InvalidPolicy(format!(
                "unknown JSON Schema type '{other}'"
            ))),
        }
    }
}

/// What to write into `additionalProperties` at every object node of a
/// response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalPropertiesPolicy {
    /// Leave the schema untouched.
    Unset,
    /// Remove flag: `true` writes `additionalProperties: false` (strip
    /// undeclared members), `false` writes `additionalProperties: true`.
    Remove(bool),
    /// Undeclared members are kept only when they match this type.
    OnlyType(PrimitiveType),
}

impl Default for AdditionalPropertiesPolicy {
    /// Strip undeclared members.
    fn default() -> Self {
        Self::Remove(true)
    }
}

impl AdditionalPropertiesPolicy {
    /// The value to store under `additionalProperties`, or `None` when the
    /// schema must stay as it is.
    pub fn constraint(&self) -> Option<Value> {
        match self {
            Self::Unset => None,
            Self::Remove(remove) => Some(Value::Bool(!remove)),
            Self::OnlyType(kind) => Some(json!({ "type": kind.as_str() })),
        }
    }
}

impl fmt::Display for AdditionalPropertiesPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("unset"),
            Self::Remove(remove) => write!(f, "{remove}"),
            Self::OnlyType(kind) => write!(f, "{kind}"),
        }
    }
}

impl FromStr for AdditionalPropertiesPolicy {
    type Err = SchemaError;

    /// Accepts `unset`, `true`, `false`, or a primitive type name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unset" | "none" | "" => Ok(Self::Unset),
            "true" => Ok(Self::Remove(true)),
            "false" => Ok(Self::Remove(false)),
            other => other.parse().map(Self::OnlyType),
        }
    }
}

impl<'de> Deserialize<'de> for AdditionalPropertiesPolicy {
    /// Accepts `null`, a boolean remove flag, or a string understood by
    /// [`FromStr`].
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Name(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Self::Unset),
            Some(Raw::Flag(remove)) => Ok(Self::Remove(remove)),
            Some(Raw::Name(name)) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
