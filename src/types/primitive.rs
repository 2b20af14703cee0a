//! FHIR primitive datatypes.
//!
//! A primitive node carries a [`PrimitiveType`] (its FHIR type name) and a
//! [`PrimitiveValue`] (the in-memory representation). Several primitive types
//! share one representation; decimals keep their lexical form so that
//! precision survives a round trip.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveType {
    Boolean,
    Integer,
    Integer64,
    UnsignedInt,
    PositiveInt,
    Decimal,
    String,
    Markdown,
    Code,
    Id,
    Uri,
    Url,
    Canonical,
    Oid,
    Uuid,
    Base64Binary,
    Date,
    DateTime,
    Instant,
    Time,
    Xhtml,
}

/// FHIR primitive types, by name
pub static PRIMITIVE_TYPES: &[PrimitiveType] = &[
    PrimitiveType::Boolean,
    PrimitiveType::Integer,
    PrimitiveType::Integer64,
    PrimitiveType::UnsignedInt,
    PrimitiveType::PositiveInt,
    PrimitiveType::Decimal,
    PrimitiveType::String,
    PrimitiveType::Markdown,
    PrimitiveType::Code,
    PrimitiveType::Id,
    PrimitiveType::Uri,
    PrimitiveType::Url,
    PrimitiveType::Canonical,
    PrimitiveType::Oid,
    PrimitiveType::Uuid,
    PrimitiveType::Base64Binary,
    PrimitiveType::Date,
    PrimitiveType::DateTime,
    PrimitiveType::Instant,
    PrimitiveType::Time,
    PrimitiveType::Xhtml,
];

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Integer64 => "integer64",
            PrimitiveType::UnsignedInt => "unsignedInt",
            PrimitiveType::PositiveInt => "positiveInt",
            PrimitiveType::Decimal => "decimal",
            PrimitiveType::String => "string",
            PrimitiveType::Markdown => "markdown",
            PrimitiveType::Code => "code",
            PrimitiveType::Id => "id",
            PrimitiveType::Uri => "uri",
            PrimitiveType::Url => "url",
            PrimitiveType::Canonical => "canonical",
            PrimitiveType::Oid => "oid",
            PrimitiveType::Uuid => "uuid",
            PrimitiveType::Base64Binary => "base64Binary",
            PrimitiveType::Date => "date",
            PrimitiveType::DateTime => "dateTime",
            PrimitiveType::Instant => "instant",
            PrimitiveType::Time => "time",
            PrimitiveType::Xhtml => "xhtml",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        PRIMITIVE_TYPES.iter().copied().find(|t| t.as_str() == name)
    }

    pub fn is_primitive_name(name: &str) -> bool {
        Self::parse(name).is_some()
    }

    /// Whether `value` uses the representation this type is stored in
    pub fn accepts(&self, value: &PrimitiveValue) -> bool {
        matches!(
            (self, value),
            (PrimitiveType::Boolean, PrimitiveValue::Boolean(_))
                | (
                    PrimitiveType::Integer
                        | PrimitiveType::Integer64
                        | PrimitiveType::UnsignedInt
                        | PrimitiveType::PositiveInt,
                    PrimitiveValue::Integer(_)
                )
                | (PrimitiveType::Decimal, PrimitiveValue::Decimal(_))
                | (
                    PrimitiveType::String
                        | PrimitiveType::Markdown
                        | PrimitiveType::Code
                        | PrimitiveType::Id
                        | PrimitiveType::Uri
                        | PrimitiveType::Url
                        | PrimitiveType::Canonical
                        | PrimitiveType::Oid
                        | PrimitiveType::Uuid
                        | PrimitiveType::Base64Binary
                        | PrimitiveType::Date
                        | PrimitiveType::DateTime
                        | PrimitiveType::Instant
                        | PrimitiveType::Time
                        | PrimitiveType::Xhtml,
                    PrimitiveValue::String(_)
                )
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown primitive type: {s}"))
    }
}

/// In-memory value of a primitive element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    /// Lexical decimal, e.g. `"1.50"`
    Decimal(String),
    String(String),
}

impl PrimitiveValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) | PrimitiveValue::Decimal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Name of the representation, used in mismatch messages
    pub fn representation(&self) -> &'static str {
        match self {
            PrimitiveValue::Boolean(_) => "boolean",
            PrimitiveValue::Integer(_) => "integer",
            PrimitiveValue::Decimal(_) => "decimal",
            PrimitiveValue::String(_) => "string",
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(b) => write!(f, "{b}"),
            PrimitiveValue::Integer(i) => write!(f, "{i}"),
            PrimitiveValue::Decimal(s) | PrimitiveValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        PrimitiveValue::Boolean(value)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(value: i64) -> Self {
        PrimitiveValue::Integer(value)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(value: i32) -> Self {
        PrimitiveValue::Integer(value as i64)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::String(value.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::String(value)
    }
}
