mod coerce;
mod compare;

pub use coerce::{ValueCoercionError, coerce_attribute_value, coerce_attribute_values};
pub use compare::{compare_values, values_equal};

use crate::typedef::AttributeKind;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::fmt;

///
/// Value
///
/// Materialized attribute value as read off a vertex or record. Comparison
/// semantics live in `compare`; parsing from raw filter strings in `coerce`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Float(f32),
    Double(f64),
    Decimal(Decimal),

    /// Milliseconds since the Unix epoch.
    Date(i64),

    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Whether a value counts as empty for emptiness-style predicates.
    #[must_use]
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// The attribute kind this value would have been coerced from. Used by the
    /// graph reference evaluator to parse raw condition values in the record's
    /// own family.
    #[must_use]
    pub const fn kind_hint(&self) -> AttributeKind {
        match self {
            Self::Text(_) | Self::List(_) => AttributeKind::String,
            Self::Boolean(_) => AttributeKind::Boolean,
            Self::Byte(_) => AttributeKind::Byte,
            Self::Short(_) => AttributeKind::Short,
            Self::Int(_) => AttributeKind::Int,
            Self::Long(_) => AttributeKind::Long,
            Self::BigInt(_) => AttributeKind::BigInteger,
            Self::Float(_) => AttributeKind::Float,
            Self::Double(_) => AttributeKind::Double,
            Self::Decimal(_) => AttributeKind::BigDecimal,
            Self::Date(_) => AttributeKind::Date,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Byte(value) => write!(f, "{value}"),
            Self::Short(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}"),
            Self::BigInt(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Date(millis) => write!(f, "{millis}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}
