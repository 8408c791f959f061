use crate::{typedef::AttributeKind, value::Value};
use chrono::DateTime;
use std::str::FromStr;
use thiserror::Error as ThisError;

///
/// Value coercion
///
/// Parses raw filter-string values into the declared attribute kind before
/// predicate construction. The empty string coerces to `None` ("no value",
/// never zero) for every parsed kind so that null-aware operators behave;
/// malformed input is fatal for the request that carried it.
///

///
/// ValueCoercionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("cannot coerce '{value}' into {kind}")]
pub struct ValueCoercionError {
    pub kind: &'static str,
    pub value: String,
}

impl ValueCoercionError {
    fn new(kind: &AttributeKind, value: &str) -> Self {
        Self {
            kind: kind.label(),
            value: value.to_string(),
        }
    }
}

/// Coerce one raw attribute value into its declared kind.
///
/// String-like kinds pass through unparsed (including the empty string); list
/// kinds coerce by element, since containment-style operators compare one
/// element at a time.
pub fn coerce_attribute_value(
    kind: &AttributeKind,
    raw: &str,
) -> Result<Option<Value>, ValueCoercionError> {
    match kind {
        AttributeKind::String | AttributeKind::Enum | AttributeKind::Object => {
            Ok(Some(Value::Text(raw.to_string())))
        }

        AttributeKind::List(element) => coerce_attribute_value(element, raw),

        _ if raw.is_empty() => Ok(None),

        AttributeKind::Boolean => parse_boolean(raw)
            .map(|value| Some(Value::Boolean(value)))
            .ok_or_else(|| ValueCoercionError::new(kind, raw)),

        AttributeKind::Byte => parse_with(kind, raw, Value::Byte),
        AttributeKind::Short => parse_with(kind, raw, Value::Short),
        AttributeKind::Int => parse_with(kind, raw, Value::Int),
        AttributeKind::Long => parse_with(kind, raw, Value::Long),
        AttributeKind::BigInteger => parse_with(kind, raw, Value::BigInt),
        AttributeKind::Float => parse_with(kind, raw, Value::Float),
        AttributeKind::Double => parse_with(kind, raw, Value::Double),
        AttributeKind::BigDecimal => parse_with(kind, raw, Value::Decimal),

        AttributeKind::Date => parse_date(raw)
            .map(|millis| Some(Value::Date(millis)))
            .ok_or_else(|| ValueCoercionError::new(kind, raw)),
    }
}

/// Coerce a comma-separated raw value into a list of typed values, for
/// membership-style operators. Empty input yields `None`.
pub fn coerce_attribute_values(
    kind: &AttributeKind,
    raw: &str,
) -> Result<Option<Vec<Value>>, ValueCoercionError> {
    if raw.is_empty() {
        return Ok(None);
    }

    let mut values = Vec::new();
    for item in raw.split(',') {
        if let Some(value) = coerce_attribute_value(kind, item.trim())? {
            values.push(value);
        }
    }

    Ok((!values.is_empty()).then_some(values))
}

fn parse_with<T: FromStr>(
    kind: &AttributeKind,
    raw: &str,
    wrap: impl FnOnce(T) -> Value,
) -> Result<Option<Value>, ValueCoercionError> {
    raw.parse::<T>()
        .map(|value| Some(wrap(value)))
        .map_err(|_| ValueCoercionError::new(kind, raw))
}

fn parse_boolean(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// Epoch milliseconds first (the storage representation), RFC 3339 as the
// human-facing alternative.
fn parse_date(raw: &str) -> Option<i64> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Some(millis);
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.timestamp_millis())
}

///
/// TESTS
///
