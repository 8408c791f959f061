use crate::value::Value;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;

///
/// Value comparison semantics
///
/// Ordering is defined within a variant and across the numeric families via a
/// widening ladder: exact i128 while both sides are machine integers, then
/// BigInt, then Decimal, then f64 as the last resort. Comparisons that are not
/// defined (text vs number, lists, NaN) return `None`; predicate evaluation
/// treats `None` as a non-match.
///

///
/// NumericRepr
///

#[derive(Clone, Copy)]
enum NumericRepr<'a> {
    Exact(i128),
    Big(&'a BigInt),
    Dec(Decimal),
    Approx(f64),
}

fn numeric_repr(value: &Value) -> Option<NumericRepr<'_>> {
    match value {
        Value::Byte(v) => Some(NumericRepr::Exact(i128::from(*v))),
        Value::Short(v) => Some(NumericRepr::Exact(i128::from(*v))),
        Value::Int(v) => Some(NumericRepr::Exact(i128::from(*v))),
        Value::Long(v) => Some(NumericRepr::Exact(i128::from(*v))),
        Value::BigInt(v) => Some(NumericRepr::Big(v)),
        Value::Decimal(v) => Some(NumericRepr::Dec(*v)),
        Value::Float(v) => Some(NumericRepr::Approx(f64::from(*v))),
        Value::Double(v) => Some(NumericRepr::Approx(*v)),
        _ => None,
    }
}

fn approx(repr: NumericRepr<'_>) -> Option<f64> {
    match repr {
        NumericRepr::Exact(v) => Some(v as f64),
        NumericRepr::Big(v) => v.to_f64(),
        NumericRepr::Dec(v) => v.to_f64(),
        NumericRepr::Approx(v) => Some(v),
    }
}

fn compare_numeric(left: NumericRepr<'_>, right: NumericRepr<'_>) -> Option<Ordering> {
    match (left, right) {
        (NumericRepr::Exact(a), NumericRepr::Exact(b)) => Some(a.cmp(&b)),

        (NumericRepr::Big(a), NumericRepr::Big(b)) => Some(a.cmp(b)),
        (NumericRepr::Exact(a), NumericRepr::Big(b)) => Some(BigInt::from(a).cmp(b)),
        (NumericRepr::Big(a), NumericRepr::Exact(b)) => Some(a.cmp(&BigInt::from(b))),

        (NumericRepr::Dec(a), NumericRepr::Dec(b)) => Some(a.cmp(&b)),
        (NumericRepr::Exact(a), NumericRepr::Dec(b)) => {
            match Decimal::try_from_i128_with_scale(a, 0) {
                Ok(a) => Some(a.cmp(&b)),
                Err(_) => approx_cmp(left, right),
            }
        }
        (NumericRepr::Dec(a), NumericRepr::Exact(b)) => {
            match Decimal::try_from_i128_with_scale(b, 0) {
                Ok(b) => Some(a.cmp(&b)),
                Err(_) => approx_cmp(left, right),
            }
        }

        _ => approx_cmp(left, right),
    }
}

fn approx_cmp(left: NumericRepr<'_>, right: NumericRepr<'_>) -> Option<Ordering> {
    let left = approx(left)?;
    let right = approx(right)?;

    left.partial_cmp(&right)
}

/// Compare two values, widening across numeric variants.
///
/// Returns `None` when no ordering is defined for the pair.
#[must_use]
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        _ => {
            let left = numeric_repr(left)?;
            let right = numeric_repr(right)?;

            compare_numeric(left, right)
        }
    }
}

/// Equality under the same widening rules as [`compare_values`].
///
/// Lists compare structurally; `None` means the pair is incomparable.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    if let (Value::List(a), Value::List(b)) = (left, right) {
        return Some(a == b);
    }

    compare_values(left, right).map(|ordering| ordering == Ordering::Equal)
}

///
/// TESTS
///
