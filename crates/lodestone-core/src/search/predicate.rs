use crate::{
    search::{
        context::SearchContext,
        criteria::{Condition, FilterCriteria, Operator},
        rewrite::rewrite_pipe_delimited_leaf,
    },
    typedef::AttributeKind,
    value::{
        Value, ValueCoercionError, coerce_attribute_value, coerce_attribute_values, compare_values,
        values_equal,
    },
};
use regex::Regex;
use std::{cmp::Ordering, collections::{BTreeMap, BTreeSet}};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

///
/// In-memory predicate compiler
///
/// Compiles a filter tree into a composable boolean predicate over
/// materialized records, for the attributes the index path cannot answer.
/// Evaluation is pure: no schema access, no planning. Any comparison that is
/// undefined for the materialized value simply evaluates to false.
///

///
/// Record
///
/// Row-like value exposing attribute values by storage key. `None` means the
/// property is unset on the underlying vertex.
///

pub trait Record {
    fn attribute(&self, key: &str) -> Option<Value>;
}

impl Record for BTreeMap<String, Value> {
    fn attribute(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

///
/// PredicateError
///
/// Structural and lookup problems degrade during compilation; value problems
/// are fatal because they indicate a malformed request.
///

#[derive(Debug, ThisError)]
pub enum PredicateError {
    #[error(transparent)]
    Coercion(#[from] ValueCoercionError),

    #[error("invalid match pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
}

///
/// AttributeTest
///
/// Leaf-level test applied to one attribute's materialized value. A `None`
/// comparison value is the coerced form of an empty filter string: the test is
/// retained but never matches, mirroring the null-aware operator contract.
///

#[derive(Clone, Debug)]
pub enum AttributeTest {
    Compare { op: CompareOp, value: Option<Value> },
    In { values: Option<Vec<Value>> },
    Like { pattern: Regex },
    StartsWith { value: String },
    EndsWith { value: String },
    Contains { value: Option<Value> },
    NotContains { value: Option<Value> },
    IsNull,
    NotNull,
    NotEmpty,
    NullOrEmpty,
}

///
/// AttributePredicate
///

#[derive(Clone, Debug)]
pub struct AttributePredicate {
    pub key: String,
    pub test: AttributeTest,
}

///
/// RecordPredicate
///

#[derive(Clone, Debug)]
pub enum RecordPredicate {
    All(Vec<RecordPredicate>),
    Any(Vec<RecordPredicate>),
    Attribute(AttributePredicate),
}

impl RecordPredicate {
    #[must_use]
    pub fn attribute(key: impl Into<String>, test: AttributeTest) -> Self {
        Self::Attribute(AttributePredicate {
            key: key.into(),
            test,
        })
    }

    /// Evaluate this predicate against a single record.
    #[must_use]
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Self::All(children) => children.iter().all(|child| child.matches(record)),
            Self::Any(children) => children.iter().any(|child| child.matches(record)),
            Self::Attribute(predicate) => eval_attribute(record, predicate),
        }
    }
}

fn eval_attribute<R: Record + ?Sized>(record: &R, predicate: &AttributePredicate) -> bool {
    let actual = record.attribute(&predicate.key);

    match &predicate.test {
        AttributeTest::IsNull => actual.is_none(),
        AttributeTest::NotNull => actual.is_some(),
        AttributeTest::NullOrEmpty => actual.is_none_or(|value| value.is_empty_value()),
        AttributeTest::NotEmpty => actual.is_some_and(|value| !value.is_empty_value()),

        test => actual.is_some_and(|actual| eval_value_test(&actual, test)),
    }
}

fn eval_value_test(actual: &Value, test: &AttributeTest) -> bool {
    match test {
        AttributeTest::Compare { op, value } => value
            .as_ref()
            .is_some_and(|value| eval_compare(actual, *op, value)),

        AttributeTest::In { values } => values.as_ref().is_some_and(|values| {
            values
                .iter()
                .any(|value| values_equal(actual, value).unwrap_or(false))
        }),

        AttributeTest::Like { pattern } => actual
            .as_text()
            .is_some_and(|text| pattern.is_match(text)),

        AttributeTest::StartsWith { value } => actual
            .as_text()
            .is_some_and(|text| text.starts_with(value.as_str())),

        AttributeTest::EndsWith { value } => actual
            .as_text()
            .is_some_and(|text| text.ends_with(value.as_str())),

        AttributeTest::Contains { value } => value
            .as_ref()
            .is_some_and(|value| eval_contains(actual, value)),

        AttributeTest::NotContains { value } => value
            .as_ref()
            .is_some_and(|value| !eval_contains(actual, value)),

        // Presence tests are handled before value extraction.
        _ => false,
    }
}

fn eval_compare(actual: &Value, op: CompareOp, value: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, value).unwrap_or(false),
        CompareOp::Neq => values_equal(actual, value).is_some_and(|equal| !equal),
        CompareOp::Lt => compare_values(actual, value).is_some_and(Ordering::is_lt),
        CompareOp::Lte => compare_values(actual, value).is_some_and(Ordering::is_le),
        CompareOp::Gt => compare_values(actual, value).is_some_and(Ordering::is_gt),
        CompareOp::Gte => compare_values(actual, value).is_some_and(Ordering::is_ge),
    }
}

// Substring containment for text, element membership for lists.
fn eval_contains(actual: &Value, value: &Value) -> bool {
    match actual {
        Value::Text(text) => value
            .as_text()
            .is_some_and(|needle| text.contains(needle)),
        Value::List(items) => items
            .iter()
            .any(|item| values_equal(item, value).unwrap_or(false)),
        _ => false,
    }
}

/// Compile a filter tree into an in-memory predicate over the given storage
/// keys. Returns `None` when no leaf contributes a test.
pub fn compile_predicate(
    context: &SearchContext,
    criteria: &FilterCriteria,
    attributes: &BTreeSet<String>,
) -> Result<Option<RecordPredicate>, PredicateError> {
    debug!("compiling in-memory filter predicate");

    to_record_predicate(context, criteria, attributes)
}

fn to_record_predicate(
    context: &SearchContext,
    criteria: &FilterCriteria,
    available: &BTreeSet<String>,
) -> Result<Option<RecordPredicate>, PredicateError> {
    let mut pending = available.clone();

    if criteria.is_branch() {
        let mut children = Vec::new();

        for child in &criteria.criterion {
            if let Some(predicate) = to_record_predicate(context, child, &pending)? {
                children.push(predicate);
            }
        }

        if children.is_empty() {
            return Ok(None);
        }

        let predicate = match criteria.condition {
            Some(Condition::Or) => RecordPredicate::Any(children),
            _ => RecordPredicate::All(children),
        };

        return Ok(Some(predicate));
    }

    let Some(leaf) = criteria.leaf_view() else {
        return Ok(None);
    };

    let mut per_type = Vec::new();

    for type_def in context.types() {
        let key = match type_def.storage_key(leaf.attribute) {
            Ok(key) => key.to_string(),
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        if !pending.remove(key.as_str()) {
            continue;
        }

        let Some(kind) = type_def.attribute_kind(leaf.attribute).cloned() else {
            continue;
        };

        let rewritten = rewrite_pipe_delimited_leaf(leaf.attribute, leaf.operator, leaf.value);
        let test = attribute_test(rewritten.operator, &kind, &rewritten.value)?;

        per_type.push(RecordPredicate::attribute(key, test));
    }

    // Different in-scope types are alternative interpretations of the same
    // attribute name, not independent constraints.
    let predicate = match per_type.len() {
        0 => None,
        1 => per_type.pop(),
        _ => Some(RecordPredicate::Any(per_type)),
    };

    Ok(predicate)
}

/// Build the leaf test for one operator, the in-memory side of the operator
/// registry. Value parsing is conditional on the operator: null-aware
/// operators skip it entirely.
fn attribute_test(
    operator: Operator,
    kind: &AttributeKind,
    raw: &str,
) -> Result<AttributeTest, PredicateError> {
    let test = match operator {
        Operator::Lt => compare_test(CompareOp::Lt, kind, raw)?,
        Operator::Lte => compare_test(CompareOp::Lte, kind, raw)?,
        Operator::Gt => compare_test(CompareOp::Gt, kind, raw)?,
        Operator::Gte => compare_test(CompareOp::Gte, kind, raw)?,
        Operator::Eq => compare_test(CompareOp::Eq, kind, raw)?,
        Operator::Neq => compare_test(CompareOp::Neq, kind, raw)?,

        Operator::In => AttributeTest::In {
            values: coerce_attribute_values(kind, raw)?,
        },

        Operator::Like => AttributeTest::Like {
            pattern: anchored_pattern(raw)?,
        },

        Operator::StartsWith => AttributeTest::StartsWith {
            value: raw.to_string(),
        },
        Operator::EndsWith => AttributeTest::EndsWith {
            value: raw.to_string(),
        },

        Operator::Contains => AttributeTest::Contains {
            value: coerce_attribute_value(kind, raw)?,
        },
        Operator::NotContains => AttributeTest::NotContains {
            value: coerce_attribute_value(kind, raw)?,
        },

        Operator::IsNull => AttributeTest::IsNull,
        Operator::NotNull => AttributeTest::NotNull,
    };

    Ok(test)
}

fn compare_test(
    op: CompareOp,
    kind: &AttributeKind,
    raw: &str,
) -> Result<AttributeTest, PredicateError> {
    Ok(AttributeTest::Compare {
        op,
        value: coerce_attribute_value(kind, raw)?,
    })
}

// Match the whole value, not a substring of it.
fn anchored_pattern(raw: &str) -> Result<Regex, PredicateError> {
    Regex::new(&format!("^(?:{raw})$")).map_err(|source| PredicateError::InvalidPattern {
        pattern: raw.to_string(),
        source,
    })
}

///
/// TESTS
///
