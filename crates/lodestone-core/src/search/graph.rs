use crate::{
    search::{
        context::SearchContext,
        criteria::{Condition, FilterCriteria, Operator},
        escape::{contains_regex, suffix_regex},
        operators::{GraphOperator, graph_operator},
        predicate::Record,
        rewrite::rewrite_pipe_delimited_leaf,
    },
    value::{Value, coerce_attribute_value, compare_values, values_equal},
};
use regex::Regex;
use std::{cmp::Ordering, collections::BTreeSet};
use tracing::{debug, warn};

///
/// Graph query compiler
///
/// Renders a filter tree into the graph backend's native query form: an owned
/// value of accumulated property conditions. Accumulated conditions AND
/// together (the backend's default composition); OR branches become sets of
/// alternative child queries. A reference evaluator defines the acceptance
/// semantics the backend is expected to honor, and backs the cross-backend
/// parity tests.
///

///
/// ComparisonOperator
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComparisonOperator {
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
}

///
/// MatchingOperator
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchingOperator {
    Prefix,
    Regex,
}

///
/// GraphCondition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GraphCondition {
    /// Property comparison. `value: None` compares against the absence
    /// sentinel (property unset).
    Compare {
        key: String,
        op: ComparisonOperator,
        value: Option<String>,
    },

    /// Property text match against a pattern.
    Match {
        key: String,
        op: MatchingOperator,
        pattern: String,
    },

    /// Disjunction of alternative sub-queries.
    Or(Vec<GraphQuery>),
}

///
/// GraphQuery
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GraphQuery {
    conditions: Vec<GraphCondition>,
}

impl GraphQuery {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Fresh query against the same backend; mirrors the native builder's
    /// child-query constructor.
    #[must_use]
    pub const fn create_child_query(&self) -> Self {
        Self::new()
    }

    /// Add a property comparison; accumulated conditions AND together.
    #[must_use]
    pub fn has(mut self, key: impl Into<String>, op: ComparisonOperator, value: Option<String>) -> Self {
        self.conditions.push(GraphCondition::Compare {
            key: key.into(),
            op,
            value,
        });
        self
    }

    /// Add a property text match.
    #[must_use]
    pub fn has_match(
        mut self,
        key: impl Into<String>,
        op: MatchingOperator,
        pattern: impl Into<String>,
    ) -> Self {
        self.conditions.push(GraphCondition::Match {
            key: key.into(),
            op,
            pattern: pattern.into(),
        });
        self
    }

    /// Add a disjunction of alternative sub-queries.
    #[must_use]
    pub fn or(mut self, branches: Vec<Self>) -> Self {
        if !branches.is_empty() {
            self.conditions.push(GraphCondition::Or(branches));
        }
        self
    }

    /// Merge another query's conditions into this one.
    #[must_use]
    pub fn add_conditions_from(mut self, other: Self) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn conditions(&self) -> &[GraphCondition] {
        &self.conditions
    }

    /// Reference acceptance semantics: all accumulated conditions hold. An
    /// empty query accepts every record, like an unconstrained native scan.
    #[must_use]
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition_matches(condition, record))
    }
}

fn condition_matches<R: Record + ?Sized>(condition: &GraphCondition, record: &R) -> bool {
    match condition {
        GraphCondition::Compare { key, op, value } => {
            let actual = record.attribute(key);

            match (op, value) {
                (ComparisonOperator::Equal, None) => actual.is_none(),
                (ComparisonOperator::NotEqual, None) => actual.is_some(),
                // Range comparisons against the absence sentinel are undefined.
                (_, None) => false,
                (op, Some(raw)) => {
                    actual.is_some_and(|actual| compare_with_raw(&actual, *op, raw))
                }
            }
        }

        GraphCondition::Match { key, op, pattern } => record
            .attribute(key)
            .as_ref()
            .and_then(Value::as_text)
            .is_some_and(|text| match op {
                MatchingOperator::Prefix => text.starts_with(pattern.as_str()),
                MatchingOperator::Regex => regex_full_match(pattern, text),
            }),

        GraphCondition::Or(branches) => branches.iter().any(|branch| branch.matches(record)),
    }
}

// The native query carries raw string values; the backend interprets them in
// the stored property's own type. The reference evaluator mirrors that by
// parsing the raw value in the record value's family.
fn compare_with_raw(actual: &Value, op: ComparisonOperator, raw: &str) -> bool {
    let Ok(Some(value)) = coerce_attribute_value(&actual.kind_hint(), raw) else {
        return false;
    };

    match op {
        ComparisonOperator::Equal => values_equal(actual, &value).unwrap_or(false),
        ComparisonOperator::NotEqual => {
            values_equal(actual, &value).is_some_and(|equal| !equal)
        }
        ComparisonOperator::LessThan => {
            compare_values(actual, &value).is_some_and(Ordering::is_lt)
        }
        ComparisonOperator::LessThanEqual => {
            compare_values(actual, &value).is_some_and(Ordering::is_le)
        }
        ComparisonOperator::GreaterThan => {
            compare_values(actual, &value).is_some_and(Ordering::is_gt)
        }
        ComparisonOperator::GreaterThanEqual => {
            compare_values(actual, &value).is_some_and(Ordering::is_ge)
        }
    }
}

// Native regex matching is whole-value, not substring.
fn regex_full_match(pattern: &str, text: &str) -> bool {
    Regex::new(&format!("^(?:{pattern})$")).is_ok_and(|regex| regex.is_match(text))
}

/// Compile a filter tree into the native graph query form over the given
/// storage keys. Operators without a native mapping warn and contribute
/// nothing.
#[must_use]
pub fn compile_graph_query(
    context: &SearchContext,
    criteria: &FilterCriteria,
    graph_attributes: &BTreeSet<String>,
) -> GraphQuery {
    debug!("compiling graph filter query");

    to_graph_query(context, criteria, graph_attributes, GraphQuery::new())
}

fn to_graph_query(
    context: &SearchContext,
    criteria: &FilterCriteria,
    available: &BTreeSet<String>,
    query: GraphQuery,
) -> GraphQuery {
    let mut pending = available.clone();

    if criteria.is_branch() {
        return match criteria.condition {
            Some(Condition::And) | None => {
                let mut query = query;
                for child in &criteria.criterion {
                    let nested = to_graph_query(context, child, &pending, GraphQuery::new());
                    query = query.add_conditions_from(nested);
                }
                query
            }
            Some(Condition::Or) => {
                let mut branches = Vec::new();
                for child in &criteria.criterion {
                    let nested = to_graph_query(context, child, &pending, GraphQuery::new());
                    branches.push(query.create_child_query().add_conditions_from(nested));
                }
                query.or(branches)
            }
        };
    }

    let Some(leaf) = criteria.leaf_view() else {
        return query;
    };

    let mut queries: Vec<GraphQuery> = Vec::new();

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

        let rewritten = rewrite_pipe_delimited_leaf(leaf.attribute, leaf.operator, leaf.value);

        if let Some(inner) = leaf_query(&key, rewritten.operator, &rewritten.value) {
            queries.push(GraphQuery::new().add_conditions_from(inner));
        } else {
            warn!(
                operator = %rewritten.operator,
                attribute = leaf.attribute,
                "operator has no graph-native form; leaf contributes nothing"
            );
        }
    }

    match queries.len() {
        0 => query,
        1 => queries.swap_remove(0),
        _ => query.create_child_query().or(queries),
    }
}

// Native form of one leaf comparison.
fn leaf_query(key: &str, operator: Operator, value: &str) -> Option<GraphQuery> {
    let query = GraphQuery::new();

    let query = match graph_operator(operator)? {
        GraphOperator::Comparison(cmp) => match operator {
            Operator::IsNull | Operator::NotNull => query.has(key, cmp, None),
            _ => query.has(key, cmp, Some(value.to_string())),
        },

        GraphOperator::Matching(MatchingOperator::Prefix) => {
            query.has_match(key, MatchingOperator::Prefix, value)
        }

        GraphOperator::Matching(MatchingOperator::Regex) => {
            let pattern = match operator {
                Operator::Like => value.to_string(),
                Operator::Contains => contains_regex(value),
                Operator::EndsWith => suffix_regex(value),
                _ => return None,
            };
            query.has_match(key, MatchingOperator::Regex, pattern)
        }
    };

    Some(query)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        search::classify::collect_filter_attributes,
        test_fixtures::{record, table_context, table_view_context},
        typedef::{CUSTOM_ATTRIBUTES_KEY, TRAIT_NAMES_KEY},
    };

    fn compile(context: &SearchContext, criteria: &FilterCriteria) -> GraphQuery {
        let attributes = collect_filter_attributes(context, criteria);
        compile_graph_query(context, criteria, &attributes.all)
    }

    #[test]
    fn leaf_comparisons_map_to_native_operators() {
        let context = table_context();
        let query = compile(
            &context,
            &FilterCriteria::leaf("retention", Operator::Lte, "30"),
        );

        assert_eq!(
            query.conditions(),
            &[GraphCondition::Compare {
                key: "Table.retention".to_string(),
                op: ComparisonOperator::LessThanEqual,
                value: Some("30".to_string()),
            }]
        );
    }

    #[test]
    fn and_accumulates_conditions_into_one_query() {
        let context = table_context();
        let query = compile(
            &context,
            &FilterCriteria::and(vec![
                FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
                FilterCriteria::leaf("retention", Operator::Gt, "7"),
            ]),
        );

        assert_eq!(query.conditions().len(), 2);
        assert!(query.matches(&record(&[
            ("status", Value::from("ACTIVE")),
            ("Table.retention", Value::Int(30)),
        ])));
        assert!(!query.matches(&record(&[("status", Value::from("ACTIVE"))])));
    }

    #[test]
    fn or_compiles_children_as_alternative_sub_queries() {
        let context = table_context();
        let query = compile(
            &context,
            &FilterCriteria::or(vec![
                FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
                FilterCriteria::leaf("retention", Operator::Gt, "30"),
            ]),
        );

        assert_eq!(query.conditions().len(), 1);
        assert!(matches!(query.conditions()[0], GraphCondition::Or(_)));

        assert!(query.matches(&record(&[("status", Value::from("ACTIVE"))])));
        assert!(query.matches(&record(&[("Table.retention", Value::Int(60))])));
        assert!(!query.matches(&record(&[("Table.retention", Value::Int(7))])));
    }

    #[test]
    fn matching_operators_build_their_patterns() {
        let context = table_context();

        let starts = compile(
            &context,
            &FilterCriteria::leaf("name", Operator::StartsWith, "fact_"),
        );
        assert_eq!(
            starts.conditions(),
            &[GraphCondition::Match {
                key: "Table.name".to_string(),
                op: MatchingOperator::Prefix,
                pattern: "fact_".to_string(),
            }]
        );

        let contains = compile(
            &context,
            &FilterCriteria::leaf("name", Operator::Contains, "sales+"),
        );
        assert_eq!(
            contains.conditions(),
            &[GraphCondition::Match {
                key: "Table.name".to_string(),
                op: MatchingOperator::Regex,
                pattern: r".*sales\+.*".to_string(),
            }]
        );

        let ends = compile(
            &context,
            &FilterCriteria::leaf("name", Operator::EndsWith, "_v2"),
        );
        assert_eq!(
            ends.conditions(),
            &[GraphCondition::Match {
                key: "Table.name".to_string(),
                op: MatchingOperator::Regex,
                pattern: ".*_v2".to_string(),
            }]
        );
    }

    #[test]
    fn null_checks_compare_against_the_absence_sentinel() {
        let context = table_context();

        let is_null = compile(&context, &FilterCriteria::unary("owner", Operator::IsNull));
        assert_eq!(
            is_null.conditions(),
            &[GraphCondition::Compare {
                key: "Table.owner".to_string(),
                op: ComparisonOperator::Equal,
                value: None,
            }]
        );
        assert!(is_null.matches(&record(&[])));
        assert!(!is_null.matches(&record(&[("Table.owner", Value::from("etl"))])));

        let not_null = compile(&context, &FilterCriteria::unary("owner", Operator::NotNull));
        assert!(not_null.matches(&record(&[("Table.owner", Value::from("etl"))])));
        assert!(!not_null.matches(&record(&[])));
    }

    #[test]
    fn unmapped_operators_are_skipped() {
        let context = table_context();

        let in_query = compile(
            &context,
            &FilterCriteria::leaf("retention", Operator::In, "7, 30"),
        );
        assert!(in_query.is_empty());

        // a skipped leaf inside AND leaves the siblings intact
        let mixed = compile(
            &context,
            &FilterCriteria::and(vec![
                FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
                FilterCriteria::leaf("retention", Operator::In, "7, 30"),
            ]),
        );
        assert_eq!(mixed.conditions().len(), 1);
    }

    #[test]
    fn shared_storage_key_contributes_once_across_types() {
        let context = table_view_context();
        let query = compile(&context, &FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"));

        assert_eq!(query.conditions().len(), 1);
    }

    #[test]
    fn distinct_storage_keys_combine_as_alternatives() {
        let context = table_view_context();
        let query = compile(
            &context,
            &FilterCriteria::leaf("name", Operator::Eq, "fact_sales"),
        );

        assert!(matches!(query.conditions(), [GraphCondition::Or(branches)] if branches.len() == 2));
        assert!(query.matches(&record(&[("Table.name", Value::from("fact_sales"))])));
        assert!(query.matches(&record(&[("View.name", Value::from("fact_sales"))])));
        assert!(!query.matches(&record(&[("View.name", Value::from("other"))])));
    }

    #[test]
    fn pipe_delimited_rewrite_applies_before_mapping() {
        let context = table_context();
        let query = compile(
            &context,
            &FilterCriteria::leaf(TRAIT_NAMES_KEY, Operator::StartsWith, "PII"),
        );

        // StartsWith becomes Contains on the delimiter-prefixed member, which
        // maps to a substring regex, not a native prefix match.
        assert_eq!(
            query.conditions(),
            &[GraphCondition::Match {
                key: TRAIT_NAMES_KEY.to_string(),
                op: MatchingOperator::Regex,
                pattern: r".*\|PII.*".to_string(),
            }]
        );
        assert!(query.matches(&record(&[(TRAIT_NAMES_KEY, Value::from("|PII|Sensitive|"))])));
        assert!(!query.matches(&record(&[(TRAIT_NAMES_KEY, Value::from("|Other|"))])));
    }

    #[test]
    fn custom_attribute_contains_matches_the_quoted_pair() {
        let context = table_context();
        let query = compile(
            &context,
            &FilterCriteria::leaf(CUSTOM_ATTRIBUTES_KEY, Operator::Contains, "k=v"),
        );

        assert_eq!(
            query.conditions(),
            &[GraphCondition::Match {
                key: CUSTOM_ATTRIBUTES_KEY.to_string(),
                op: MatchingOperator::Regex,
                pattern: ".*\"k\":\"v\".*".to_string(),
            }]
        );
        assert!(query.matches(&record(&[(
            CUSTOM_ATTRIBUTES_KEY,
            Value::from("{\"k\":\"v\",\"x\":\"1\"}")
        )])));
    }

    #[test]
    fn date_comparisons_parse_raw_values_in_the_record_family() {
        let context = table_context();
        let query = compile(
            &context,
            &FilterCriteria::leaf("created", Operator::Gte, "1000"),
        );

        assert!(query.matches(&record(&[("Table.created", Value::Date(1_500))])));
        assert!(!query.matches(&record(&[("Table.created", Value::Date(500))])));
    }
}
