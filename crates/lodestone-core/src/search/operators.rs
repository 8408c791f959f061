use crate::search::{
    criteria::Operator,
    graph::{ComparisonOperator, MatchingOperator},
};

///
/// Operator registry
///
/// Process-wide constant mapping from each comparison operator to its
/// backend-specific form: an index-query text fragment, and a graph-native
/// comparison or matching operator. The in-memory side of the registry lives
/// with the predicate compiler, which owns value coercion. Pure lookup, no
/// state.
///

///
/// GraphOperator
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GraphOperator {
    Comparison(ComparisonOperator),
    Matching(MatchingOperator),
}

/// Render one leaf as index-query text.
///
/// `key` is the resolved storage key and `value` must already be
/// index-escaped. Returns `None` for operators without an index form.
#[must_use]
pub fn render_index_fragment(
    operator: Operator,
    prefix: &str,
    key: &str,
    value: &str,
) -> Option<String> {
    let fragment = match operator {
        Operator::Lt => format!("{prefix}\"{key}\": [* TO {value}}}"),
        Operator::Gt => format!("{prefix}\"{key}\": {{{value} TO *]"),
        Operator::Lte => format!("{prefix}\"{key}\": [* TO {value}]"),
        Operator::Gte => format!("{prefix}\"{key}\": [{value} TO *]"),
        Operator::Eq => format!("{prefix}\"{key}\": {value}"),
        Operator::Neq => format!("(*:* -{prefix}\"{key}\": {value})"),

        // IN expects a list of quoted values, LIKE a regex pattern; both render
        // inside a group.
        Operator::In | Operator::Like => format!("{prefix}\"{key}\": ({value})"),

        Operator::StartsWith => format!("{prefix}\"{key}\": ({value}*)"),
        Operator::EndsWith => format!("{prefix}\"{key}\": (*{value})"),
        Operator::Contains => format!("{prefix}\"{key}\": (*{value}*)"),

        Operator::IsNull => format!("(*:* NOT {prefix}\"{key}\":[* TO *])"),
        Operator::NotNull => format!("{prefix}\"{key}\":[* TO *]"),

        Operator::NotContains => return None,
    };

    Some(fragment)
}

/// Graph-native form of an operator, absent where the graph backend defines
/// none (`In`, `NotContains`).
#[must_use]
pub const fn graph_operator(operator: Operator) -> Option<GraphOperator> {
    let native = match operator {
        Operator::Lt => GraphOperator::Comparison(ComparisonOperator::LessThan),
        Operator::Lte => GraphOperator::Comparison(ComparisonOperator::LessThanEqual),
        Operator::Gt => GraphOperator::Comparison(ComparisonOperator::GreaterThan),
        Operator::Gte => GraphOperator::Comparison(ComparisonOperator::GreaterThanEqual),
        Operator::Eq | Operator::IsNull => GraphOperator::Comparison(ComparisonOperator::Equal),
        Operator::Neq | Operator::NotNull => {
            GraphOperator::Comparison(ComparisonOperator::NotEqual)
        }

        Operator::Like | Operator::Contains | Operator::EndsWith => {
            GraphOperator::Matching(MatchingOperator::Regex)
        }
        Operator::StartsWith => GraphOperator::Matching(MatchingOperator::Prefix),

        Operator::In | Operator::NotContains => return None,
    };

    Some(native)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_templates_use_inclusive_and_exclusive_bounds() {
        let prefix = "v.";

        assert_eq!(
            render_index_fragment(Operator::Lt, prefix, "k", "5").unwrap(),
            "v.\"k\": [* TO 5}"
        );
        assert_eq!(
            render_index_fragment(Operator::Gt, prefix, "k", "5").unwrap(),
            "v.\"k\": {5 TO *]"
        );
        assert_eq!(
            render_index_fragment(Operator::Lte, prefix, "k", "5").unwrap(),
            "v.\"k\": [* TO 5]"
        );
        assert_eq!(
            render_index_fragment(Operator::Gte, prefix, "k", "5").unwrap(),
            "v.\"k\": [5 TO *]"
        );
    }

    #[test]
    fn negated_templates_subtract_from_the_full_range() {
        assert_eq!(
            render_index_fragment(Operator::Neq, "v.", "k", "x").unwrap(),
            "(*:* -v.\"k\": x)"
        );
        assert_eq!(
            render_index_fragment(Operator::IsNull, "v.", "k", "").unwrap(),
            "(*:* NOT v.\"k\":[* TO *])"
        );
        assert_eq!(
            render_index_fragment(Operator::NotNull, "v.", "k", "").unwrap(),
            "v.\"k\":[* TO *]"
        );
    }

    #[test]
    fn substring_templates_group_the_value() {
        assert_eq!(
            render_index_fragment(Operator::StartsWith, "v.", "k", "ab").unwrap(),
            "v.\"k\": (ab*)"
        );
        assert_eq!(
            render_index_fragment(Operator::EndsWith, "v.", "k", "ab").unwrap(),
            "v.\"k\": (*ab)"
        );
        assert_eq!(
            render_index_fragment(Operator::Contains, "v.", "k", "ab").unwrap(),
            "v.\"k\": (*ab*)"
        );
    }

    #[test]
    fn unmapped_operators_are_absent() {
        assert!(render_index_fragment(Operator::NotContains, "v.", "k", "x").is_none());
        assert!(graph_operator(Operator::In).is_none());
        assert!(graph_operator(Operator::NotContains).is_none());
    }

    #[test]
    fn null_checks_map_to_equality_against_the_sentinel() {
        assert_eq!(
            graph_operator(Operator::IsNull),
            Some(GraphOperator::Comparison(ComparisonOperator::Equal))
        );
        assert_eq!(
            graph_operator(Operator::NotNull),
            Some(GraphOperator::Comparison(ComparisonOperator::NotEqual))
        );
    }
}
