use crate::{
    search::{
        context::SearchContext,
        criteria::{Condition, FilterCriteria, LeafView, Operator},
        escape::escape_index_value,
        operators::render_index_fragment,
        rewrite::custom_attribute_quoted_pair,
    },
    typedef::CUSTOM_ATTRIBUTES_KEY,
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

///
/// Index query compiler
///
/// Renders a filter tree into index-engine query text, restricted to the
/// storage keys already classified as index-filterable. Every recursive call
/// works on its own copy of the still-available key set, so one leaf resolving
/// to the same key on several in-scope types emits a single clause, while
/// sibling leaves are unaffected by each other.
///

/// Compile a filter tree into index-engine query text.
///
/// `index_attributes` is the index-filterable key set from the collection
/// pre-pass. Returns the empty string when nothing in the tree is renderable.
#[must_use]
pub fn compile_index_query(
    context: &SearchContext,
    criteria: &FilterCriteria,
    index_attributes: &BTreeSet<String>,
) -> String {
    debug!("compiling index filter query");

    to_index_query(context, criteria, index_attributes, 0)
}

fn to_index_query(
    context: &SearchContext,
    criteria: &FilterCriteria,
    available: &BTreeSet<String>,
    level: u32,
) -> String {
    let mut pending = available.clone();

    if criteria.is_branch() {
        let Some(condition) = criteria.condition else {
            return String::new();
        };

        let mut nested = String::new();

        for child in &criteria.criterion {
            let fragment = to_index_query(context, child, &pending, level + 1);

            if !fragment.is_empty() {
                if !nested.is_empty() {
                    nested.push(' ');
                    nested.push_str(condition.keyword());
                    nested.push(' ');
                }
                nested.push_str(&fragment);
            }
        }

        if nested.is_empty() {
            return String::new();
        }

        // Top-level single-clause AND stays unwrapped to keep minimal queries
        // minimal; everything nested, and any multi-clause OR, is grouped.
        let needs_braces =
            level != 0 || (condition == Condition::Or && criteria.criterion.len() > 1);

        if needs_braces {
            return format!("({nested})");
        }

        return nested;
    }

    let Some(leaf) = criteria.leaf_view() else {
        return String::new();
    };

    let mut fragments: Vec<String> = Vec::new();

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

        if let Some(fragment) = to_index_expression(context, &leaf, &key) {
            fragments.push(fragment);
        }
    }

    match fragments.len() {
        0 => String::new(),
        1 => fragments.swap_remove(0),
        _ => format!("( {} )", fragments.join(" OR ")),
    }
}

fn to_index_expression(context: &SearchContext, leaf: &LeafView<'_>, key: &str) -> Option<String> {
    let value = if leaf.attribute == CUSTOM_ATTRIBUTES_KEY && leaf.operator == Operator::Contains {
        escape_index_value(&custom_attribute_quoted_pair(leaf.value))
    } else {
        escape_index_value(leaf.value)
    };

    let fragment = render_index_fragment(leaf.operator, context.index_prefix(), key, &value);

    if fragment.is_none() {
        warn!(
            operator = %leaf.operator,
            attribute = leaf.attribute,
            "operator has no index-query form; leaf contributes nothing"
        );
    }

    fragment
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        search::{classify::collect_filter_attributes, escape::has_stray_clauses},
        test_fixtures::{table_context, table_view_context},
        typedef::TRAIT_NAMES_KEY,
    };

    fn compile(context: &SearchContext, criteria: &FilterCriteria) -> String {
        let attributes = collect_filter_attributes(context, criteria);
        compile_index_query(context, criteria, &attributes.index_filtered)
    }

    #[test]
    fn single_leaf_renders_without_braces() {
        let context = table_context();
        let tree = FilterCriteria::leaf("status", Operator::Eq, "ACTIVE");

        assert_eq!(compile(&context, &tree), "v.\"status\": ACTIVE");
    }

    #[test]
    fn top_level_and_stays_unwrapped() {
        let context = table_context();
        let tree = FilterCriteria::and(vec![
            FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
            FilterCriteria::leaf("retention", Operator::Gte, "30"),
        ]);

        assert_eq!(
            compile(&context, &tree),
            "v.\"status\": ACTIVE AND v.\"Table.retention\": [30 TO *]"
        );
    }

    #[test]
    fn nested_branches_are_parenthesized() {
        let context = table_context();
        let tree = FilterCriteria::and(vec![
            FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
            FilterCriteria::or(vec![
                FilterCriteria::leaf("retention", Operator::Lt, "7"),
                FilterCriteria::leaf("active", Operator::Eq, "true"),
            ]),
        ]);

        assert_eq!(
            compile(&context, &tree),
            "v.\"status\": ACTIVE AND (v.\"Table.retention\": [* TO 7} OR v.\"Table.active\": true)"
        );
    }

    #[test]
    fn top_level_multi_clause_or_is_parenthesized() {
        let context = table_context();
        let tree = FilterCriteria::or(vec![
            FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
            FilterCriteria::leaf("retention", Operator::Eq, "30"),
        ]);

        assert_eq!(
            compile(&context, &tree),
            "(v.\"status\": ACTIVE OR v.\"Table.retention\": 30)"
        );
    }

    #[test]
    fn values_are_index_escaped() {
        let context = table_context();
        // `name` is index-filterable only for clean values, so hand it the
        // key set directly to exercise escaping.
        let tree = FilterCriteria::leaf("name", Operator::Eq, "a+b\"c");
        let keys = ["Table.name".to_string()].into_iter().collect();

        let query = compile_index_query(&context, &tree, &keys);

        assert_eq!(query, "v.\"Table.name\": a\\+b\\\"c");
        assert!(!has_stray_clauses(&query));
    }

    #[test]
    fn unrenderable_leaves_leave_no_stray_clauses() {
        let context = table_context();
        let tree = FilterCriteria::and(vec![
            FilterCriteria::leaf("status", Operator::Eq, "ACTIVE"),
            // unresolvable attribute
            FilterCriteria::leaf("missing", Operator::Eq, "x"),
            // resolvable but graph-only attribute
            FilterCriteria::leaf("description", Operator::Contains, "x"),
        ]);

        let query = compile(&context, &tree);

        assert_eq!(query, "v.\"status\": ACTIVE");
        assert!(!has_stray_clauses(&query));
    }

    #[test]
    fn empty_or_unrenderable_tree_compiles_to_nothing() {
        let context = table_context();

        assert_eq!(compile(&context, &FilterCriteria::default()), "");
        assert_eq!(
            compile(
                &context,
                &FilterCriteria::or(vec![FilterCriteria::leaf("missing", Operator::Eq, "x")])
            ),
            ""
        );
    }

    #[test]
    fn shared_storage_key_renders_once_across_types() {
        let context = table_view_context();
        let tree = FilterCriteria::leaf("status", Operator::Eq, "ACTIVE");

        // Both types resolve `status` to the same key; the clause must not
        // duplicate.
        assert_eq!(compile(&context, &tree), "v.\"status\": ACTIVE");
    }

    #[test]
    fn distinct_storage_keys_combine_with_or() {
        let context = table_view_context();
        let tree = FilterCriteria::leaf("name", Operator::Eq, "fact_sales");

        assert_eq!(
            compile(&context, &tree),
            "( v.\"Table.name\": fact_sales OR v.\"View.name\": fact_sales )"
        );
    }

    #[test]
    fn custom_attribute_contains_renders_the_quoted_pair() {
        let context = table_context();
        let tree = FilterCriteria::leaf(
            crate::typedef::CUSTOM_ATTRIBUTES_KEY,
            Operator::Contains,
            "k=v",
        );

        let query = compile(&context, &tree);

        assert_eq!(
            query,
            "v.\"__customAttributes\": (*\\\"k\\\"\\:\\\"v\\\"*)"
        );
    }

    #[test]
    fn pipe_delimited_contains_renders_escaped_delimiters() {
        let context = table_context();
        let tree = FilterCriteria::leaf(TRAIT_NAMES_KEY, Operator::Contains, "|PII|");

        assert_eq!(
            compile(&context, &tree),
            "v.\"__traitNames\": (*\\|PII\\|*)"
        );
    }
}
