use crate::{
    search::{
        context::SearchContext,
        criteria::{Condition, FilterCriteria, LeafView, Operator},
        escape::has_index_special_char,
    },
    typedef::{AttributeKind, TypeDef, is_pipe_delimited_attribute},
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

///
/// Attribute classification and index feasibility
///
/// Decides, per leaf, whether the indexed path can answer an attribute
/// comparison without losing precision, and, per tree, whether the index path
/// may be used at all. Lookup failures degrade (warn and fall to the graph
/// side); they never abort a compilation.
///

/// Whether a leaf is safe to answer from the index on one type.
///
/// Fails closed when the storage key is unknown. String attributes are
/// additionally fenced: `Neq` under-matches on tokenized fields, and raw
/// index-special characters break the query grammar unless the attribute uses
/// the pipe-delimited encoding that tolerates them.
#[must_use]
pub fn is_index_searchable(context: &SearchContext, leaf: &LeafView<'_>, type_def: &TypeDef) -> bool {
    let key = match type_def.storage_key(leaf.attribute) {
        Ok(key) => key,
        Err(err) => {
            warn!("{err}");
            return false;
        }
    };

    if !context.indexed_keys().contains(key) {
        return false;
    }

    let is_string = type_def
        .attribute_kind(leaf.attribute)
        .is_some_and(AttributeKind::is_string);

    if is_string {
        if leaf.operator == Operator::Neq {
            debug!(
                attribute = key,
                "NEQ on a tokenized string attribute; deferring to in-memory or graph evaluation"
            );
            return false;
        }

        if has_index_special_char(leaf.value) && !is_pipe_delimited_attribute(leaf.attribute) {
            debug!(
                attribute = key,
                value = leaf.value,
                "special characters in filter value; deferring to in-memory or graph evaluation"
            );
            return false;
        }
    }

    true
}

/// Whether the index path may be used for a filter tree.
///
/// Any leaf inside an OR (at any nesting depth) that is not index-searchable
/// on every in-scope type disqualifies the index path for the whole tree.
/// Leaves outside any OR never disqualify it: their non-indexed cost is paid
/// by pairing the index query with a graph or in-memory stage at the AND
/// level.
#[must_use]
pub fn can_apply_index_filter(context: &SearchContext, criteria: &FilterCriteria) -> bool {
    if !criteria.has_attribute_filter() {
        return true;
    }

    can_apply_inner(context, criteria, false)
}

fn can_apply_inner(context: &SearchContext, criteria: &FilterCriteria, inside_or: bool) -> bool {
    if criteria.is_branch() {
        let inside_or = inside_or || criteria.condition == Some(Condition::Or);

        return criteria
            .criterion
            .iter()
            .all(|child| can_apply_inner(context, child, inside_or));
    }

    let Some(leaf) = criteria.leaf_view() else {
        return true;
    };

    if inside_or {
        return context
            .types()
            .iter()
            .all(|type_def| is_index_searchable(context, &leaf, type_def));
    }

    true
}

///
/// FilterAttributes
///
/// Storage-key partition produced by the collection pre-pass: keys the index
/// can filter, keys only the graph/in-memory side can filter, and the union.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilterAttributes {
    pub index_filtered: BTreeSet<String>,
    pub graph_filtered: BTreeSet<String>,
    pub all: BTreeSet<String>,
}

/// Walk a (rewritten) filter tree once and partition every resolvable leaf's
/// storage keys by index-searchability. Unresolvable attributes warn and are
/// skipped.
#[must_use]
pub fn collect_filter_attributes(
    context: &SearchContext,
    criteria: &FilterCriteria,
) -> FilterAttributes {
    let mut attributes = FilterAttributes::default();
    collect_into(context, criteria, &mut attributes);
    attributes
}

fn collect_into(context: &SearchContext, criteria: &FilterCriteria, out: &mut FilterAttributes) {
    if criteria.is_branch() {
        for child in &criteria.criterion {
            collect_into(context, child, out);
        }
        return;
    }

    let Some(leaf) = criteria.leaf_view() else {
        return;
    };

    for type_def in context.types() {
        let key = match type_def.storage_key(leaf.attribute) {
            Ok(key) => key,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        if is_index_searchable(context, &leaf, type_def) {
            out.index_filtered.insert(key.to_string());
        } else {
            warn!(
                attribute = key,
                "not using index-search for attribute; might cause poor performance"
            );
            out.graph_filtered.insert(key.to_string());
        }

        out.all.insert(key.to_string());
    }
}

///
/// TESTS
///
