//! Shared fixtures for unit and property tests.

use crate::{
    search::context::{IndexedKeySet, SearchContext},
    typedef::{
        AttributeKind, CUSTOM_ATTRIBUTES_KEY, IS_INCOMPLETE_KEY, LABELS_KEY,
        PROPAGATED_TRAIT_NAMES_KEY, TRAIT_NAMES_KEY, TypeDef, TypeKind,
    },
    value::Value,
};
use std::collections::BTreeMap;

/// Entity type with a mix of indexed/unindexed and string/non-string
/// attributes. `status` stores under its bare name; the rest use the
/// conventional `Table.*` keys.
pub fn table_type() -> TypeDef {
    TypeDef::new("Table", TypeKind::Entity)
        .with_keyed_attribute("status", AttributeKind::String, "status")
        .with_attribute("name", AttributeKind::String)
        .with_attribute("description", AttributeKind::String)
        .with_attribute("retention", AttributeKind::Int)
        .with_attribute("created", AttributeKind::Date)
        .with_attribute("active", AttributeKind::Boolean)
        .with_attribute("owner", AttributeKind::String)
}

/// Second entity type sharing the `status` storage key with [`table_type`]
/// but owning its own `name` key.
pub fn view_type() -> TypeDef {
    TypeDef::new("View", TypeKind::Entity)
        .with_keyed_attribute("status", AttributeKind::String, "status")
        .with_attribute("name", AttributeKind::String)
}

/// Keys the fixture index covers: everything on `Table` except `description`
/// and `owner`, plus the system attributes exercised by tests.
pub fn indexed_keys() -> IndexedKeySet {
    [
        "status",
        "Table.name",
        "Table.retention",
        "Table.created",
        "Table.active",
        "View.name",
        TRAIT_NAMES_KEY,
        PROPAGATED_TRAIT_NAMES_KEY,
        LABELS_KEY,
        CUSTOM_ATTRIBUTES_KEY,
        IS_INCOMPLETE_KEY,
    ]
    .into_iter()
    .collect()
}

pub fn table_context() -> SearchContext {
    SearchContext::new(vec![table_type()], indexed_keys())
}

pub fn table_view_context() -> SearchContext {
    SearchContext::new(vec![table_type(), view_type()], indexed_keys())
}

/// Record builder for predicate/graph evaluation tests.
pub fn record(fields: &[(&str, Value)]) -> BTreeMap<String, Value> {
    fields
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}
