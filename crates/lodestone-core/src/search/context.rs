use crate::typedef::TypeDef;
use std::collections::BTreeSet;

/// Namespace marker the index backend prepends to vertex-property field names.
pub const DEFAULT_INDEX_SEARCH_PREFIX: &str = "v.";

///
/// IndexedKeySet
///
/// Storage keys known to be covered by the search index. Supplied by the
/// execution context and treated as read-only input.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexedKeySet(BTreeSet<String>);

impl IndexedKeySet {
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IndexedKeySet {
    fn from_iter<I: IntoIterator<Item = S>>(keys: I) -> Self {
        Self(keys.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeSet<String>> for IndexedKeySet {
    fn from(keys: BTreeSet<String>) -> Self {
        Self(keys)
    }
}

///
/// SearchContext
///
/// Read-only inputs for one compilation: the struct types in scope (order is
/// significant: it fixes clause order in emitted queries), the indexed-key
/// set, and the index namespace prefix. Compilers keep all per-call state in
/// their own tracking sets, so one context can serve concurrent compilations.
///

#[derive(Clone, Debug)]
pub struct SearchContext {
    types: Vec<TypeDef>,
    indexed_keys: IndexedKeySet,
    index_prefix: String,
}

impl SearchContext {
    #[must_use]
    pub fn new(types: Vec<TypeDef>, indexed_keys: IndexedKeySet) -> Self {
        Self {
            types,
            indexed_keys,
            index_prefix: DEFAULT_INDEX_SEARCH_PREFIX.to_string(),
        }
    }

    /// Override the index namespace prefix supplied by the index backend.
    #[must_use]
    pub fn with_index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    #[must_use]
    pub const fn indexed_keys(&self) -> &IndexedKeySet {
        &self.indexed_keys
    }

    #[must_use]
    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }
}
