//! Core runtime for Lodestone: the attribute-filter compiler for graph-backed
//! metadata catalogs, plus the type model and value semantics it rests on.
//!
//! One filter tree compiles into three equivalent query forms (index-engine
//! text, an in-memory predicate, and a native graph query) with a per-subtree
//! decision on whether the index path is safe to use. See the `search` module
//! for the compile flow.

pub mod search;
pub mod typedef;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary: the filter shapes, the compile
/// entry points, and the types they consume.
///

pub mod prelude {
    pub use crate::{
        search::{
            Condition, FilterCriteria, GraphQuery, IndexedKeySet, Operator, Record,
            RecordPredicate, SearchContext, can_apply_index_filter, collect_filter_attributes,
            compile_graph_query, compile_index_query, compile_predicate,
            rewrite_system_criteria,
        },
        typedef::{AttributeKind, TypeDef, TypeKind},
        value::Value,
    };
}
