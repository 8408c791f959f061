//! Filter-to-multi-backend query compilation.
//!
//! A caller holds one filter tree and three ways to execute it: the index
//! engine, a native graph traversal, and in-memory evaluation over
//! materialized records. The modules here keep those forms semantically
//! equivalent:
//!
//! 1. [`rewrite::rewrite_system_criteria`] normalizes system-attribute leaves
//!    once, over a copy of the tree;
//! 2. [`classify::collect_filter_attributes`] partitions storage keys into
//!    index-filterable and graph-only sets, and
//!    [`classify::can_apply_index_filter`] decides whether the index path is
//!    usable at all;
//! 3. the three compilers ([`index_query`], [`predicate`], [`graph`]) each
//!    walk the same tree against whichever key set the chosen execution plan
//!    needs.
//!
//! All passes are pure tree transformations over read-only context; per-call
//! state lives in call-local tracking sets.

pub mod classification;
pub mod classify;
pub mod context;
pub mod criteria;
pub mod escape;
pub mod graph;
pub mod index_query;
pub mod operators;
pub mod pipeline;
pub mod predicate;
pub mod rewrite;

#[cfg(test)]
mod tests;

pub use classification::{ClassificationScope, ClassificationScopeStage, classification_predicate};
pub use classify::{
    FilterAttributes, can_apply_index_filter, collect_filter_attributes, is_index_searchable,
};
pub use context::{DEFAULT_INDEX_SEARCH_PREFIX, IndexedKeySet, SearchContext};
pub use criteria::{Condition, FilterCriteria, LeafView, Operator};
pub use graph::{
    ComparisonOperator, GraphCondition, GraphQuery, MatchingOperator, compile_graph_query,
};
pub use index_query::compile_index_query;
pub use operators::{GraphOperator, graph_operator, render_index_fragment};
pub use pipeline::{FilterStage, MAX_RESULT_SIZE, Pipeline, PredicateStage, collect_page};
pub use predicate::{
    AttributePredicate, AttributeTest, CompareOp, PredicateError, Record, RecordPredicate,
    compile_predicate,
};
pub use rewrite::rewrite_system_criteria;
