use crate::search::predicate::{Record, RecordPredicate};

///
/// Search pipeline
///
/// The execution layer chains result-shaping stages: each stage narrows a
/// materialized record list and hands the remainder to the next. Stages are
/// plain values composed in order by the caller; there is no linkage between
/// stages beyond the list they pass along.
///

/// Upper bound on one result page.
pub const MAX_RESULT_SIZE: usize = 150;

///
/// FilterStage
///

pub trait FilterStage<R> {
    fn apply(&self, records: Vec<R>) -> Vec<R>;
}

///
/// Pipeline
///

#[derive(Default)]
pub struct Pipeline<R> {
    stages: Vec<Box<dyn FilterStage<R>>>,
}

impl<R> Pipeline<R> {
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl FilterStage<R> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order. An exhausted list short-circuits: later
    /// stages never see an empty batch.
    #[must_use]
    pub fn run(&self, mut records: Vec<R>) -> Vec<R> {
        for stage in &self.stages {
            if records.is_empty() {
                break;
            }
            records = stage.apply(records);
        }

        records
    }
}

///
/// PredicateStage
///
/// Adapts a compiled in-memory predicate into a pipeline stage.
///

#[derive(Clone, Debug)]
pub struct PredicateStage {
    predicate: RecordPredicate,
}

impl PredicateStage {
    #[must_use]
    pub const fn new(predicate: RecordPredicate) -> Self {
        Self { predicate }
    }
}

impl<R: Record> FilterStage<R> for PredicateStage {
    fn apply(&self, records: Vec<R>) -> Vec<R> {
        records
            .into_iter()
            .filter(|record| self.predicate.matches(record))
            .collect()
    }
}

/// Collect one result page: skip `offset` records, then take up to `limit`
/// (capped at [`MAX_RESULT_SIZE`]).
#[must_use]
pub fn collect_page<R>(records: Vec<R>, offset: usize, limit: usize) -> Vec<R> {
    records
        .into_iter()
        .skip(offset)
        .take(limit.min(MAX_RESULT_SIZE))
        .collect()
}

///
/// TESTS
///
