use crate::{
    search::{
        escape::wildcard_regex,
        pipeline::FilterStage,
        predicate::{AttributeTest, PredicateError, Record, RecordPredicate},
        rewrite::delimited_name,
    },
    typedef::{NAME_DELIMITER, PROPAGATED_TRAIT_NAMES_KEY, TRAIT_NAMES_KEY},
    value::Value,
};
use regex::Regex;
use std::collections::BTreeSet;

///
/// Classification scope filtering
///
/// Filters over the classification system attributes: which classifications an
/// entity carries, directly or through propagation. Both attributes store the
/// name set in the pipe-delimited encoding, so scope checks reduce to
/// substring and regex tests over the encoded string.
///

///
/// ClassificationScope
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClassificationScope {
    /// Any classification at all, direct or propagated.
    MatchAllClassified,

    /// No classification, direct or propagated.
    NotClassified,

    /// Carries one of the given classification names.
    Names(BTreeSet<String>),

    /// Carries a name matching one of the given `*`-wildcard patterns.
    Wildcard(BTreeSet<String>),
}

/// Build the in-memory predicate for a classification scope.
pub fn classification_predicate(
    scope: &ClassificationScope,
) -> Result<RecordPredicate, PredicateError> {
    let predicate = match scope {
        ClassificationScope::MatchAllClassified => RecordPredicate::Any(vec![
            RecordPredicate::attribute(TRAIT_NAMES_KEY, AttributeTest::NotEmpty),
            RecordPredicate::attribute(PROPAGATED_TRAIT_NAMES_KEY, AttributeTest::NotEmpty),
        ]),

        ClassificationScope::NotClassified => RecordPredicate::All(vec![
            RecordPredicate::attribute(TRAIT_NAMES_KEY, AttributeTest::NullOrEmpty),
            RecordPredicate::attribute(PROPAGATED_TRAIT_NAMES_KEY, AttributeTest::NullOrEmpty),
        ]),

        ClassificationScope::Names(names) => {
            let mut alternatives = Vec::new();

            for name in names {
                let member = Value::Text(delimited_name(name));

                alternatives.push(RecordPredicate::attribute(
                    TRAIT_NAMES_KEY,
                    AttributeTest::Contains {
                        value: Some(member.clone()),
                    },
                ));
                alternatives.push(RecordPredicate::attribute(
                    PROPAGATED_TRAIT_NAMES_KEY,
                    AttributeTest::Contains {
                        value: Some(member),
                    },
                ));
            }

            RecordPredicate::Any(alternatives)
        }

        ClassificationScope::Wildcard(patterns) => {
            let mut alternatives = Vec::new();

            for pattern in patterns {
                // Classification names hold letters, digits, spaces, and
                // underscores; only the delimiters need escaping.
                let pattern = wildcard_regex(&format!(
                    "\\{NAME_DELIMITER}{pattern}\\{NAME_DELIMITER}"
                ));
                let regex = compile_scope_pattern(&pattern)?;

                alternatives.push(RecordPredicate::attribute(
                    TRAIT_NAMES_KEY,
                    AttributeTest::Like {
                        pattern: regex.clone(),
                    },
                ));
                alternatives.push(RecordPredicate::attribute(
                    PROPAGATED_TRAIT_NAMES_KEY,
                    AttributeTest::Like { pattern: regex },
                ));
            }

            RecordPredicate::Any(alternatives)
        }
    };

    Ok(predicate)
}

fn compile_scope_pattern(pattern: &str) -> Result<Regex, PredicateError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| PredicateError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

///
/// ClassificationScopeStage
///
/// Pipeline stage retaining records whose direct or propagated classification
/// names intersect the scope set. An empty scope set retains only records
/// carrying some classification.
///

#[derive(Clone, Debug, Default)]
pub struct ClassificationScopeStage {
    names: BTreeSet<String>,
}

impl ClassificationScopeStage {
    #[must_use]
    pub fn new(names: BTreeSet<String>) -> Self {
        Self { names }
    }

    fn retains<R: Record>(&self, record: &R) -> bool {
        let in_scope = |key: &str| {
            let names = encoded_names(record, key);
            !names.is_empty() && (self.names.is_empty() || names.iter().any(|name| self.names.contains(name)))
        };

        in_scope(TRAIT_NAMES_KEY) || in_scope(PROPAGATED_TRAIT_NAMES_KEY)
    }
}

impl<R: Record> FilterStage<R> for ClassificationScopeStage {
    fn apply(&self, records: Vec<R>) -> Vec<R> {
        records
            .into_iter()
            .filter(|record| self.retains(record))
            .collect()
    }
}

// Decode a pipe-delimited name set off a record.
fn encoded_names<R: Record + ?Sized>(record: &R, key: &str) -> Vec<String> {
    record
        .attribute(key)
        .as_ref()
        .and_then(Value::as_text)
        .map(|encoded| {
            encoded
                .split(NAME_DELIMITER)
                .filter(|name| !name.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::record;

    fn classified(direct: &str, propagated: &str) -> std::collections::BTreeMap<String, Value> {
        record(&[
            (TRAIT_NAMES_KEY, Value::from(direct)),
            (PROPAGATED_TRAIT_NAMES_KEY, Value::from(propagated)),
        ])
    }

    #[test]
    fn match_all_accepts_any_classification() {
        let predicate =
            classification_predicate(&ClassificationScope::MatchAllClassified).unwrap();

        assert!(predicate.matches(&classified("|PII|", "")));
        assert!(predicate.matches(&classified("", "|Inherited|")));
        assert!(!predicate.matches(&classified("", "")));
        assert!(!predicate.matches(&record(&[])));
    }

    #[test]
    fn not_classified_requires_both_sides_empty() {
        let predicate = classification_predicate(&ClassificationScope::NotClassified).unwrap();

        assert!(predicate.matches(&record(&[])));
        assert!(predicate.matches(&classified("", "")));
        assert!(!predicate.matches(&classified("|PII|", "")));
        assert!(!predicate.matches(&classified("", "|Inherited|")));
    }

    #[test]
    fn names_scope_matches_exact_members() {
        let scope = ClassificationScope::Names(["PII".to_string()].into());
        let predicate = classification_predicate(&scope).unwrap();

        assert!(predicate.matches(&classified("|PII|Sensitive|", "")));
        assert!(predicate.matches(&classified("", "|PII|")));
        assert!(!predicate.matches(&classified("|PIIX|", "")));
    }

    #[test]
    fn wildcard_scope_expands_star_patterns() {
        let scope = ClassificationScope::Wildcard(["PII*".to_string()].into());
        let predicate = classification_predicate(&scope).unwrap();

        assert!(predicate.matches(&classified("|PII_Email|", "")));
        assert!(predicate.matches(&classified("|PII|", "")));
        assert!(!predicate.matches(&classified("|Public|", "")));
    }

    #[test]
    fn scope_stage_filters_by_intersection() {
        let stage = ClassificationScopeStage::new(["PII".to_string()].into());

        let records = vec![
            classified("|PII|", ""),
            classified("", "|PII|Sensitive|"),
            classified("|Public|", ""),
            record(&[]),
        ];

        let kept = stage.apply(records);

        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn empty_scope_set_keeps_any_classified_record() {
        let stage = ClassificationScopeStage::new(BTreeSet::new());

        let records = vec![classified("|Anything|", ""), record(&[])];
        let kept = stage.apply(records);

        assert_eq!(kept.len(), 1);
    }
}
