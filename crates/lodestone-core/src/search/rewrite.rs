use crate::{
    search::criteria::{FilterCriteria, Operator},
    typedef::{CUSTOM_ATTRIBUTES_KEY, INCOMPLETE_SENTINEL, IS_INCOMPLETE_KEY, NAME_DELIMITER,
              is_pipe_delimited_attribute},
};

///
/// Pre-compilation rewrites
///
/// Two storage representations diverge from their logical form and must be
/// normalized before any backend compiles a leaf:
///
/// - the incomplete-entity marker is stored present-vs-absent, not boolean;
/// - pipe-delimited system attributes store a multi-value set as one
///   delimiter-joined string.
///
/// The marker rewrite runs exactly once, over a copy of the whole tree. The
/// pipe-delimited rewrite is applied per leaf by each compiler, identically,
/// so the three backends agree.
///

/// Rewrite system-attribute leaves into their storage form. Returns a copy;
/// the input tree is never mutated. Applying the rewrite twice is a no-op.
#[must_use]
pub fn rewrite_system_criteria(criteria: &FilterCriteria) -> FilterCriteria {
    let mut rewritten = criteria.clone();
    rewrite_in_place(&mut rewritten);
    rewritten
}

fn rewrite_in_place(criteria: &mut FilterCriteria) {
    if criteria.is_branch() {
        for child in &mut criteria.criterion {
            rewrite_in_place(child);
        }
        return;
    }

    let Some(leaf) = criteria.leaf_view() else {
        return;
    };

    if leaf.attribute != IS_INCOMPLETE_KEY {
        return;
    }

    // Incomplete entities carry the sentinel under the marker key; complete
    // entities carry nothing. Boolean comparisons become presence checks.
    let rewritten = match leaf.operator {
        Operator::Eq if is_falsy(leaf.value) => Some((Operator::IsNull, None)),
        Operator::Eq => Some((Operator::Eq, Some(INCOMPLETE_SENTINEL))),

        Operator::Neq if is_falsy(leaf.value) => Some((Operator::Eq, Some(INCOMPLETE_SENTINEL))),
        Operator::Neq => Some((Operator::IsNull, None)),

        Operator::NotNull => Some((Operator::Eq, Some(INCOMPLETE_SENTINEL))),

        _ => None,
    };

    if let Some((operator, value)) = rewritten {
        criteria.operator = Some(operator);
        criteria.attribute_value = value.map(ToString::to_string);
    }
}

fn is_falsy(value: &str) -> bool {
    value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false")
}

///
/// RewrittenLeaf
///
/// Operator/value pair after the pipe-delimited storage rewrite.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewrittenLeaf {
    pub operator: Operator,
    pub value: String,
}

/// Rewrite one leaf's operator and value for pipe-delimited storage. Leaves on
/// other attributes pass through unchanged.
///
/// Exact-match and edge-anchored operators become substring containment over
/// the encoded string: the delimiter wrapping reproduces set semantics on the
/// joined representation.
#[must_use]
pub fn rewrite_pipe_delimited_leaf(
    attribute: &str,
    operator: Operator,
    value: &str,
) -> RewrittenLeaf {
    if !is_pipe_delimited_attribute(attribute) {
        return RewrittenLeaf {
            operator,
            value: value.to_string(),
        };
    }

    let (operator, value) = match operator {
        Operator::StartsWith => (Operator::Contains, format!("{NAME_DELIMITER}{value}")),
        Operator::EndsWith => (Operator::Contains, format!("{value}{NAME_DELIMITER}")),
        Operator::Eq => (Operator::Contains, delimited_name(value)),
        Operator::Neq => (Operator::NotContains, delimited_name(value)),

        Operator::Contains if attribute == CUSTOM_ATTRIBUTES_KEY => {
            (Operator::Contains, custom_attribute_quoted_pair(value))
        }

        other => (other, value.to_string()),
    };

    RewrittenLeaf { operator, value }
}

/// Wrap one set member in delimiters, matching the encoded storage form.
#[must_use]
pub fn delimited_name(value: &str) -> String {
    format!("{NAME_DELIMITER}{value}{NAME_DELIMITER}")
}

/// Rewrite a `key=value` custom-attribute filter into the bag's internal
/// quoted-pair encoding, `"key":"value"`. Values without a separator pass
/// through unchanged.
#[must_use]
pub fn custom_attribute_quoted_pair(value: &str) -> String {
    match value.split_once('=') {
        Some((key, pair_value)) => format!("\"{key}\":\"{pair_value}\""),
        None => value.to_string(),
    }
}

///
/// TESTS
///
