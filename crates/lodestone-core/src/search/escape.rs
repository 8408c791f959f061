use regex::Regex;
use std::sync::LazyLock;

///
/// Escaping and query-text hygiene
///
/// Filter values are untrusted input. Index-query text and regex patterns each
/// have their own reserved-character set; both escapes prefix every reserved
/// character with a backslash.
///

/// Characters reserved by the index engine's query grammar. A raw occurrence
/// in a value breaks the query (or silently changes its meaning) unless
/// escaped.
pub const INDEX_QUERY_SPECIAL_CHARS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '/',
    '#', '$', '%', '@', '=',
];

const REGEX_SPECIAL_CHARS: &[char] = &['+', '|', '(', '{', '[', '*', '?', '$', '/', '^'];

#[must_use]
pub fn has_index_special_char(value: &str) -> bool {
    value.contains(INDEX_QUERY_SPECIAL_CHARS)
}

/// Escape a value for inclusion in index-query text.
#[must_use]
pub fn escape_index_value(value: &str) -> String {
    escape_chars(value, INDEX_QUERY_SPECIAL_CHARS)
}

/// Escape a value for literal use inside a regex pattern.
#[must_use]
pub fn escape_regex_value(value: &str) -> String {
    escape_chars(value, REGEX_SPECIAL_CHARS)
}

/// Substring-match pattern for the graph backend's regex operator.
#[must_use]
pub fn contains_regex(value: &str) -> String {
    format!(".*{}.*", escape_regex_value(value))
}

/// Suffix-match pattern for the graph backend's regex operator.
#[must_use]
pub fn suffix_regex(value: &str) -> String {
    format!(".*{}", escape_regex_value(value))
}

/// Substring pattern with `*` wildcards expanded. The input is expected to be
/// pre-escaped where literal regex characters matter.
#[must_use]
pub fn wildcard_regex(value: &str) -> String {
    format!(".*{}.*", value.replace('*', ".*"))
}

fn escape_chars(value: &str, reserved: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        if reserved.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

static STRAY_AND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(AND\s+)+\)").expect("stray AND pattern"));
static STRAY_OR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(OR\s+)+\)").expect("stray OR pattern"));
static STRAY_ELLIPSIS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)").expect("stray parens pattern"));

/// Whether emitted query text contains dangling boolean keywords or empty
/// parentheses. The index compiler never produces these; the check backs the
/// compiler's structural tests.
#[must_use]
pub fn has_stray_clauses(query: &str) -> bool {
    STRAY_AND_PATTERN.is_match(query)
        || STRAY_OR_PATTERN.is_match(query)
        || STRAY_ELLIPSIS_PATTERN.is_match(query)
}

///
/// TESTS
///
