use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Filter criteria
///
/// Wire-facing request shape for attribute filters. One struct covers both
/// node forms: a node carrying a condition and children is a branch; a node
/// carrying an attribute name is a leaf; anything else is vacuous and compiles
/// to nothing. The tree is immutable during compilation; the system-attribute
/// rewrite produces a copy before any compiler runs.
///

///
/// Condition
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Condition {
    And,
    Or,
}

impl Condition {
    /// Keyword used to join clauses in index-query text.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

///
/// Operator
///
/// Closed comparison-operator set. Not every operator maps onto every backend:
/// `NotContains` has no index template, and `In`/`NotContains` have no
/// graph-native form.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    #[serde(alias = "<", alias = "lt")]
    Lt,
    #[serde(alias = ">", alias = "gt")]
    Gt,
    #[serde(alias = "<=", alias = "lte")]
    Lte,
    #[serde(alias = ">=", alias = "gte")]
    Gte,
    #[serde(alias = "=", alias = "eq")]
    Eq,
    #[serde(alias = "!=", alias = "neq")]
    Neq,
    #[serde(alias = "in")]
    In,
    #[serde(alias = "like")]
    Like,
    #[serde(alias = "startsWith", alias = "begins_with")]
    StartsWith,
    #[serde(alias = "endsWith", alias = "ends_with")]
    EndsWith,
    #[serde(alias = "contains")]
    Contains,
    #[serde(alias = "notContains")]
    NotContains,
    #[serde(alias = "isNull")]
    IsNull,
    #[serde(alias = "notNull")]
    NotNull,
}

impl Operator {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Lte => "LTE",
            Self::Gte => "GTE",
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::In => "IN",
            Self::Like => "LIKE",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
            Self::IsNull => "IS_NULL",
            Self::NotNull => "NOT_NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// FilterCriteria
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub criterion: Vec<FilterCriteria>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_value: Option<String>,
}

///
/// LeafView
///
/// Borrowed view of a well-formed leaf. A missing attribute value reads as the
/// empty string; the two are equivalent everywhere values are interpreted.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeafView<'a> {
    pub attribute: &'a str,
    pub operator: Operator,
    pub value: &'a str,
}

impl FilterCriteria {
    #[must_use]
    pub fn and(criterion: Vec<Self>) -> Self {
        Self {
            condition: Some(Condition::And),
            criterion,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn or(criterion: Vec<Self>) -> Self {
        Self {
            condition: Some(Condition::Or),
            criterion,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn leaf(attribute: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            attribute_name: Some(attribute.into()),
            operator: Some(operator),
            attribute_value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Leaf for the value-less operators (`IsNull` / `NotNull`).
    #[must_use]
    pub fn unary(attribute: impl Into<String>, operator: Operator) -> Self {
        Self {
            attribute_name: Some(attribute.into()),
            operator: Some(operator),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.condition.is_some() && !self.criterion.is_empty()
    }

    /// View this node as a leaf, if it is one.
    #[must_use]
    pub fn leaf_view(&self) -> Option<LeafView<'_>> {
        if self.is_branch() {
            return None;
        }

        let attribute = self.attribute_name.as_deref().filter(|name| !name.is_empty())?;
        let operator = self.operator?;

        Some(LeafView {
            attribute,
            operator,
            value: self.attribute_value.as_deref().unwrap_or_default(),
        })
    }

    /// Whether any leaf in this subtree carries an attribute comparison.
    #[must_use]
    pub fn has_attribute_filter(&self) -> bool {
        if self.is_branch() {
            return self.criterion.iter().any(Self::has_attribute_filter);
        }

        self.leaf_view().is_some()
    }
}

///
/// TESTS
///
