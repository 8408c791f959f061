//! Runtime type model for the metadata catalog.
//!
//! Types arrive from the catalog's type registry at runtime, so the model here
//! is built from owned data rather than generated statics. It carries only the
//! surface the filter compilers consume: attribute lookup, declared kind, and
//! the storage key each attribute lives under on a vertex.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error as ThisError;

///
/// CONSTANTS
///
/// Storage keys for the system attributes shared by every type. System
/// attributes resolve on every type and store under their own name.
///

/// Direct classification names, pipe-delimited into one string property.
pub const TRAIT_NAMES_KEY: &str = "__traitNames";

/// Propagated classification names, pipe-delimited into one string property.
pub const PROPAGATED_TRAIT_NAMES_KEY: &str = "__propagatedTraitNames";

/// User labels, pipe-delimited into one string property.
pub const LABELS_KEY: &str = "__labels";

/// Custom attribute bag, serialized as one string of quoted `"key":"value"` pairs.
pub const CUSTOM_ATTRIBUTES_KEY: &str = "__customAttributes";

/// Shell-entity marker. Present (set to [`INCOMPLETE_SENTINEL`]) on incomplete
/// entities, absent otherwise; its logical boolean form is rewritten before
/// compilation.
pub const IS_INCOMPLETE_KEY: &str = "__isIncomplete";

/// Value stored under [`IS_INCOMPLETE_KEY`] on incomplete entities.
pub const INCOMPLETE_SENTINEL: &str = "2";

/// Delimiter joining multi-value system attributes into one string.
pub const NAME_DELIMITER: char = '|';

pub const GUID_KEY: &str = "__guid";
pub const TYPE_NAME_KEY: &str = "__typeName";
pub const TIMESTAMP_KEY: &str = "__timestamp";
pub const MODIFICATION_TIMESTAMP_KEY: &str = "__modificationTimestamp";
pub const CREATED_BY_KEY: &str = "__createdBy";
pub const MODIFIED_BY_KEY: &str = "__modifiedBy";

///
/// AttributeKind
///
/// Declared primitive kind of an attribute. This is a lossy projection of the
/// catalog's full type system: it keeps exactly what value coercion and the
/// predicate compilers need.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Short,
    Int,
    BigInteger,
    Boolean,
    Byte,
    Long,
    Date,
    Float,
    Double,
    BigDecimal,
    Enum,
    List(Box<AttributeKind>),

    /// Struct or otherwise opaque attribute; values pass through unparsed.
    Object,
}

impl AttributeKind {
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Stable label for diagnostics and coercion errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Short => "short",
            Self::Int => "int",
            Self::BigInteger => "biginteger",
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Long => "long",
            Self::Date => "date",
            Self::Float => "float",
            Self::Double => "double",
            Self::BigDecimal => "bigdecimal",
            Self::Enum => "enum",
            Self::List(_) => "list",
            Self::Object => "object",
        }
    }
}

///
/// TypeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Entity,
    Classification,
}

///
/// AttributeDef
///
/// One attribute of a type: logical name, declared kind, and the storage key
/// ("vertex property name") its values are persisted under.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeDef {
    pub name: String,
    pub kind: AttributeKind,
    pub storage_key: String,
}

///
/// TypeDef
///
/// An entity or classification type in scope for a search. Attribute order is
/// preserved as declared; lookup falls back to the shared system table so every
/// type honors system-attribute filters.
///

#[derive(Clone, Debug)]
pub struct TypeDef {
    name: String,
    kind: TypeKind,
    attributes: Vec<AttributeDef>,
}

impl TypeDef {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute stored under the conventional `Type.attribute` key.
    #[must_use]
    pub fn with_attribute(self, name: &str, kind: AttributeKind) -> Self {
        let storage_key = format!("{}.{name}", self.name);
        self.with_keyed_attribute(name, kind, storage_key)
    }

    /// Declare an attribute with an explicit storage key.
    #[must_use]
    pub fn with_keyed_attribute(
        mut self,
        name: impl Into<String>,
        kind: AttributeKind,
        storage_key: impl Into<String>,
    ) -> Self {
        self.attributes.push(AttributeDef {
            name: name.into(),
            kind,
            storage_key: storage_key.into(),
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Look up an attribute by logical name; system attributes resolve on
    /// every type.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .or_else(|| system_attribute(name))
    }

    /// Resolve the storage key for an attribute, failing when the attribute is
    /// unknown to this type.
    pub fn storage_key(&self, name: &str) -> Result<&str, TypeDefError> {
        self.attribute(name)
            .map(|attribute| attribute.storage_key.as_str())
            .ok_or_else(|| TypeDefError::UnknownAttribute {
                type_name: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    #[must_use]
    pub fn attribute_kind(&self, name: &str) -> Option<&AttributeKind> {
        self.attribute(name).map(|attribute| &attribute.kind)
    }
}

///
/// TypeDefError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TypeDefError {
    #[error("type '{type_name}' has no attribute '{attribute}'")]
    UnknownAttribute { type_name: String, attribute: String },
}

///
/// System attribute table
///
/// Shared root attributes every type exposes. Storage key equals the logical
/// name for all of them.
///

static SYSTEM_ATTRIBUTES: LazyLock<Vec<AttributeDef>> = LazyLock::new(|| {
    let system = |name: &str, kind: AttributeKind| AttributeDef {
        name: name.to_string(),
        kind,
        storage_key: name.to_string(),
    };

    vec![
        system(GUID_KEY, AttributeKind::String),
        system(TYPE_NAME_KEY, AttributeKind::String),
        system(TIMESTAMP_KEY, AttributeKind::Date),
        system(MODIFICATION_TIMESTAMP_KEY, AttributeKind::Date),
        system(CREATED_BY_KEY, AttributeKind::String),
        system(MODIFIED_BY_KEY, AttributeKind::String),
        system(TRAIT_NAMES_KEY, AttributeKind::String),
        system(PROPAGATED_TRAIT_NAMES_KEY, AttributeKind::String),
        system(LABELS_KEY, AttributeKind::String),
        system(CUSTOM_ATTRIBUTES_KEY, AttributeKind::String),
        system(IS_INCOMPLETE_KEY, AttributeKind::Int),
    ]
});

/// Look up a system attribute by name.
#[must_use]
pub fn system_attribute(name: &str) -> Option<&'static AttributeDef> {
    SYSTEM_ATTRIBUTES
        .iter()
        .find(|attribute| attribute.name == name)
}

#[must_use]
pub fn is_system_attribute(name: &str) -> bool {
    system_attribute(name).is_some()
}

/// Whether an attribute's multi-value set is stored as one delimiter-joined
/// string. These tolerate index-special characters (the delimiter itself) and
/// get their operators rewritten before evaluation.
#[must_use]
pub fn is_pipe_delimited_attribute(name: &str) -> bool {
    name == TRAIT_NAMES_KEY
        || name == PROPAGATED_TRAIT_NAMES_KEY
        || name == LABELS_KEY
        || name == CUSTOM_ATTRIBUTES_KEY
}

///
/// TESTS
///
