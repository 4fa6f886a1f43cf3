use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Defects in authored metadata. Any of these aborts the catalog build.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("duplicate field name: {0}")]
    DuplicateField(String),
    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),
    #[error("resource '{resource}' lists field '{field}' more than once")]
    DuplicateResourceField { resource: String, field: String },
    #[error("resource '{resource}' references unknown field '{field}'")]
    UnknownField { resource: String, field: String },
    #[error("primary key of '{resource}' references field '{field}' missing from its field list")]
    UnknownPrimaryKeyField { resource: String, field: String },
    #[error("primary key of '{resource}' is empty")]
    EmptyPrimaryKey { resource: String },
    #[error("primary key of '{resource}' repeats field '{field}'")]
    RepeatedPrimaryKeyField { resource: String, field: String },
    #[error("resource '{resource}' declares foreign key rules but has no primary key")]
    RuleWithoutPrimaryKey { resource: String },
    #[error(
        "foreign key rule on '{resource}' has field group ({group}) of length {found}, primary key has {expected}"
    )]
    FieldGroupLength {
        resource: String,
        group: String,
        expected: usize,
        found: usize,
    },
    #[error("foreign key rule on '{resource}' declares field group ({group}) more than once")]
    DuplicateFieldGroup { resource: String, group: String },
    #[error("foreign key rule on '{resource}' has an empty field group")]
    EmptyFieldGroup { resource: String },
}

/// Kind of object a catalog lookup was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Resource,
    Field,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Resource => f.write_str("resource"),
            ObjectKind::Field => f.write_str("field"),
        }
    }
}

/// Core error type shared across keystone crates.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The declaration set is broken.
    #[error("declaration error: {0}")]
    Declaration(#[from] DeclarationError),
    /// A lookup named something the catalog does not contain.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ObjectKind, name: String },
}

impl CatalogError {
    pub(crate) fn resource_not_found(name: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind: ObjectKind::Resource,
            name: name.into(),
        }
    }

    pub(crate) fn field_not_found(name: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind: ObjectKind::Field,
            name: name.into(),
        }
    }
}

/// Non-fatal problems found while resolving declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CatalogWarning {
    /// An exclusion names a resource absent from this catalog.
    UnknownResource { resource: String, referenced: String },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::UnknownResource {
                resource,
                referenced,
            } => write!(
                f,
                "foreign key rule on '{resource}' excludes unknown resource '{referenced}'"
            ),
        }
    }
}

/// Convenience alias for results returned by keystone crates.
pub type Result<T> = std::result::Result<T, CatalogError>;
