//! Declaration documents for keystone.
//!
//! Reads JSON or TOML documents (one per dataset family), checks them
//! against the declaration JSON Schema, and merges them into the single
//! declaration set a [`keystone_core::Catalog`] is built from.

pub mod document;
pub mod errors;
pub mod load;

pub use document::{DeclarationDocument, FieldDecl, ResourceDecl};
pub use errors::{IssueSeverity, LoadError, Result, ValidationIssue, ValidationReport};
pub use load::{
    Declarations, DocumentFormat, DocumentLoader, collect_document_paths, declaration_json_schema,
    load_declarations, validate_document_json,
};
