//! Core contracts for keystone.
//!
//! This crate holds the field registry, resource declarations, the
//! foreign-key derivation engine, and the read-only catalog built from them.
//! Everything here is pure: catalogs are constructed once and passed by
//! reference, so several catalog releases can coexist in one process.

pub mod catalog;
pub mod constraints;
pub mod derive;
pub mod error;
pub mod fields;
pub mod graph;
pub mod schema;
pub mod types;
pub mod validation;

pub use catalog::{BuiltCatalog, Catalog, ResourceEdges, ResourceFilter};
pub use constraints::{
    ConstraintSet, ForeignKeyConstraint, ForeignKeyEdge, PrimaryKeyConstraint, foreign_key_name,
    primary_key_name,
};
pub use derive::{derive_foreign_keys, derive_for_parent, sort_edges};
pub use error::{CatalogError, CatalogWarning, DeclarationError, ObjectKind, Result};
pub use fields::{Field, FieldRegistry};
pub use graph::{DependencyReport, FkGraphSummary, build_dependency_report};
pub use schema::{ForeignKeyRule, Resource, ResourceName, ResourceSchema};
pub use types::{FieldConstraints, FieldType};
pub use validation::{index_resources, resolve_exclusions, validate_declarations};

/// Current contract version for emitted constraint-set artifacts.
pub const CATALOG_FORMAT_VERSION: &str = "0.1";
