use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use keystone_core::ResourceName;
use serde::{Deserialize, Serialize};

use crate::metrics::{ConstraintSummary, MetricsReport, WarningItem};

/// Options for a validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Retain at most this many violations; `None` keeps all.
    ///
    /// Each check keeps its first `max_violations` offenders and counts the
    /// rest, then the merged list is sorted and cut to the cap. Peak memory
    /// is therefore bounded by the cap times the number of checks in the
    /// pass, not by the cap alone.
    pub max_violations: Option<usize>,
    /// Worker threads used to shard per-resource checks.
    pub workers: usize,
    /// Limit the number of examples emitted in the report.
    pub max_examples: usize,
    /// Emit violations.json with the retained violations.
    pub write_violations: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            max_violations: Some(10_000),
            workers: 1,
            max_examples: 20,
            write_violations: true,
        }
    }
}

/// Data-level constraint failure classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PrimaryKeyNull,
    PrimaryKeyDuplicate,
    ForeignKeyPartialNull,
    ForeignKeyUnresolved,
    NotNull,
    EnumDomain,
    InvalidValue,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::PrimaryKeyNull => "primary_key_null",
            ViolationKind::PrimaryKeyDuplicate => "primary_key_duplicate",
            ViolationKind::ForeignKeyPartialNull => "foreign_key_partial_null",
            ViolationKind::ForeignKeyUnresolved => "foreign_key_unresolved",
            ViolationKind::NotNull => "not_null",
            ViolationKind::EnumDomain => "enum_domain",
            ViolationKind::InvalidValue => "invalid_value",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured violation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub resource: ResourceName,
    pub kind: ViolationKind,
    /// Constraint name, e.g. `pk_plants_pudl` or `fk_plants_ferc1_plant_id_pudl_plants_pudl`.
    pub constraint: String,
    /// 1-based data row.
    pub row_index: u64,
    /// Primary-key values of the offending row; empty when the resource has none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_key: Vec<String>,
    /// Earlier row involved in the failure, for duplicates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_row: Option<u64>,
    pub message: String,
}

impl Violation {
    pub(crate) fn sort_key(&self) -> (&ResourceName, &str, u64, ViolationKind) {
        (&self.resource, &self.constraint, self.row_index, self.kind)
    }
}

/// Overall outcome of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Clean,
    ViolationsFound,
}

/// In-memory result of validating a dataset.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Retained violations ordered by (resource, constraint, row, kind).
    pub violations: Vec<Violation>,
    pub warnings: Vec<WarningItem>,
    pub summary: ConstraintSummary,
    pub violations_by_kind: BTreeMap<ViolationKind, u64>,
    /// Set when more violations were found than retained.
    pub truncated: bool,
}

impl Validation {
    pub fn status(&self) -> ValidationStatus {
        if self.summary.total_violations() == 0 {
            ValidationStatus::Clean
        } else {
            ValidationStatus::ViolationsFound
        }
    }
}

/// Result of a validation run with written artifacts.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub out_dir: PathBuf,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
    pub violations_path: Option<PathBuf>,
    pub metrics: MetricsReport,
    pub report: String,
    pub validation: Validation,
}
