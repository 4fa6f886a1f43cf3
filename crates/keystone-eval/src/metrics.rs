use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ViolationKind;

/// Metrics contract version for validation runs.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable metrics for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub metrics_version: String,
    pub run_id: String,
    pub catalog: MetricsCatalogRef,
    pub resources: Vec<ResourceMetrics>,
    pub constraints: ConstraintSummary,
    /// Violations found per kind, including any beyond the retention cap.
    pub violations_by_kind: BTreeMap<ViolationKind, u64>,
    pub violations_retained: u64,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningItem>,
    pub performance: PerformanceMetrics,
}

/// Reference metadata for the catalog the data was checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsCatalogRef {
    pub format_version: String,
    pub resources: u64,
    pub edges: u64,
}

/// Per-resource row counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub resource: String,
    pub rows: u64,
    pub columns: u64,
}

/// Summary of constraint validation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub primary_key: ConstraintStats,
    pub foreign_key: ConstraintStats,
    pub not_null: ConstraintStats,
    pub enum_domain: ConstraintStats,
    /// Cells whose text does not parse as the field's type.
    #[serde(default)]
    pub field_type: ConstraintStats,
}

impl ConstraintSummary {
    pub fn merge(&mut self, other: &ConstraintSummary) {
        self.primary_key.merge(&other.primary_key);
        self.foreign_key.merge(&other.foreign_key);
        self.not_null.merge(&other.not_null);
        self.enum_domain.merge(&other.enum_domain);
        self.field_type.merge(&other.field_type);
    }

    pub fn total_violations(&self) -> u64 {
        self.primary_key.violations
            + self.foreign_key.violations
            + self.not_null.violations
            + self.enum_domain.violations
            + self.field_type.violations
    }
}

/// Generic constraint counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintStats {
    pub checked: u64,
    pub violations: u64,
}

impl ConstraintStats {
    fn merge(&mut self, other: &ConstraintStats) {
        self.checked += other.checked;
        self.violations += other.violations;
    }
}

/// Structured warning entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningItem {
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Performance timings for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub load_ms: u128,
    pub validate_ms: u128,
    pub total_ms: u128,
}
