//! Constraint validation of materialized catalog data.
//!
//! Checks primary keys, derived foreign-key edges, nullability, and enum
//! domains, and writes machine-readable and markdown reports.

pub mod data;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;
pub mod value;

pub use data::{Dataset, ResourceData};
pub use engine::ConstraintValidator;
pub use errors::{EvalError, Result};
pub use metrics::{
    ConstraintStats, ConstraintSummary, METRICS_VERSION, MetricsReport, ResourceMetrics,
    WarningItem,
};
pub use model::{
    ValidateOptions, Validation, ValidationRun, ValidationStatus, Violation, ViolationKind,
};
pub use report::render_report;
pub use value::{Value, parse_value, tuple_key};
