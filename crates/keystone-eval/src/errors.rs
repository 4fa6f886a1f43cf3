use std::path::PathBuf;

use keystone_core::CatalogError;
use thiserror::Error;

/// Errors emitted by the constraint validator.
///
/// Constraint violations are data, not errors; they are returned in the
/// validation result.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("data directory not found: {0}")]
    MissingDataDir(PathBuf),
    #[error("validation worker panicked")]
    WorkerPanicked,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, EvalError>;
