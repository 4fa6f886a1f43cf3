use std::fmt;
use std::path::PathBuf;

use keystone_core::{CatalogError, DeclarationError};
use thiserror::Error;

/// Severity level for structural issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured issue with document location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, self.path, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Aggregated structural report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error issue.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a warning issue.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Errors raised while reading declaration documents.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("toml error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported declaration document: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("json schema error: {0}")]
    Schema(String),
    #[error("{path} is malformed ({} structural error(s))", .report.errors.len())]
    Structural { path: PathBuf, report: ValidationReport },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<DeclarationError> for LoadError {
    fn from(value: DeclarationError) -> Self {
        LoadError::Catalog(CatalogError::Declaration(value))
    }
}

impl LoadError {
    /// True when the failure is a defect in authored metadata rather than
    /// an environment problem such as a missing file.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            LoadError::Json { .. }
                | LoadError::Toml { .. }
                | LoadError::Structural { .. }
                | LoadError::Catalog(CatalogError::Declaration(_))
        )
    }
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
