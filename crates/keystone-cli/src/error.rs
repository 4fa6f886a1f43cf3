use std::path::PathBuf;

use keystone_core::CatalogError;
use keystone_eval::EvalError;
use keystone_load::LoadError;
use thiserror::Error;

use crate::registry::RegistryError;

/// Process exit status for a clean run.
pub const EXIT_CLEAN: u8 = 0;
/// Validation found constraint violations.
pub const EXIT_VIOLATIONS: u8 = 1;
/// Declarations are malformed; no catalog could be built.
pub const EXIT_DECLARATION_ERROR: u8 = 2;
/// Anything else: io, configuration, unreadable data.
pub const EXIT_FAILURE: u8 = 3;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("validation error: {0}")]
    Eval(#[from] EvalError),
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Load(err) if err.is_declaration_error() => EXIT_DECLARATION_ERROR,
            CliError::Catalog(CatalogError::Declaration(_)) => EXIT_DECLARATION_ERROR,
            CliError::Eval(EvalError::Catalog(CatalogError::Declaration(_))) => {
                EXIT_DECLARATION_ERROR
            }
            _ => EXIT_FAILURE,
        }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
