use std::path::{Path, PathBuf};

use keystone_eval::ValidateOptions;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "keystone.toml";

const DEFAULT_RUN_DIR: &str = "runs";

/// Contents of `keystone.toml`. Relative paths are resolved against the
/// file's directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub declarations: Vec<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub run_dir: Option<PathBuf>,
    /// `0` disables the cap.
    pub max_violations: Option<usize>,
    pub workers: Option<usize>,
    pub max_examples: Option<usize>,
}

impl FileSettings {
    fn resolve_relative(mut self, base: &Path) -> Self {
        let join = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.declarations = self.declarations.into_iter().map(join).collect();
        self.data_dir = self.data_dir.map(join);
        self.run_dir = self.run_dir.map(join);
        self
    }
}

/// Read `explicit`, or `keystone.toml` if present, or fall back to defaults.
pub fn load_settings(explicit: Option<&Path>) -> CliResult<(FileSettings, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.is_file() {
                return Ok((FileSettings::default(), None));
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| CliError::ConfigIo {
        path: path.clone(),
        source,
    })?;
    let settings = parse_settings(&path, &content)?;
    Ok((settings, Some(path)))
}

fn parse_settings(path: &Path, content: &str) -> CliResult<FileSettings> {
    let settings: FileSettings = toml::from_str(content).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(settings.resolve_relative(base))
}

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub declarations: Vec<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub run_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub max_violations: Option<usize>,
    pub workers: Option<usize>,
    pub max_examples: Option<usize>,
}

/// Settings after merging flags, config file, and defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    pub config_path: Option<PathBuf>,
    pub declarations: Vec<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub run_dir: PathBuf,
    pub out_dir: Option<PathBuf>,
    pub max_violations: Option<usize>,
    pub workers: usize,
    pub max_examples: usize,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self::resolve(FileSettings::default(), None, Overrides::default())
    }
}

impl EffectiveSettings {
    pub fn resolve(file: FileSettings, config_path: Option<PathBuf>, overrides: Overrides) -> Self {
        let defaults = ValidateOptions::default();
        let declarations = if overrides.declarations.is_empty() {
            file.declarations
        } else {
            overrides.declarations
        };
        let max_violations = match overrides.max_violations.or(file.max_violations) {
            Some(0) => None,
            Some(cap) => Some(cap),
            None => defaults.max_violations,
        };

        Self {
            config_path,
            declarations,
            data_dir: overrides.data_dir.or(file.data_dir),
            run_dir: overrides
                .run_dir
                .or(file.run_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_DIR)),
            out_dir: overrides.out_dir,
            max_violations,
            workers: overrides.workers.or(file.workers).unwrap_or(defaults.workers),
            max_examples: overrides
                .max_examples
                .or(file.max_examples)
                .unwrap_or(defaults.max_examples),
        }
    }

    pub fn require_declarations(&self) -> CliResult<&[PathBuf]> {
        if self.declarations.is_empty() {
            return Err(CliError::InvalidConfig(format!(
                "no declaration documents given; pass --declarations or set `declarations` in {DEFAULT_CONFIG}"
            )));
        }
        Ok(&self.declarations)
    }

    pub fn validate_options(&self) -> CliResult<ValidateOptions> {
        if self.workers == 0 {
            return Err(CliError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(ValidateOptions {
            max_violations: self.max_violations,
            workers: self.workers,
            max_examples: self.max_examples,
            write_violations: true,
        })
    }
}
