mod commands;
mod config;
mod error;
mod registry;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use config::{EffectiveSettings, FileSettings, Overrides, load_settings};
use error::CliResult;
use keystone_core::BuiltCatalog;

#[derive(Parser, Debug)]
#[command(name = "keystone", version, about = "Keystone catalog constraint engine")]
struct Cli {
    /// Config file; defaults to ./keystone.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Declaration document or directory of documents (repeatable).
    #[arg(long = "declarations", short = 'd', global = true, value_name = "PATH")]
    declarations: Vec<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive foreign-key edges from the declarations.
    Derive(DeriveArgs),
    /// List resources, optionally filtered by source or ETL group.
    List(ListArgs),
    /// Show one resource with its fields and edges.
    Show(ShowArgs),
    /// Print a parent-first load order of all resources.
    Graph(GraphArgs),
    /// Check CSV data against keys, derived edges, and field domains.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct DeriveArgs {
    /// Emit the named constraint set as JSON instead of edge lines.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Write the JSON constraint set to this path.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only resources reported by this source (e.g. eia860).
    #[arg(long)]
    source: Option<String>,
    /// Only resources produced by this ETL group.
    #[arg(long)]
    group: Option<String>,
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ShowArgs {
    resource: String,
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Directory holding one `<resource>.csv` per materialized resource.
    #[arg(long = "data", value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Parent directory for run directories.
    #[arg(long, value_name = "DIR")]
    run_dir: Option<PathBuf>,
    /// Write report artifacts here instead of the run directory.
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Stop retaining violations after this many; 0 keeps all.
    #[arg(long)]
    max_violations: Option<usize>,
    /// Worker threads for per-resource checks.
    #[arg(long)]
    workers: Option<usize>,
    /// Violations listed in report.md.
    #[arg(long)]
    max_examples: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            tracing::error!(event = "run_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<u8> {
    let (file, config_path) = load_settings(cli.config.as_deref())?;
    let overrides = Overrides {
        declarations: cli.declarations,
        ..Overrides::default()
    };

    match cli.command {
        Command::Derive(args) => {
            let built = open_catalog(file, config_path, overrides)?;
            commands::derive(&built.catalog, args.json, args.out.as_deref())
        }
        Command::List(args) => {
            let built = open_catalog(file, config_path, overrides)?;
            commands::list(&built.catalog, args.source, args.group, args.json)
        }
        Command::Show(args) => {
            let built = open_catalog(file, config_path, overrides)?;
            commands::show(&built.catalog, &args.resource, args.json)
        }
        Command::Graph(args) => {
            let built = open_catalog(file, config_path, overrides)?;
            commands::graph(&built.catalog, args.json)
        }
        Command::Validate(args) => {
            let overrides = Overrides {
                data_dir: args.data_dir,
                run_dir: args.run_dir,
                out_dir: args.out,
                max_violations: args.max_violations,
                workers: args.workers,
                max_examples: args.max_examples,
                ..overrides
            };
            let settings = EffectiveSettings::resolve(file, config_path, overrides);
            commands::validate(&settings)
        }
    }
}

/// Read-only commands log to stderr and share one catalog build path.
fn open_catalog(
    file: FileSettings,
    config_path: Option<PathBuf>,
    overrides: Overrides,
) -> CliResult<BuiltCatalog> {
    registry::init_stderr_logging()?;
    let settings = EffectiveSettings::resolve(file, config_path, overrides);
    commands::build_catalog(&settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_flags_parse() {
        let cli = Cli::try_parse_from([
            "keystone",
            "validate",
            "--data",
            "out/csv",
            "--workers",
            "4",
            "--max-violations",
            "0",
            "-d",
            "metadata",
        ])
        .expect("parse args");

        assert_eq!(cli.declarations, vec![PathBuf::from("metadata")]);
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.data_dir, Some(PathBuf::from("out/csv")));
                assert_eq!(args.workers, Some(4));
                assert_eq!(args.max_violations, Some(0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_requires_a_resource() {
        assert!(Cli::try_parse_from(["keystone", "show"]).is_err());
    }
}
