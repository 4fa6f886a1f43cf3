use std::env;
use std::path::PathBuf;

use keystone_eval::{ConstraintValidator, ValidateOptions};
use keystone_load::load_declarations;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut declarations: Vec<PathBuf> = Vec::new();
    let mut data_dir: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data" => data_dir = args.next().map(PathBuf::from),
            "--out" => out_dir = args.next().map(PathBuf::from),
            _ => declarations.push(PathBuf::from(arg)),
        }
    }

    if declarations.is_empty() {
        return Err("missing declaration paths".into());
    }
    let data_dir = data_dir.ok_or("missing --data directory")?;
    let out_dir = out_dir.ok_or("missing --out directory")?;

    let built = load_declarations(&declarations)?.build()?;
    let validator = ConstraintValidator::new(&built.catalog, ValidateOptions::default());
    let run = validator.run(&data_dir, &out_dir)?;

    println!("metrics_path={}", run.metrics_path.display());
    println!("report_path={}", run.report_path.display());
    if let Some(path) = run.violations_path {
        println!("violations_path={}", path.display());
    }
    Ok(())
}
