use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use keystone_core::{
    BuiltCatalog, CATALOG_FORMAT_VERSION, Catalog, ConstraintSet, Field, Resource, ResourceEdges,
    ResourceFilter,
};
use keystone_eval::{ConstraintValidator, ValidationStatus};
use keystone_load::load_declarations;
use serde::Serialize;
use uuid::Uuid;

use crate::config::EffectiveSettings;
use crate::error::{CliError, CliResult, EXIT_CLEAN, EXIT_VIOLATIONS};
use crate::registry::{RunContext, init_run_logging, start_run, write_json};

/// Constraint-set artifact handed to a physical-schema builder.
#[derive(Debug, Serialize)]
struct ConstraintArtifact {
    format_version: &'static str,
    #[serde(flatten)]
    constraints: ConstraintSet,
}

#[derive(Debug, Serialize)]
struct ResourceView<'a> {
    resource: &'a Resource,
    fields: Vec<&'a Field>,
    edges: ResourceEdges<'a>,
}

pub fn build_catalog(settings: &EffectiveSettings) -> CliResult<BuiltCatalog> {
    let paths = settings.require_declarations()?;
    let built = load_declarations(paths)?.build()?;
    tracing::info!(
        event = "catalog_loaded",
        resources = built.catalog.resource_names().count(),
        edges = built.catalog.edges().len(),
        warnings = built.warnings.len()
    );
    Ok(built)
}

pub fn derive(catalog: &Catalog, json: bool, out: Option<&Path>) -> CliResult<u8> {
    if !json && out.is_none() {
        for edge in catalog.edges() {
            println!("{edge}");
        }
        return Ok(EXIT_CLEAN);
    }

    let artifact = ConstraintArtifact {
        format_version: CATALOG_FORMAT_VERSION,
        constraints: catalog.constraint_set(),
    };
    match out {
        Some(path) => {
            write_json(path, &artifact)?;
            tracing::info!(event = "constraints_written", path = %path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&artifact)?),
    }
    Ok(EXIT_CLEAN)
}

pub fn list(
    catalog: &Catalog,
    source: Option<String>,
    group: Option<String>,
    json: bool,
) -> CliResult<u8> {
    let filter = ResourceFilter { source, group };
    let resources = catalog.list_resources(&filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&resources)?);
        return Ok(EXIT_CLEAN);
    }

    for resource in resources {
        let sources = resource.sources.iter().cloned().collect::<Vec<_>>().join(",");
        println!(
            "{}\t{}\t{}",
            resource.name,
            if sources.is_empty() { "-" } else { sources.as_str() },
            resource.etl_group.as_deref().unwrap_or("-")
        );
    }
    Ok(EXIT_CLEAN)
}

pub fn show(catalog: &Catalog, name: &str, json: bool) -> CliResult<u8> {
    let view = ResourceView {
        resource: catalog.get_resource(name)?,
        fields: catalog.get_fields(name)?,
        edges: catalog.edges_for(name)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(EXIT_CLEAN);
    }

    let resource = view.resource;
    println!("resource: {}", resource.name);
    if let Some(title) = &resource.title {
        println!("title: {title}");
    }
    if let Some(description) = &resource.description {
        println!("description: {description}");
    }
    if !resource.sources.is_empty() {
        let sources = resource.sources.iter().cloned().collect::<Vec<_>>();
        println!("sources: {}", sources.join(", "));
    }
    if let Some(group) = &resource.etl_group {
        println!("etl_group: {group}");
    }
    match resource.primary_key() {
        Some(key) => println!("primary_key: ({})", key.join(", ")),
        None => println!("primary_key: -"),
    }

    println!("fields:");
    for field in &view.fields {
        let nullability = if field.nullable { "" } else { " not null" };
        println!("  {} {}{}", field.name, field.field_type, nullability);
    }
    if !view.edges.as_child.is_empty() {
        println!("references:");
        for edge in &view.edges.as_child {
            println!("  {edge}");
        }
    }
    if !view.edges.as_parent.is_empty() {
        println!("referenced by:");
        for edge in &view.edges.as_parent {
            println!("  {edge}");
        }
    }
    Ok(EXIT_CLEAN)
}

pub fn graph(catalog: &Catalog, json: bool) -> CliResult<u8> {
    let report = catalog.dependency_report();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(EXIT_CLEAN);
    }

    println!(
        "resources={} edges={} self_references={}",
        report.summary.nodes, report.summary.edges, report.summary.self_references
    );
    if let Some(order) = &report.load_order {
        for (position, resource) in order.iter().enumerate() {
            println!("{:>4} {resource}", position + 1);
        }
    }
    if let Some(cycle) = &report.cycle {
        let names = cycle.iter().map(|name| name.as_str()).collect::<Vec<_>>();
        println!("cycle: {}", names.join(", "));
    }
    Ok(EXIT_CLEAN)
}

/// Validate a data directory inside a fresh run directory.
pub fn validate(settings: &EffectiveSettings) -> CliResult<u8> {
    let options = settings.validate_options()?;
    let data_dir = settings.data_dir.clone().ok_or_else(|| {
        CliError::InvalidConfig("no data directory; pass --data or set `data_dir`".to_string())
    })?;

    let ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: Utc::now(),
        command: "validate".to_string(),
        run_dir: settings.run_dir.clone(),
        settings: settings.clone(),
    };
    let paths = start_run(&ctx)?;
    init_run_logging(&paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %ctx.run_id, command = %ctx.command);
    let timer = Instant::now();

    let built = build_catalog(settings)?;
    let out_dir = settings
        .out_dir
        .clone()
        .unwrap_or_else(|| paths.root.clone());
    let run = ConstraintValidator::new(&built.catalog, options).run(&data_dir, &out_dir)?;

    let validation = &run.validation;
    let status = match validation.status() {
        ValidationStatus::Clean => EXIT_CLEAN,
        ValidationStatus::ViolationsFound => EXIT_VIOLATIONS,
    };

    println!("run_dir={}", paths.root.display());
    println!("report_path={}", run.report_path.display());
    if let Some(path) = &run.violations_path {
        println!("violations_path={}", path.display());
    }
    println!(
        "violations={} retained={} truncated={}",
        validation.summary.total_violations(),
        validation.violations.len(),
        validation.truncated
    );

    tracing::info!(
        event = "run_finished",
        status = ?validation.status(),
        violations = validation.summary.total_violations(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(status)
}
