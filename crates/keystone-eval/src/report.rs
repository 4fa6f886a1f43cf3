use crate::metrics::{ConstraintStats, MetricsReport};
use crate::model::Violation;

/// Render a deterministic markdown report from metrics and violations.
pub fn render_report(
    metrics: &MetricsReport,
    violations: &[Violation],
    max_examples: usize,
) -> String {
    let mut lines = Vec::new();

    lines.push("# Keystone Validation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {}", metrics.run_id));
    lines.push(format!(
        "- catalog_format_version: {}",
        metrics.catalog.format_version
    ));
    lines.push(format!(
        "- catalog: {} resources, {} edges",
        metrics.catalog.resources, metrics.catalog.edges
    ));
    let status = if metrics.constraints.total_violations() == 0 {
        "clean"
    } else {
        "violations found"
    };
    lines.push(format!("- status: {status}"));
    lines.push(String::new());

    lines.push("## Materialized resources".to_string());
    lines.push("| resource | rows | columns |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for resource in &metrics.resources {
        lines.push(format!(
            "| {} | {} | {} |",
            resource.resource, resource.rows, resource.columns
        ));
    }
    lines.push(String::new());

    lines.push("## Constraint summary".to_string());
    lines.push("| constraint | checked | violations |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    push_constraint_row(&mut lines, "primary_key", &metrics.constraints.primary_key);
    push_constraint_row(&mut lines, "foreign_key", &metrics.constraints.foreign_key);
    push_constraint_row(&mut lines, "not_null", &metrics.constraints.not_null);
    push_constraint_row(&mut lines, "enum_domain", &metrics.constraints.enum_domain);
    push_constraint_row(&mut lines, "field_type", &metrics.constraints.field_type);
    lines.push(String::new());

    if !metrics.violations_by_kind.is_empty() {
        lines.push("## Violations by kind".to_string());
        for (kind, count) in &metrics.violations_by_kind {
            lines.push(format!("- {kind}: {count}"));
        }
        if metrics.truncated {
            lines.push(format!(
                "- retained {} violation(s); the list was truncated",
                metrics.violations_retained
            ));
        }
        lines.push(String::new());
    }

    if !metrics.warnings.is_empty() {
        lines.push("## Warnings".to_string());
        for warning in &metrics.warnings {
            let hint = warning
                .hint
                .as_ref()
                .map(|hint| format!(" (hint: {hint})"))
                .unwrap_or_default();
            lines.push(format!(
                "- {} [{}]: {}{}",
                warning.path, warning.code, warning.message, hint
            ));
        }
        lines.push(String::new());
    }

    if !violations.is_empty() {
        lines.push("## Top violations".to_string());
        for violation in violations.iter().take(max_examples) {
            let key = if violation.row_key.is_empty() {
                String::new()
            } else {
                format!(" key=({})", violation.row_key.join(", "))
            };
            lines.push(format!(
                "- {} row {}{} [{}] {}: {}",
                violation.resource,
                violation.row_index,
                key,
                violation.kind,
                violation.constraint,
                violation.message
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(metrics));
    lines.join("\n")
}

fn push_constraint_row(lines: &mut Vec<String>, name: &str, stats: &ConstraintStats) {
    lines.push(format!(
        "| {} | {} | {} |",
        name, stats.checked, stats.violations
    ));
}

fn recommendations(metrics: &MetricsReport) -> Vec<String> {
    let mut lines = Vec::new();
    let constraints = &metrics.constraints;
    if constraints.primary_key.violations > 0 {
        lines.push("- deduplicate rows or revisit the primary key declaration.".to_string());
    }
    if constraints.foreign_key.violations > 0 {
        lines.push(
            "- load missing parent rows or add the child to the parent's exclusion list."
                .to_string(),
        );
    }
    if constraints.not_null.violations > 0 {
        lines.push("- fill required fields upstream or relax their nullability.".to_string());
    }
    if constraints.enum_domain.violations > 0 {
        lines.push("- map unexpected codes onto the declared domain.".to_string());
    }
    if constraints.field_type.violations > 0 {
        lines.push("- fix malformed cells; they never match a referenced key.".to_string());
    }
    if metrics.truncated {
        lines.push("- raise max_violations to retain the full defect list.".to_string());
    }
    if constraints.total_violations() == 0 {
        lines.push("- no violations detected; compare metrics across runs for drift.".to_string());
    }
    lines
}
