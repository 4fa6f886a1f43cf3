use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::thread;
use std::time::Instant;

use keystone_core::{
    CATALOG_FORMAT_VERSION, Catalog, ForeignKeyEdge, Resource, ResourceName, primary_key_name,
};

use crate::data::{Dataset, ResourceData};
use crate::errors::{EvalError, Result};
use crate::metrics::{
    ConstraintSummary, METRICS_VERSION, MetricsCatalogRef, MetricsReport, PerformanceMetrics,
    ResourceMetrics, WarningItem,
};
use crate::model::{ValidateOptions, Validation, ValidationRun, Violation, ViolationKind};
use crate::report::render_report;
use crate::value::{Value, tuple_key};

/// Checks materialized data against a catalog's keys and derived edges.
#[derive(Debug, Clone)]
pub struct ConstraintValidator<'c> {
    catalog: &'c Catalog,
    options: ValidateOptions,
}

impl<'c> ConstraintValidator<'c> {
    pub fn new(catalog: &'c Catalog, options: ValidateOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Validate an in-memory dataset.
    ///
    /// Every violation is collected; only the retention cap limits what is
    /// kept. The result is identical for any worker count.
    pub fn validate(&self, dataset: &Dataset) -> Result<Validation> {
        let mut warnings = Vec::new();
        let checked_edges = self.materialized_edges(dataset, &mut warnings);
        let parent_keys = collect_parent_keys(dataset, &checked_edges, &mut warnings);

        let mut tasks = Vec::with_capacity(dataset.len());
        for data in dataset.iter() {
            let Ok(resource) = self.catalog.get_resource(data.resource.as_str()) else {
                warnings.push(WarningItem {
                    code: "unknown_resource".to_string(),
                    path: data.resource.to_string(),
                    message: format!("{} is not a catalog resource", data.resource),
                    hint: Some("its rows were not checked".to_string()),
                });
                continue;
            };
            let edges = checked_edges
                .iter()
                .copied()
                .filter(|edge| edge.child == data.resource && parent_keys.contains_key(&edge.parent))
                .collect();
            tasks.push(ResourceTask {
                resource,
                data,
                edges,
            });
        }

        tracing::info!(
            event = "validation_started",
            resources = tasks.len(),
            edges = checked_edges.len(),
            workers = self.options.workers.max(1)
        );

        let outcomes = self.execute(&tasks, &parent_keys)?;

        let mut validation = Validation {
            warnings,
            ..Validation::default()
        };
        for outcome in outcomes {
            validation.violations.extend(outcome.violations);
            validation.warnings.extend(outcome.warnings);
            validation.summary.merge(&outcome.summary);
            for (kind, count) in outcome.by_kind {
                *validation.violations_by_kind.entry(kind).or_default() += count;
            }
            validation.truncated |= outcome.truncated;
        }

        sort_violations(&mut validation.violations);
        if let Some(cap) = self.options.max_violations {
            if validation.violations.len() > cap {
                validation.violations.truncate(cap);
                validation.truncated = true;
            }
        }
        sort_warnings(&mut validation.warnings);

        for warning in &validation.warnings {
            tracing::warn!(
                event = "validation_warning",
                code = %warning.code,
                path = %warning.path,
                message = %warning.message
            );
        }
        tracing::info!(
            event = "validation_finished",
            violations = validation.summary.total_violations(),
            retained = validation.violations.len(),
            truncated = validation.truncated
        );

        Ok(validation)
    }

    /// Load `<resource>.csv` files from `data_dir`, validate them, and write
    /// `metrics.json`, `report.md`, and optionally `violations.json` into
    /// `out_dir`.
    pub fn run(&self, data_dir: &Path, out_dir: &Path) -> Result<ValidationRun> {
        let total_start = Instant::now();
        let load_start = Instant::now();

        let mut load_warnings = Vec::new();
        let dataset = Dataset::load_dir(self.catalog, data_dir, &mut load_warnings)?;
        if dataset.is_empty() {
            load_warnings.push(WarningItem {
                code: "empty_dataset".to_string(),
                path: data_dir.display().to_string(),
                message: "no resource CSV files found".to_string(),
                hint: Some("name files <resource>.csv".to_string()),
            });
        }
        for warning in &load_warnings {
            tracing::warn!(
                event = "dataset_warning",
                code = %warning.code,
                path = %warning.path,
                message = %warning.message
            );
        }
        let load_ms = load_start.elapsed().as_millis();

        let validate_start = Instant::now();
        let mut validation = self.validate(&dataset)?;
        validation.warnings.extend(load_warnings);
        sort_warnings(&mut validation.warnings);
        let validate_ms = validate_start.elapsed().as_millis();

        let resources = dataset
            .iter()
            .map(|data| ResourceMetrics {
                resource: data.resource.to_string(),
                rows: data.row_count(),
                columns: data.columns.len() as u64,
            })
            .collect();

        let metrics = MetricsReport {
            metrics_version: METRICS_VERSION.to_string(),
            run_id: detect_run_id(out_dir).unwrap_or_else(|| "adhoc".to_string()),
            catalog: MetricsCatalogRef {
                format_version: CATALOG_FORMAT_VERSION.to_string(),
                resources: self.catalog.resource_names().count() as u64,
                edges: self.catalog.edges().len() as u64,
            },
            resources,
            constraints: validation.summary.clone(),
            violations_by_kind: validation.violations_by_kind.clone(),
            violations_retained: validation.violations.len() as u64,
            truncated: validation.truncated,
            warnings: validation.warnings.clone(),
            performance: PerformanceMetrics {
                load_ms,
                validate_ms,
                total_ms: total_start.elapsed().as_millis(),
            },
        };

        let report = render_report(&metrics, &validation.violations, self.options.max_examples);
        std::fs::create_dir_all(out_dir)?;

        let metrics_path = out_dir.join("metrics.json");
        std::fs::write(&metrics_path, serde_json::to_vec_pretty(&metrics)?)?;

        let report_path = out_dir.join("report.md");
        std::fs::write(&report_path, report.as_bytes())?;

        let violations_path = if self.options.write_violations {
            let path = out_dir.join("violations.json");
            std::fs::write(&path, serde_json::to_vec_pretty(&validation.violations)?)?;
            Some(path)
        } else {
            None
        };

        Ok(ValidationRun {
            out_dir: out_dir.to_path_buf(),
            metrics_path,
            report_path,
            violations_path,
            metrics,
            report,
            validation,
        })
    }

    /// Edges with both endpoints materialized. Edges touching the dataset
    /// with only one endpoint are reported and skipped.
    fn materialized_edges(
        &self,
        dataset: &Dataset,
        warnings: &mut Vec<WarningItem>,
    ) -> Vec<&'c ForeignKeyEdge> {
        let mut edges = Vec::new();
        for edge in self.catalog.edges() {
            let child = dataset.contains(edge.child.as_str());
            let parent = dataset.contains(edge.parent.as_str());
            match (child, parent) {
                (true, true) => edges.push(edge),
                (false, false) => {}
                (child_present, _) => {
                    let missing = if child_present {
                        &edge.parent
                    } else {
                        &edge.child
                    };
                    warnings.push(WarningItem {
                        code: "edge_not_materialized".to_string(),
                        path: edge.constraint_name(),
                        message: format!("{edge} skipped: {missing} is not materialized"),
                        hint: Some(format!("include {missing}.csv to check this edge")),
                    });
                }
            }
        }
        edges
    }

    fn execute(
        &self,
        tasks: &[ResourceTask<'_>],
        parent_keys: &ParentKeyIndex,
    ) -> Result<Vec<TaskOutcome>> {
        let workers = self.options.workers.clamp(1, tasks.len().max(1));
        if workers == 1 {
            return Ok(tasks
                .iter()
                .map(|task| self.check_resource(task, parent_keys))
                .collect());
        }

        let mut shards: Vec<Vec<&ResourceTask<'_>>> = vec![Vec::new(); workers];
        for (idx, task) in tasks.iter().enumerate() {
            shards[idx % workers].push(task);
        }

        thread::scope(|scope| {
            let handles: Vec<_> = shards
                .into_iter()
                .map(|shard| {
                    scope.spawn(move || {
                        shard
                            .into_iter()
                            .map(|task| self.check_resource(task, parent_keys))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(tasks.len());
            for handle in handles {
                let shard = handle.join().map_err(|_| EvalError::WorkerPanicked)?;
                outcomes.extend(shard);
            }
            Ok(outcomes)
        })
    }

    fn check_resource(
        &self,
        task: &ResourceTask<'_>,
        parent_keys: &ParentKeyIndex,
    ) -> TaskOutcome {
        let mut outcome = TaskOutcome::default();
        let data = task.data;
        let cap = self.options.max_violations;

        let key_indices = match task.resource.primary_key() {
            Some(key) => match data.column_indices(key) {
                Ok(indices) => Some(indices),
                Err(column) => {
                    outcome
                        .warnings
                        .push(missing_column(&data.resource, column, "primary key"));
                    None
                }
            },
            None => None,
        };
        let rows = RowKeys {
            data,
            key_indices: key_indices.as_deref(),
        };

        if let Some(indices) = key_indices.as_deref() {
            let mut sink = CheckSink::new(cap);
            check_primary_key(&rows, indices, &mut sink);
            outcome.summary.primary_key.checked += 1;
            outcome.summary.primary_key.violations += sink.found;
            outcome.absorb(sink);
        }

        for edge in &task.edges {
            let Some(parent) = parent_keys.get(&edge.parent) else {
                continue;
            };
            let indices = match data.column_indices(&edge.child_fields) {
                Ok(indices) => indices,
                Err(column) => {
                    outcome
                        .warnings
                        .push(missing_column(&data.resource, column, "foreign key"));
                    continue;
                }
            };
            let mut sink = CheckSink::new(cap);
            check_foreign_key(&rows, edge, &indices, parent, &mut sink);
            outcome.summary.foreign_key.checked += 1;
            outcome.summary.foreign_key.violations += sink.found;
            outcome.absorb(sink);
        }

        let mut extra = Vec::new();
        for (column_idx, column) in data.columns.iter().enumerate() {
            let field = match self.catalog.get_field(column) {
                Ok(field) if task.resource.has_field(column) => field,
                _ => {
                    extra.push(column.as_str());
                    continue;
                }
            };

            let mut sink = CheckSink::new(cap);
            check_field_type(&rows, column_idx, column, &mut sink);
            outcome.summary.field_type.checked += 1;
            outcome.summary.field_type.violations += sink.found;
            outcome.absorb(sink);

            if !field.nullable {
                let mut sink = CheckSink::new(cap);
                check_not_null(&rows, column_idx, column, &mut sink);
                outcome.summary.not_null.checked += 1;
                outcome.summary.not_null.violations += sink.found;
                outcome.absorb(sink);
            }

            if let Some(domain) = field.constraints.enum_values.as_deref() {
                let mut sink = CheckSink::new(cap);
                check_enum_domain(&rows, column_idx, column, domain, &mut sink);
                outcome.summary.enum_domain.checked += 1;
                outcome.summary.enum_domain.violations += sink.found;
                outcome.absorb(sink);
            }
        }

        if !extra.is_empty() {
            outcome.warnings.push(WarningItem {
                code: "extra_columns".to_string(),
                path: data.resource.to_string(),
                message: format!("unexpected columns: {}", extra.join(", ")),
                hint: Some("checks on these columns are skipped".to_string()),
            });
        }

        outcome
    }
}

type ParentKeyIndex = BTreeMap<ResourceName, HashSet<String>>;

struct ResourceTask<'a> {
    resource: &'a Resource,
    data: &'a ResourceData,
    edges: Vec<&'a ForeignKeyEdge>,
}

#[derive(Default)]
struct TaskOutcome {
    violations: Vec<Violation>,
    warnings: Vec<WarningItem>,
    summary: ConstraintSummary,
    by_kind: BTreeMap<ViolationKind, u64>,
    truncated: bool,
}

impl TaskOutcome {
    fn absorb(&mut self, sink: CheckSink) {
        self.violations.extend(sink.violations);
        for (kind, count) in sink.by_kind {
            *self.by_kind.entry(kind).or_default() += count;
        }
        self.truncated |= sink.truncated;
    }
}

/// Per-constraint collector: counts every violation, retains at most `cap`.
///
/// Checks visit rows in order, so the retained prefix is the first `cap`
/// offending rows of that constraint. The budget is not shared between
/// checks; the merged list is cut to `cap` afterwards.
struct CheckSink {
    cap: Option<usize>,
    violations: Vec<Violation>,
    by_kind: BTreeMap<ViolationKind, u64>,
    found: u64,
    truncated: bool,
}

impl CheckSink {
    fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            violations: Vec::new(),
            by_kind: BTreeMap::new(),
            found: 0,
            truncated: false,
        }
    }

    fn push(&mut self, kind: ViolationKind, build: impl FnOnce() -> Violation) {
        self.found += 1;
        *self.by_kind.entry(kind).or_default() += 1;
        if self.cap.is_some_and(|cap| self.violations.len() >= cap) {
            self.truncated = true;
            return;
        }
        self.violations.push(build());
    }
}

/// Row access plus primary-key rendering for violation records.
struct RowKeys<'a> {
    data: &'a ResourceData,
    key_indices: Option<&'a [usize]>,
}

impl RowKeys<'_> {
    fn resource(&self) -> &ResourceName {
        &self.data.resource
    }

    fn row_key(&self, row: &[Value]) -> Vec<String> {
        self.key_indices
            .map(|indices| indices.iter().map(|idx| row[*idx].key()).collect())
            .unwrap_or_default()
    }

    fn violation(
        &self,
        kind: ViolationKind,
        constraint: String,
        row_idx: usize,
        related_row: Option<u64>,
        message: String,
    ) -> Violation {
        Violation {
            resource: self.resource().clone(),
            kind,
            constraint,
            row_index: row_idx as u64 + 1,
            row_key: self.row_key(&self.data.rows[row_idx]),
            related_row,
            message,
        }
    }
}

fn check_primary_key(rows: &RowKeys<'_>, indices: &[usize], sink: &mut CheckSink) {
    let constraint = primary_key_name(rows.resource());
    let mut seen: HashMap<String, u64> = HashMap::new();

    for (row_idx, row) in rows.data.rows.iter().enumerate() {
        let values = indices.iter().map(|idx| &row[*idx]).collect::<Vec<_>>();
        if values.iter().any(|value| value.is_null()) {
            sink.push(ViolationKind::PrimaryKeyNull, || {
                rows.violation(
                    ViolationKind::PrimaryKeyNull,
                    constraint.clone(),
                    row_idx,
                    None,
                    format!("null component in primary key ({})", tuple_key(&values)),
                )
            });
            continue;
        }

        let key = tuple_key(&values);
        match seen.get(&key) {
            Some(first) => {
                let first = *first;
                sink.push(ViolationKind::PrimaryKeyDuplicate, || {
                    rows.violation(
                        ViolationKind::PrimaryKeyDuplicate,
                        constraint.clone(),
                        row_idx,
                        Some(first),
                        format!("duplicate primary key ({key}) first seen at row {first}"),
                    )
                });
            }
            None => {
                seen.insert(key, row_idx as u64 + 1);
            }
        }
    }
}

fn check_foreign_key(
    rows: &RowKeys<'_>,
    edge: &ForeignKeyEdge,
    indices: &[usize],
    parent_keys: &HashSet<String>,
    sink: &mut CheckSink,
) {
    let constraint = edge.constraint_name();

    for (row_idx, row) in rows.data.rows.iter().enumerate() {
        let values = indices.iter().map(|idx| &row[*idx]).collect::<Vec<_>>();
        let nulls = values.iter().filter(|value| value.is_null()).count();
        if nulls == values.len() {
            continue;
        }

        let key = tuple_key(&values);
        if nulls > 0 {
            sink.push(ViolationKind::ForeignKeyPartialNull, || {
                rows.violation(
                    ViolationKind::ForeignKeyPartialNull,
                    constraint.clone(),
                    row_idx,
                    None,
                    format!(
                        "partially null reference ({key}) in ({})",
                        edge.child_fields.join(", ")
                    ),
                )
            });
        } else if !parent_keys.contains(&key) {
            sink.push(ViolationKind::ForeignKeyUnresolved, || {
                rows.violation(
                    ViolationKind::ForeignKeyUnresolved,
                    constraint.clone(),
                    row_idx,
                    None,
                    format!(
                        "({key}) not found in {}.({})",
                        edge.parent,
                        edge.parent_fields.join(", ")
                    ),
                )
            });
        }
    }
}

fn check_not_null(rows: &RowKeys<'_>, column_idx: usize, column: &str, sink: &mut CheckSink) {
    let constraint = format!("nn_{}_{column}", rows.resource());
    for (row_idx, row) in rows.data.rows.iter().enumerate() {
        if row[column_idx].is_null() {
            sink.push(ViolationKind::NotNull, || {
                rows.violation(
                    ViolationKind::NotNull,
                    constraint.clone(),
                    row_idx,
                    None,
                    format!("null value in non-nullable field {column}"),
                )
            });
        }
    }
}

fn check_field_type(rows: &RowKeys<'_>, column_idx: usize, column: &str, sink: &mut CheckSink) {
    let constraint = format!("type_{}_{column}", rows.resource());
    for (row_idx, row) in rows.data.rows.iter().enumerate() {
        if let Value::Invalid(raw) = &row[column_idx] {
            sink.push(ViolationKind::InvalidValue, || {
                rows.violation(
                    ViolationKind::InvalidValue,
                    constraint.clone(),
                    row_idx,
                    None,
                    format!("'{raw}' does not parse as the type of {column}"),
                )
            });
        }
    }
}

fn check_enum_domain(
    rows: &RowKeys<'_>,
    column_idx: usize,
    column: &str,
    domain: &[String],
    sink: &mut CheckSink,
) {
    let constraint = format!("enum_{}_{column}", rows.resource());
    for (row_idx, row) in rows.data.rows.iter().enumerate() {
        let value = &row[column_idx];
        if value.is_null() || value.is_invalid() {
            continue;
        }
        let text = value.key();
        if !domain.iter().any(|allowed| *allowed == text) {
            sink.push(ViolationKind::EnumDomain, || {
                rows.violation(
                    ViolationKind::EnumDomain,
                    constraint.clone(),
                    row_idx,
                    None,
                    format!("value '{text}' is outside the domain of {column}"),
                )
            });
        }
    }
}

/// Primary-key tuples of every parent referenced by a checked edge.
/// Rows with a null or unparseable key component are skipped, so they
/// satisfy no reference.
fn collect_parent_keys(
    dataset: &Dataset,
    edges: &[&ForeignKeyEdge],
    warnings: &mut Vec<WarningItem>,
) -> ParentKeyIndex {
    let mut index = ParentKeyIndex::new();
    let mut unusable = HashSet::new();

    for edge in edges {
        if index.contains_key(&edge.parent) || unusable.contains(&edge.parent) {
            continue;
        }
        let Some(parent) = dataset.get(edge.parent.as_str()) else {
            continue;
        };
        let indices = match parent.column_indices(&edge.parent_fields) {
            Ok(indices) => indices,
            Err(column) => {
                warnings.push(missing_column(&edge.parent, column, "referenced key"));
                unusable.insert(edge.parent.clone());
                continue;
            }
        };

        let keys = parent
            .rows
            .iter()
            .filter_map(|row| {
                let values = indices.iter().map(|idx| &row[*idx]).collect::<Vec<_>>();
                if values.iter().any(|value| value.is_null() || value.is_invalid()) {
                    None
                } else {
                    Some(tuple_key(&values))
                }
            })
            .collect();
        index.insert(edge.parent.clone(), keys);
    }

    index
}

fn missing_column(resource: &ResourceName, column: &str, role: &str) -> WarningItem {
    WarningItem {
        code: "missing_column".to_string(),
        path: format!("{resource}.{column}"),
        message: format!("{role} column missing in dataset"),
        hint: Some("checks using this column were skipped".to_string()),
    }
}

fn detect_run_id(out_dir: &Path) -> Option<String> {
    let name = out_dir.file_name()?.to_string_lossy();
    name.split_once("__run_")
        .map(|(_, run_part)| run_part.to_string())
}

fn sort_warnings(warnings: &mut [WarningItem]) {
    warnings.sort_by(|a, b| (&a.path, &a.code, &a.message).cmp(&(&b.path, &b.code, &b.message)));
}

fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use keystone_core::{Field, FieldRegistry, FieldType, ForeignKeyRule};

    use super::*;

    fn catalog() -> Catalog {
        let fields = FieldRegistry::new([
            Field::new("plant_id_pudl", FieldType::Integer).not_null(),
            Field::new("report_year", FieldType::Year),
            Field::new("capacity_mw", FieldType::Number),
        ])
        .expect("field registry");
        let resources = vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(ForeignKeyRule::new([["plant_id_pudl"]])),
            Resource::new(
                "plants_yearly",
                ["plant_id_pudl", "report_year", "capacity_mw"],
            )
            .with_primary_key(["plant_id_pudl", "report_year"]),
        ];
        Catalog::build(fields, resources)
            .expect("build catalog")
            .catalog
    }

    #[test]
    fn sink_counts_beyond_cap() {
        let mut sink = CheckSink::new(Some(1));
        let make = || Violation {
            resource: ResourceName::from("plants_pudl"),
            kind: ViolationKind::NotNull,
            constraint: "nn_plants_pudl_plant_id_pudl".to_string(),
            row_index: 1,
            row_key: Vec::new(),
            related_row: None,
            message: String::new(),
        };
        sink.push(ViolationKind::NotNull, make);
        sink.push(ViolationKind::NotNull, make);
        assert_eq!(sink.found, 2);
        assert_eq!(sink.violations.len(), 1);
        assert!(sink.truncated);
    }

    #[test]
    fn orphaned_child_row_is_unresolved() {
        let catalog = catalog();
        let dataset = Dataset::new()
            .with(ResourceData::new("plants_pudl", ["plant_id_pudl"]).with_row([Value::Int(1)]))
            .with(
                ResourceData::new("plants_yearly", ["plant_id_pudl", "report_year"])
                    .with_row([Value::Int(1), Value::Int(2020)])
                    .with_row([Value::Int(7), Value::Int(2020)]),
            );

        let validation = ConstraintValidator::new(&catalog, ValidateOptions::default())
            .validate(&dataset)
            .expect("validate");

        assert_eq!(validation.violations.len(), 1);
        let violation = &validation.violations[0];
        assert_eq!(violation.kind, ViolationKind::ForeignKeyUnresolved);
        assert_eq!(
            violation.constraint,
            "fk_plants_yearly_plant_id_pudl_plants_pudl"
        );
        assert_eq!(violation.row_index, 2);
        assert_eq!(violation.row_key, vec!["7", "2020"]);
        assert_eq!(validation.summary.foreign_key.checked, 1);
        assert_eq!(validation.summary.primary_key.checked, 2);
    }

    #[test]
    fn malformed_parent_key_satisfies_nothing() {
        let catalog = catalog();
        let garbage = || Value::Invalid("x1".to_string());
        let dataset = Dataset::new()
            .with(ResourceData::new("plants_pudl", ["plant_id_pudl"]).with_row([garbage()]))
            .with(
                ResourceData::new("plants_yearly", ["plant_id_pudl", "report_year"])
                    .with_row([garbage(), Value::Int(2020)]),
            );

        let validation = ConstraintValidator::new(&catalog, ValidateOptions::default())
            .validate(&dataset)
            .expect("validate");

        let kinds: Vec<_> = validation
            .violations
            .iter()
            .map(|violation| (violation.constraint.as_str(), violation.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("type_plants_pudl_plant_id_pudl", ViolationKind::InvalidValue),
                (
                    "fk_plants_yearly_plant_id_pudl_plants_pudl",
                    ViolationKind::ForeignKeyUnresolved
                ),
                ("type_plants_yearly_plant_id_pudl", ViolationKind::InvalidValue),
            ]
        );
        assert_eq!(validation.summary.field_type.checked, 3);
    }

    #[test]
    fn unmaterialized_parent_is_a_warning() {
        let catalog = catalog();
        let dataset = Dataset::new().with(
            ResourceData::new("plants_yearly", ["plant_id_pudl", "report_year"])
                .with_row([Value::Int(7), Value::Int(2020)]),
        );

        let validation = ConstraintValidator::new(&catalog, ValidateOptions::default())
            .validate(&dataset)
            .expect("validate");

        assert!(validation.violations.is_empty());
        assert_eq!(validation.warnings.len(), 1);
        assert_eq!(validation.warnings[0].code, "edge_not_materialized");
        assert_eq!(validation.summary.foreign_key.checked, 0);
    }

    #[test]
    fn run_id_from_directory_name() {
        assert_eq!(
            detect_run_id(Path::new("runs/2024-01-01T00-00-00Z__run_abc")),
            Some("abc".to_string())
        );
        assert_eq!(detect_run_id(Path::new("out")), None);
    }
}
