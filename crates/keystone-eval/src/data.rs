use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use keystone_core::{Catalog, ResourceName};

use crate::errors::{EvalError, Result};
use crate::metrics::WarningItem;
use crate::value::{Value, parse_value};

/// Rows of one materialized resource.
///
/// `columns` holds the declared fields actually present in the data; a
/// declared field that was not materialized is simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData {
    pub resource: ResourceName,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    column_lookup: HashMap<String, usize>,
}

impl ResourceData {
    pub fn new<I, S>(resource: impl Into<ResourceName>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let column_lookup = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self {
            resource: resource.into(),
            columns,
            rows: Vec::new(),
            column_lookup,
        }
    }

    /// Append a row; short rows are padded with nulls.
    pub fn push_row<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut row: Vec<Value> = values.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn with_row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_row(values);
        self
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.column_lookup.get(column).copied()
    }

    /// Positions of `columns`, or the first column that is missing.
    pub fn column_indices<'c>(&self, columns: &'c [String]) -> std::result::Result<Vec<usize>, &'c str> {
        columns
            .iter()
            .map(|column| self.column_index(column).ok_or(column.as_str()))
            .collect()
    }

    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// Materialized subset of a catalog, keyed by resource name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    resources: BTreeMap<ResourceName, ResourceData>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: ResourceData) {
        self.resources.insert(data.resource.clone(), data);
    }

    pub fn with(mut self, data: ResourceData) -> Self {
        self.insert(data);
        self
    }

    pub fn get(&self, resource: &str) -> Option<&ResourceData> {
        self.resources.get(resource)
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    /// Materialized resources in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceData> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Load every `<resource>.csv` in `dir` that names a catalog resource.
    ///
    /// Cells are parsed by field type. Unparseable cells are kept as
    /// [`Value::Invalid`] for the validator to report; header mismatches are
    /// warnings. Neither aborts loading.
    pub fn load_dir(
        catalog: &Catalog,
        dir: &Path,
        warnings: &mut Vec<WarningItem>,
    ) -> Result<Self> {
        if !dir.is_dir() {
            return Err(EvalError::MissingDataDir(dir.to_path_buf()));
        }

        let mut dataset = Dataset::new();
        for name in catalog.resource_names() {
            let path = dir.join(format!("{name}.csv"));
            if !path.is_file() {
                continue;
            }
            let data = load_resource_csv(catalog, name, &path, warnings)?;
            tracing::debug!(
                event = "resource_loaded",
                resource = %name,
                rows = data.rows.len()
            );
            dataset.insert(data);
        }

        let mut stray = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if catalog.get_resource(stem).is_err() {
                stray.push(stem.to_string());
            }
        }
        stray.sort();
        for stem in stray {
            warnings.push(WarningItem {
                code: "unknown_resource".to_string(),
                path: stem.clone(),
                message: format!("{stem}.csv does not match any catalog resource"),
                hint: Some("remove the file or declare the resource".to_string()),
            });
        }

        Ok(dataset)
    }
}

fn load_resource_csv(
    catalog: &Catalog,
    name: &ResourceName,
    path: &Path,
    warnings: &mut Vec<WarningItem>,
) -> Result<ResourceData> {
    let csv_error = |source| EvalError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    let header_map = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (header.as_str(), idx))
        .collect::<HashMap<_, _>>();

    let fields = catalog.get_fields(name.as_str())?;
    let mut present = Vec::new();
    let mut missing = Vec::new();
    for field in &fields {
        match header_map.get(field.name.as_str()) {
            Some(position) => present.push((*field, *position)),
            None => missing.push(field.name.clone()),
        }
    }

    let declared: HashSet<&str> = fields.iter().map(|field| field.name.as_str()).collect();
    let extra: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|header| !declared.contains(header))
        .collect();

    if !missing.is_empty() {
        warnings.push(WarningItem {
            code: "missing_columns".to_string(),
            path: name.to_string(),
            message: format!("missing columns: {}", missing.join(", ")),
            hint: Some("checks on these columns are skipped".to_string()),
        });
    }
    if !extra.is_empty() {
        warnings.push(WarningItem {
            code: "extra_columns".to_string(),
            path: name.to_string(),
            message: format!("unexpected columns: {}", extra.join(", ")),
            hint: Some("remove extra columns or declare the fields".to_string()),
        });
    }

    let mut data = ResourceData::new(name.clone(), present.iter().map(|(field, _)| field.name.clone()));
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let mut row = Vec::with_capacity(present.len());
        for (field, position) in &present {
            let raw = record.get(*position).unwrap_or_default();
            match parse_value(field.field_type, raw) {
                Ok(value) => row.push(value),
                Err(message) => {
                    tracing::debug!(
                        event = "invalid_value",
                        resource = %name,
                        field = %field.name,
                        row = row_idx + 1,
                        message = %message
                    );
                    row.push(Value::Invalid(raw.trim().to_string()));
                }
            }
        }
        data.rows.push(row);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_are_padded() {
        let data = ResourceData::new("plants_pudl", ["plant_id_pudl", "plant_name_pudl"])
            .with_row([Value::Int(1)]);
        assert_eq!(data.rows[0], vec![Value::Int(1), Value::Null]);
    }

    #[test]
    fn reports_first_missing_column() {
        let data = ResourceData::new("plants_pudl", ["plant_id_pudl"]);
        let wanted = vec!["plant_id_pudl".to_string(), "report_year".to_string()];
        assert_eq!(data.column_indices(&wanted), Err("report_year"));
    }
}
