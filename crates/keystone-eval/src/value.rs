use chrono::{NaiveDate, NaiveDateTime};
use keystone_core::FieldType;
use serde::{Deserialize, Serialize};

/// One materialized cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Cell text that did not parse as its field's type, kept verbatim.
    Invalid(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid(_))
    }

    /// Canonical textual form used for key comparison and enum checks.
    pub fn key(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => value.clone(),
            Value::Date(value) => value.format("%Y-%m-%d").to_string(),
            Value::DateTime(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Invalid(raw) => raw.clone(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parse a CSV cell according to the field's semantic type.
///
/// Empty cells and `null` (any case) are nulls.
pub fn parse_value(field_type: FieldType, raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }

    match field_type {
        FieldType::Integer | FieldType::Year => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("invalid {field_type} '{trimmed}'")),
        FieldType::Number => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("invalid number '{trimmed}'")),
        FieldType::Boolean => parse_bool(trimmed)
            .map(Value::Bool)
            .ok_or_else(|| format!("invalid boolean '{trimmed}'")),
        FieldType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| format!("invalid date '{trimmed}'")),
        FieldType::Datetime => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
            .map(Value::DateTime)
            .map_err(|_| format!("invalid datetime '{trimmed}'")),
        FieldType::String => Ok(Value::Text(trimmed.to_string())),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Join values into a single comparable key; `|` and `\` are escaped.
pub fn tuple_key(values: &[&Value]) -> String {
    values
        .iter()
        .map(|value| escape_key_component(&value.key()))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_key_component(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}
