use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Semantic type of a catalog field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Number,
    String,
    Boolean,
    Date,
    Datetime,
    Year,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Year => "year",
        };
        f.write_str(name)
    }
}

/// Value-domain restrictions attached to a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldConstraints {
    /// Allowed values, compared against the textual form of each cell.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl FieldConstraints {
    /// Returns true when `value` is inside the declared domain (or no domain is declared).
    pub fn allows(&self, value: &str) -> bool {
        match &self.enum_values {
            Some(values) => values.iter().any(|allowed| allowed == value),
            None => true,
        }
    }
}
