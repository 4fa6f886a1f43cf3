use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, DeclarationError, Result};
use crate::types::{FieldConstraints, FieldType};

fn default_nullable() -> bool {
    true
}

/// Canonical definition of a field usable by any resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub constraints: FieldConstraints,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            nullable: true,
            constraints: FieldConstraints::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Name-indexed set of field definitions for one catalog release.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: BTreeMap<String, Field>,
}

impl FieldRegistry {
    /// Build a registry, rejecting duplicate field names.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for field in fields {
            if map.contains_key(&field.name) {
                return Err(DeclarationError::DuplicateField(field.name).into());
            }
            map.insert(field.name.clone(), field);
        }
        Ok(Self { fields: map })
    }

    pub fn get(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| CatalogError::field_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
