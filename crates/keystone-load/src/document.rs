use std::collections::{BTreeMap, BTreeSet};

use keystone_core::{Field, FieldConstraints, FieldType, Resource, ResourceName, ResourceSchema};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_nullable() -> bool {
    true
}

/// One declaration document: the fields and resources of a dataset family.
///
/// Names are the map keys; resources from several documents are merged into
/// one store at catalog-build time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeclarationDocument {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDecl>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDecl>,
}

/// Field definition as authored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub constraints: FieldConstraints,
}

/// Resource definition as authored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ResourceDecl {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub schema: ResourceSchema,
    #[serde(default)]
    pub sources: BTreeSet<String>,
    #[serde(default)]
    pub etl_group: Option<String>,
    #[serde(default)]
    pub field_namespace: Option<String>,
}

impl FieldDecl {
    pub fn into_field(self, name: String) -> Field {
        Field {
            name,
            field_type: self.field_type,
            description: self.description,
            nullable: self.nullable,
            constraints: self.constraints,
        }
    }
}

impl ResourceDecl {
    pub fn into_resource(self, name: String) -> Resource {
        Resource {
            name: ResourceName::new(name),
            title: self.title,
            description: self.description,
            schema: self.schema,
            sources: self.sources,
            etl_group: self.etl_group,
            field_namespace: self.field_namespace,
        }
    }
}
