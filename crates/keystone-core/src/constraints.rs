use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::ResourceName;

/// Derived foreign-key relationship: `child.(child_fields) -> parent.(parent_fields)`.
///
/// Never authored; recomputed from declarations on every catalog build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyEdge {
    pub child: ResourceName,
    pub child_fields: Vec<String>,
    pub parent: ResourceName,
    pub parent_fields: Vec<String>,
}

impl ForeignKeyEdge {
    /// Physical constraint name, e.g. `fk_plants_ferc1_plant_id_pudl_plants_pudl`.
    pub fn constraint_name(&self) -> String {
        foreign_key_name(&self.child, &self.child_fields, &self.parent)
    }

    pub fn involves(&self, resource: &str) -> bool {
        self.child.as_str() == resource || self.parent.as_str() == resource
    }

    pub fn is_self_reference(&self) -> bool {
        self.child == self.parent
    }
}

impl fmt::Display for ForeignKeyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.({}) -> {}.({})",
            self.child,
            self.child_fields.join(", "),
            self.parent,
            self.parent_fields.join(", ")
        )
    }
}

/// Primary key definition preserving field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryKeyConstraint {
    pub name: String,
    pub resource: ResourceName,
    pub fields: Vec<String>,
}

/// Foreign key definition as handed to a physical-schema builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub resource: ResourceName,
    pub fields: Vec<String>,
    pub referenced_resource: ResourceName,
    pub referenced_fields: Vec<String>,
}

impl From<&ForeignKeyEdge> for ForeignKeyConstraint {
    fn from(edge: &ForeignKeyEdge) -> Self {
        Self {
            name: edge.constraint_name(),
            resource: edge.child.clone(),
            fields: edge.child_fields.clone(),
            referenced_resource: edge.parent.clone(),
            referenced_fields: edge.parent_fields.clone(),
        }
    }
}

/// Complete structural constraint set of a catalog release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintSet {
    pub primary_keys: Vec<PrimaryKeyConstraint>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
}

pub fn primary_key_name(resource: &ResourceName) -> String {
    format!("pk_{resource}")
}

pub fn foreign_key_name(child: &ResourceName, fields: &[String], parent: &ResourceName) -> String {
    format!("fk_{child}_{}_{parent}", fields.join("_"))
}
