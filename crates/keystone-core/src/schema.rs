use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Catalog-unique resource identifier.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Parent-side declaration of which child field groups may reference this
/// resource's primary key.
///
/// Each group maps positionally onto the primary key, so `["utility_id_ferc1",
/// "plant_name_original"]` may reference a key named
/// `["utility_id_ferc1", "plant_name_ferc1"]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeyRule {
    pub fields: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude: BTreeSet<ResourceName>,
}

impl ForeignKeyRule {
    pub fn new<G, F>(groups: G) -> Self
    where
        G: IntoIterator<Item = F>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            fields: groups
                .into_iter()
                .map(|group| group.into_iter().map(Into::into).collect())
                .collect(),
            exclude: BTreeSet::new(),
        }
    }

    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ResourceName>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Structural part of a resource declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ResourceSchema {
    /// Ordered field names; each must exist in the field registry.
    pub fields: Vec<String>,
    /// Ordered subset of `fields`; order is constraint column order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key_rules: Option<ForeignKeyRule>,
}

/// One logical table in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Resource {
    pub name: ResourceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: ResourceSchema,
    /// Upstream reporting sources (e.g. `eia860`, `ferc1`).
    #[serde(default)]
    pub sources: BTreeSet<String>,
    /// ETL phase that produces the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etl_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_namespace: Option<String>,
}

impl Resource {
    pub fn new<I, S>(name: impl Into<ResourceName>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            title: None,
            description: None,
            schema: ResourceSchema {
                fields: fields.into_iter().map(Into::into).collect(),
                primary_key: None,
                foreign_key_rules: None,
            },
            sources: BTreeSet::new(),
            etl_group: None,
            field_namespace: None,
        }
    }

    pub fn with_primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.primary_key = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rule(mut self, rule: ForeignKeyRule) -> Self {
        self.schema.foreign_key_rules = Some(rule);
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn with_etl_group(mut self, group: impl Into<String>) -> Self {
        self.etl_group = Some(group.into());
        self
    }

    pub fn primary_key(&self) -> Option<&[String]> {
        self.schema.primary_key.as_deref()
    }

    pub fn foreign_key_rules(&self) -> Option<&ForeignKeyRule> {
        self.schema.foreign_key_rules.as_ref()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.schema.fields.iter().any(|field| field == name)
    }

    /// True when every name in `group` is one of this resource's fields.
    pub fn has_fields(&self, group: &[String]) -> bool {
        group.iter().all(|field| self.has_field(field))
    }
}
