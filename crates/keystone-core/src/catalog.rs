use std::collections::BTreeMap;

use serde::Serialize;

use crate::constraints::{
    ConstraintSet, ForeignKeyConstraint, ForeignKeyEdge, PrimaryKeyConstraint, primary_key_name,
};
use crate::derive::derive_foreign_keys;
use crate::error::{CatalogError, CatalogWarning, Result};
use crate::fields::{Field, FieldRegistry};
use crate::graph::{DependencyReport, build_dependency_report};
use crate::schema::{Resource, ResourceName};
use crate::validation::{index_resources, resolve_exclusions, validate_declarations};

/// Filter for [`Catalog::list_resources`]. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub source: Option<String>,
    pub group: Option<String>,
}

impl ResourceFilter {
    pub fn by_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            group: None,
        }
    }

    pub fn by_group(group: impl Into<String>) -> Self {
        Self {
            source: None,
            group: Some(group.into()),
        }
    }

    fn matches(&self, resource: &Resource) -> bool {
        let source_ok = self
            .source
            .as_ref()
            .is_none_or(|source| resource.sources.contains(source));
        let group_ok = self
            .group
            .as_ref()
            .is_none_or(|group| resource.etl_group.as_ref() == Some(group));
        source_ok && group_ok
    }
}

/// Edges touching one resource, split by the role it plays.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceEdges<'a> {
    pub as_parent: Vec<&'a ForeignKeyEdge>,
    pub as_child: Vec<&'a ForeignKeyEdge>,
}

/// Immutable catalog for one release: declarations plus derived edges.
#[derive(Debug, Clone)]
pub struct Catalog {
    fields: FieldRegistry,
    resources: BTreeMap<ResourceName, Resource>,
    edges: Vec<ForeignKeyEdge>,
}

/// Result of a catalog build.
#[derive(Debug, Clone)]
pub struct BuiltCatalog {
    pub catalog: Catalog,
    pub warnings: Vec<CatalogWarning>,
}

impl Catalog {
    /// Validate declarations, resolve exclusions, and derive the FK edge set.
    pub fn build(fields: FieldRegistry, resources: Vec<Resource>) -> Result<BuiltCatalog> {
        let mut resources = index_resources(resources)?;
        validate_declarations(&fields, &resources)?;
        let warnings = resolve_exclusions(&mut resources);
        let edges = derive_foreign_keys(&fields, &resources)?;

        tracing::info!(
            event = "catalog_built",
            fields = fields.len(),
            resources = resources.len(),
            edges = edges.len(),
            warnings = warnings.len()
        );

        Ok(BuiltCatalog {
            catalog: Catalog {
                fields,
                resources,
                edges,
            },
            warnings,
        })
    }

    pub fn get_resource(&self, name: &str) -> Result<&Resource> {
        self.resources
            .get(name)
            .ok_or_else(|| CatalogError::resource_not_found(name))
    }

    /// Resources matching `filter`, in name order.
    pub fn list_resources(&self, filter: &ResourceFilter) -> Vec<&Resource> {
        self.resources
            .values()
            .filter(|resource| filter.matches(resource))
            .collect()
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &ResourceName> {
        self.resources.keys()
    }

    pub fn edges_for(&self, name: &str) -> Result<ResourceEdges<'_>> {
        self.get_resource(name)?;
        Ok(ResourceEdges {
            as_parent: self
                .edges
                .iter()
                .filter(|edge| edge.parent.as_str() == name)
                .collect(),
            as_child: self
                .edges
                .iter()
                .filter(|edge| edge.child.as_str() == name)
                .collect(),
        })
    }

    /// Field definitions of a resource in declaration order.
    pub fn get_fields(&self, name: &str) -> Result<Vec<&Field>> {
        let resource = self.get_resource(name)?;
        resource
            .schema
            .fields
            .iter()
            .map(|field| self.fields.get(field))
            .collect()
    }

    pub fn get_field(&self, name: &str) -> Result<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    /// All derived edges in canonical order.
    pub fn edges(&self) -> &[ForeignKeyEdge] {
        &self.edges
    }

    /// Named primary and foreign keys for a physical-schema builder.
    pub fn constraint_set(&self) -> ConstraintSet {
        let primary_keys = self
            .resources
            .values()
            .filter_map(|resource| {
                resource.primary_key().map(|key| PrimaryKeyConstraint {
                    name: primary_key_name(&resource.name),
                    resource: resource.name.clone(),
                    fields: key.to_vec(),
                })
            })
            .collect();
        let foreign_keys = self.edges.iter().map(ForeignKeyConstraint::from).collect();

        ConstraintSet {
            primary_keys,
            foreign_keys,
        }
    }

    pub fn dependency_report(&self) -> DependencyReport {
        build_dependency_report(self.resources.keys(), &self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeclarationError, ObjectKind};
    use crate::schema::ForeignKeyRule;
    use crate::types::FieldType;

    fn build() -> BuiltCatalog {
        let fields = FieldRegistry::new(vec![
            Field::new("plant_id_pudl", FieldType::Integer).not_null(),
            Field::new("plant_name_pudl", FieldType::String),
            Field::new("plant_id_eia", FieldType::Integer),
            Field::new("utility_id_ferc1", FieldType::Integer),
            Field::new("plant_name_ferc1", FieldType::String),
        ])
        .unwrap();

        let resources = vec![
            Resource::new("plants_pudl", ["plant_id_pudl", "plant_name_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(
                    ForeignKeyRule::new([["plant_id_pudl"]]).excluding(["plants_eia", "plants_gone"]),
                )
                .with_etl_group("glue"),
            Resource::new("plants_ferc1", ["utility_id_ferc1", "plant_name_ferc1", "plant_id_pudl"])
                .with_primary_key(["utility_id_ferc1", "plant_name_ferc1"])
                .with_sources(["ferc1"])
                .with_etl_group("glue"),
            Resource::new("plants_eia", ["plant_id_eia", "plant_id_pudl"])
                .with_primary_key(["plant_id_eia"])
                .with_sources(["eia860", "eia923"])
                .with_etl_group("glue"),
        ];

        Catalog::build(fields, resources).unwrap()
    }

    #[test]
    fn build_reports_unknown_exclusions() {
        let built = build();
        assert_eq!(built.warnings.len(), 1);
        assert_eq!(
            built.warnings[0].to_string(),
            "foreign key rule on 'plants_pudl' excludes unknown resource 'plants_gone'"
        );
        assert_eq!(built.catalog.edges().len(), 1);
        assert_eq!(
            built.catalog.edges()[0].to_string(),
            "plants_ferc1.(plant_id_pudl) -> plants_pudl.(plant_id_pudl)"
        );
    }

    #[test]
    fn lookups_fail_with_not_found() {
        let catalog = build().catalog;
        assert!(matches!(
            catalog.get_resource("plants_nope"),
            Err(CatalogError::NotFound {
                kind: ObjectKind::Resource,
                ..
            })
        ));
        assert!(catalog.edges_for("plants_nope").is_err());
        assert!(catalog.get_fields("plants_nope").is_err());
        assert!(matches!(
            catalog.get_field("plant_id_ferc"),
            Err(CatalogError::NotFound {
                kind: ObjectKind::Field,
                ..
            })
        ));
    }

    #[test]
    fn list_filters_by_source_and_group() {
        let catalog = build().catalog;
        let eia: Vec<_> = catalog
            .list_resources(&ResourceFilter::by_source("eia923"))
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(eia, vec!["plants_eia"]);

        assert_eq!(catalog.list_resources(&ResourceFilter::by_group("glue")).len(), 3);
        assert!(catalog.list_resources(&ResourceFilter::by_group("outputs")).is_empty());
        assert!(catalog.list_resources(&ResourceFilter::by_source("epacems")).is_empty());
    }

    #[test]
    fn edges_for_splits_roles() {
        let catalog = build().catalog;
        let parent = catalog.edges_for("plants_pudl").unwrap();
        assert_eq!(parent.as_parent.len(), 1);
        assert!(parent.as_child.is_empty());

        let child = catalog.edges_for("plants_ferc1").unwrap();
        assert!(child.as_parent.is_empty());
        assert_eq!(child.as_child.len(), 1);

        let excluded = catalog.edges_for("plants_eia").unwrap();
        assert!(excluded.as_parent.is_empty() && excluded.as_child.is_empty());
    }

    #[test]
    fn fields_resolve_in_declaration_order() {
        let catalog = build().catalog;
        let names: Vec<_> = catalog
            .get_fields("plants_ferc1")
            .unwrap()
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["utility_id_ferc1", "plant_name_ferc1", "plant_id_pudl"]);
    }

    #[test]
    fn constraint_set_names_keys() {
        let set = build().catalog.constraint_set();
        let pk_names: Vec<_> = set.primary_keys.iter().map(|pk| pk.name.as_str()).collect();
        assert_eq!(pk_names, vec!["pk_plants_eia", "pk_plants_ferc1", "pk_plants_pudl"]);
        assert_eq!(set.foreign_keys.len(), 1);
        assert_eq!(
            set.foreign_keys[0].name,
            "fk_plants_ferc1_plant_id_pudl_plants_pudl"
        );
    }

    #[test]
    fn duplicate_resources_abort_build() {
        let fields = FieldRegistry::new(vec![Field::new("plant_id_pudl", FieldType::Integer)]).unwrap();
        let err = Catalog::build(
            fields,
            vec![
                Resource::new("plants_pudl", ["plant_id_pudl"]),
                Resource::new("plants_pudl", ["plant_id_pudl"]),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::DuplicateResource(_))
        ));
    }
}
