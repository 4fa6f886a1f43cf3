use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::ForeignKeyEdge;
use crate::error::{DeclarationError, Result};
use crate::fields::FieldRegistry;
use crate::schema::{Resource, ResourceName};

/// Derive every foreign-key edge implied by the declaration set.
///
/// Parents are visited in name order and each parent's edges are computed
/// independently; the merged set is sorted by `(parent, child, child_fields)`
/// so repeated runs produce identical output. Any malformed primary key or
/// field group fails the whole derivation.
pub fn derive_foreign_keys(
    fields: &FieldRegistry,
    resources: &BTreeMap<ResourceName, Resource>,
) -> Result<Vec<ForeignKeyEdge>> {
    let mut edges = Vec::new();
    for parent in resources.values() {
        edges.extend(derive_for_parent(fields, parent, resources)?);
    }
    sort_edges(&mut edges);

    tracing::debug!(
        event = "foreign_keys_derived",
        resources = resources.len(),
        edges = edges.len()
    );
    Ok(edges)
}

/// Edges whose parent is `parent`, in child-name order.
pub fn derive_for_parent(
    fields: &FieldRegistry,
    parent: &Resource,
    resources: &BTreeMap<ResourceName, Resource>,
) -> Result<Vec<ForeignKeyEdge>> {
    let Some(key) = parent.primary_key() else {
        return Ok(Vec::new());
    };
    check_primary_key(parent, key)?;

    let Some(rule) = parent.foreign_key_rules() else {
        return Ok(Vec::new());
    };

    let mut seen = BTreeSet::new();
    for group in &rule.fields {
        check_field_group(fields, parent, key, group)?;
        if !seen.insert(group.as_slice()) {
            return Err(DeclarationError::DuplicateFieldGroup {
                resource: parent.name.to_string(),
                group: group.join(", "),
            }
            .into());
        }
    }

    let mut edges = Vec::new();
    for group in &rule.fields {
        for child in resources.values() {
            if rule.exclude.contains(&child.name) {
                tracing::trace!(
                    event = "edge_excluded",
                    parent = %parent.name,
                    child = %child.name
                );
                continue;
            }
            // A resource trivially references its own key.
            if child.name == parent.name && group.as_slice() == key {
                continue;
            }
            if !child.has_fields(group) {
                continue;
            }
            edges.push(ForeignKeyEdge {
                child: child.name.clone(),
                child_fields: group.clone(),
                parent: parent.name.clone(),
                parent_fields: key.to_vec(),
            });
        }
    }

    edges.sort_by(|a, b| (&a.child, &a.child_fields).cmp(&(&b.child, &b.child_fields)));
    Ok(edges)
}

/// Sort edges into canonical `(parent, child, child_fields)` order.
pub fn sort_edges(edges: &mut [ForeignKeyEdge]) {
    edges.sort_by(|a, b| {
        (&a.parent, &a.child, &a.child_fields).cmp(&(&b.parent, &b.child, &b.child_fields))
    });
}

fn check_primary_key(resource: &Resource, key: &[String]) -> Result<()> {
    if key.is_empty() {
        return Err(DeclarationError::EmptyPrimaryKey {
            resource: resource.name.to_string(),
        }
        .into());
    }

    let mut seen = BTreeSet::new();
    for field in key {
        if !resource.has_field(field) {
            return Err(DeclarationError::UnknownPrimaryKeyField {
                resource: resource.name.to_string(),
                field: field.clone(),
            }
            .into());
        }
        if !seen.insert(field.as_str()) {
            return Err(DeclarationError::RepeatedPrimaryKeyField {
                resource: resource.name.to_string(),
                field: field.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_field_group(
    fields: &FieldRegistry,
    parent: &Resource,
    key: &[String],
    group: &[String],
) -> Result<()> {
    if group.is_empty() {
        return Err(DeclarationError::EmptyFieldGroup {
            resource: parent.name.to_string(),
        }
        .into());
    }
    if group.len() != key.len() {
        return Err(DeclarationError::FieldGroupLength {
            resource: parent.name.to_string(),
            group: group.join(", "),
            expected: key.len(),
            found: group.len(),
        }
        .into());
    }
    for field in group {
        if !fields.contains(field) {
            return Err(DeclarationError::UnknownField {
                resource: parent.name.to_string(),
                field: field.clone(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::fields::Field;
    use crate::schema::ForeignKeyRule;
    use crate::types::FieldType;
    use crate::validation::index_resources;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(
            [
                "plant_id_pudl",
                "plant_id_eia",
                "plant_name_eia",
                "utility_id_ferc1",
                "plant_name_ferc1",
                "plant_name_original",
                "report_year",
                "parent_plant_id_pudl",
            ]
            .into_iter()
            .map(|name| Field::new(name, FieldType::String)),
        )
        .unwrap()
    }

    fn plants_catalog(exclude: &[&str]) -> BTreeMap<ResourceName, Resource> {
        index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(
                    ForeignKeyRule::new([["plant_id_pudl"]]).excluding(exclude.iter().copied()),
                ),
            Resource::new("plants_ferc1", ["utility_id_ferc1", "plant_name_ferc1", "plant_id_pudl"])
                .with_primary_key(["utility_id_ferc1", "plant_name_ferc1"]),
            Resource::new("plants_eia", ["plant_id_eia", "plant_name_eia", "plant_id_pudl"])
                .with_primary_key(["plant_id_eia"]),
        ])
        .unwrap()
    }

    fn edge(child: &str, child_fields: &[&str], parent: &str, parent_fields: &[&str]) -> ForeignKeyEdge {
        ForeignKeyEdge {
            child: child.into(),
            child_fields: child_fields.iter().map(|f| f.to_string()).collect(),
            parent: parent.into(),
            parent_fields: parent_fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn derives_edges_to_parent_key() {
        let edges = derive_foreign_keys(&registry(), &plants_catalog(&[])).unwrap();
        assert_eq!(
            edges,
            vec![
                edge("plants_eia", &["plant_id_pudl"], "plants_pudl", &["plant_id_pudl"]),
                edge("plants_ferc1", &["plant_id_pudl"], "plants_pudl", &["plant_id_pudl"]),
            ]
        );
    }

    #[test]
    fn excluded_child_receives_no_edge() {
        let edges = derive_foreign_keys(&registry(), &plants_catalog(&["plants_eia"])).unwrap();
        assert_eq!(
            edges,
            vec![edge("plants_ferc1", &["plant_id_pudl"], "plants_pudl", &["plant_id_pudl"])]
        );
        assert!(!edges.iter().any(|e| e.child.as_str() == "plants_eia"));
    }

    #[test]
    fn derivation_is_deterministic() {
        let catalog = plants_catalog(&[]);
        let first = derive_foreign_keys(&registry(), &catalog).unwrap();
        let second = derive_foreign_keys(&registry(), &catalog).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn edge_lengths_match_parent_key() {
        let edges = derive_foreign_keys(&registry(), &plants_catalog(&[])).unwrap();
        for edge in edges {
            assert_eq!(edge.child_fields.len(), edge.parent_fields.len());
        }
    }

    #[test]
    fn translated_group_names_map_onto_key() {
        let resources = index_resources(vec![
            Resource::new("plants_ferc1", ["utility_id_ferc1", "plant_name_ferc1"])
                .with_primary_key(["utility_id_ferc1", "plant_name_ferc1"])
                .with_rule(ForeignKeyRule::new([
                    ["utility_id_ferc1", "plant_name_ferc1"],
                    ["utility_id_ferc1", "plant_name_original"],
                ])),
            Resource::new("fuel_ferc1", ["utility_id_ferc1", "plant_name_ferc1", "report_year"]),
            Resource::new("plants_steam_ferc1", ["utility_id_ferc1", "plant_name_original"]),
        ])
        .unwrap();

        let edges = derive_foreign_keys(&registry(), &resources).unwrap();
        assert_eq!(
            edges,
            vec![
                edge(
                    "fuel_ferc1",
                    &["utility_id_ferc1", "plant_name_ferc1"],
                    "plants_ferc1",
                    &["utility_id_ferc1", "plant_name_ferc1"]
                ),
                edge(
                    "plants_steam_ferc1",
                    &["utility_id_ferc1", "plant_name_original"],
                    "plants_ferc1",
                    &["utility_id_ferc1", "plant_name_ferc1"]
                ),
            ]
        );
    }

    #[test]
    fn self_reference_through_other_group_is_kept() {
        let resources = index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl", "parent_plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(ForeignKeyRule::new([["plant_id_pudl"], ["parent_plant_id_pudl"]])),
        ])
        .unwrap();

        let edges = derive_foreign_keys(&registry(), &resources).unwrap();
        assert_eq!(
            edges,
            vec![edge(
                "plants_pudl",
                &["parent_plant_id_pudl"],
                "plants_pudl",
                &["plant_id_pudl"]
            )]
        );
    }

    #[test]
    fn missing_primary_key_field_is_fatal() {
        let mut resources = plants_catalog(&[]);
        resources
            .get_mut("plants_pudl")
            .unwrap()
            .schema
            .fields
            .clear();

        let err = derive_foreign_keys(&registry(), &resources).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::UnknownPrimaryKeyField { ref field, .. })
                if field == "plant_id_pudl"
        ));
    }

    #[test]
    fn group_length_mismatch_is_fatal() {
        let resources = index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(ForeignKeyRule::new([vec!["plant_id_pudl", "report_year"]])),
        ])
        .unwrap();

        let err = derive_foreign_keys(&registry(), &resources).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::FieldGroupLength {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn repeated_group_is_fatal() {
        let resources = index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(ForeignKeyRule::new([["plant_id_pudl"], ["plant_id_pudl"]])),
        ])
        .unwrap();

        let err = derive_foreign_keys(&registry(), &resources).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::DuplicateFieldGroup { .. })
        ));
    }

    #[test]
    fn unregistered_group_field_is_fatal() {
        let resources = index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(ForeignKeyRule::new([["pudl_plant_code"]])),
        ])
        .unwrap();

        let err = derive_foreign_keys(&registry(), &resources).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::UnknownField { ref field, .. })
                if field == "pudl_plant_code"
        ));
    }
}
