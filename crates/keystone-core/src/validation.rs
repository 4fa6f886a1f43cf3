use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CatalogWarning, DeclarationError, Result};
use crate::fields::FieldRegistry;
use crate::schema::{Resource, ResourceName};

/// Key the declaration store by resource name, failing on duplicates.
pub fn index_resources(
    resources: impl IntoIterator<Item = Resource>,
) -> Result<BTreeMap<ResourceName, Resource>> {
    let mut store = BTreeMap::new();
    for resource in resources {
        if store.contains_key(&resource.name) {
            return Err(DeclarationError::DuplicateResource(resource.name.to_string()).into());
        }
        store.insert(resource.name.clone(), resource);
    }
    Ok(store)
}

/// Validate resource-level declarations against the field registry.
///
/// This checks:
/// - duplicate fields within a resource
/// - resource fields exist in the registry
/// - foreign key rules are only declared on resources with a primary key
///
/// Primary-key and field-group checks run during derivation.
pub fn validate_declarations(
    fields: &FieldRegistry,
    resources: &BTreeMap<ResourceName, Resource>,
) -> Result<()> {
    for resource in resources.values() {
        let mut seen = BTreeSet::new();
        for field in &resource.schema.fields {
            if !seen.insert(field.as_str()) {
                return Err(DeclarationError::DuplicateResourceField {
                    resource: resource.name.to_string(),
                    field: field.clone(),
                }
                .into());
            }
            if !fields.contains(field) {
                return Err(DeclarationError::UnknownField {
                    resource: resource.name.to_string(),
                    field: field.clone(),
                }
                .into());
            }
        }

        if resource.foreign_key_rules().is_some() && resource.primary_key().is_none() {
            return Err(DeclarationError::RuleWithoutPrimaryKey {
                resource: resource.name.to_string(),
            }
            .into());
        }
    }

    Ok(())
}

/// Drop exclusions that name resources missing from this catalog.
///
/// After this pass every exclusion is a link to a known resource.
pub fn resolve_exclusions(resources: &mut BTreeMap<ResourceName, Resource>) -> Vec<CatalogWarning> {
    let known: BTreeSet<ResourceName> = resources.keys().cloned().collect();
    let mut warnings = Vec::new();

    for resource in resources.values_mut() {
        let name = resource.name.to_string();
        if let Some(rule) = resource.schema.foreign_key_rules.as_mut() {
            let (kept, unknown): (BTreeSet<_>, BTreeSet<_>) = std::mem::take(&mut rule.exclude)
                .into_iter()
                .partition(|excluded| known.contains(excluded));
            rule.exclude = kept;

            for referenced in unknown {
                tracing::warn!(
                    event = "unknown_excluded_resource",
                    resource = %name,
                    referenced = %referenced
                );
                warnings.push(CatalogWarning::UnknownResource {
                    resource: name.clone(),
                    referenced: referenced.to_string(),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::fields::Field;
    use crate::schema::ForeignKeyRule;
    use crate::types::FieldType;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![
            Field::new("plant_id_eia", FieldType::Integer),
            Field::new("plant_id_pudl", FieldType::Integer),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_resource_names_are_fatal() {
        let err = index_resources(vec![
            Resource::new("plants_eia", ["plant_id_eia"]),
            Resource::new("plants_eia", ["plant_id_pudl"]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::DuplicateResource(_))
        ));
    }

    #[test]
    fn resource_fields_must_be_registered() {
        let store =
            index_resources(vec![Resource::new("plants_eia", ["plant_id_eia", "capacity_mw"])])
                .unwrap();
        let err = validate_declarations(&registry(), &store).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::UnknownField { ref field, .. }) if field == "capacity_mw"
        ));
    }

    #[test]
    fn rule_requires_primary_key() {
        let store = index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_rule(ForeignKeyRule::new([["plant_id_pudl"]])),
        ])
        .unwrap();
        let err = validate_declarations(&registry(), &store).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Declaration(DeclarationError::RuleWithoutPrimaryKey { .. })
        ));
    }

    #[test]
    fn unknown_exclusions_become_warnings() {
        let mut store = index_resources(vec![
            Resource::new("plants_pudl", ["plant_id_pudl"])
                .with_primary_key(["plant_id_pudl"])
                .with_rule(
                    ForeignKeyRule::new([["plant_id_pudl"]])
                        .excluding(["plants_eia", "plants_retired"]),
                ),
            Resource::new("plants_eia", ["plant_id_eia", "plant_id_pudl"]),
        ])
        .unwrap();

        let warnings = resolve_exclusions(&mut store);
        assert_eq!(
            warnings,
            vec![CatalogWarning::UnknownResource {
                resource: "plants_pudl".to_string(),
                referenced: "plants_retired".to_string(),
            }]
        );
        let rule = store["plants_pudl"].foreign_key_rules().unwrap();
        assert_eq!(rule.exclude.len(), 1);
        assert!(rule.exclude.contains("plants_eia"));
    }
}
