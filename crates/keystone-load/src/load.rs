use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use keystone_core::{
    BuiltCatalog, Catalog, DeclarationError, Field, FieldRegistry, Resource,
};
use schemars::schema_for;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::document::DeclarationDocument;
use crate::errors::{IssueSeverity, LoadError, Result, ValidationIssue, ValidationReport};

/// Serialization format of a declaration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(DocumentFormat::Json),
            Some("toml") => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

/// JSON Schema describing a declaration document.
pub fn declaration_json_schema() -> Value {
    let schema = schema_for!(DeclarationDocument);
    // RootSchema always serializes; fall back to an accept-all schema otherwise.
    serde_json::to_value(&schema).unwrap_or(Value::Bool(true))
}

/// Validate a document against the declaration JSON Schema.
pub fn validate_document_json(document: &Value, schema: &Value) -> Result<ValidationReport> {
    let compiled = JSONSchema::compile(schema).map_err(|err| LoadError::Schema(err.to_string()))?;
    Ok(structural_report(&compiled, document))
}

fn structural_report(compiled: &JSONSchema, document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    report
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

/// Reads declaration documents, checking each one structurally before parsing.
pub struct DocumentLoader {
    schema: JSONSchema,
}

impl DocumentLoader {
    pub fn new() -> Result<Self> {
        let schema = declaration_json_schema();
        let compiled =
            JSONSchema::compile(&schema).map_err(|err| LoadError::Schema(err.to_string()))?;
        Ok(Self { schema: compiled })
    }

    /// Read and parse one document from disk.
    pub fn load(&self, path: &Path) -> Result<DeclarationDocument> {
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(path, &contents, format)
    }

    /// Parse document text; `origin` is only used for error reporting.
    pub fn parse(
        &self,
        origin: &Path,
        contents: &str,
        format: DocumentFormat,
    ) -> Result<DeclarationDocument> {
        let value: Value = match format {
            DocumentFormat::Json => {
                serde_json::from_str(contents).map_err(|source| LoadError::Json {
                    path: origin.to_path_buf(),
                    source,
                })?
            }
            DocumentFormat::Toml => toml::from_str(contents).map_err(|source| LoadError::Toml {
                path: origin.to_path_buf(),
                source,
            })?,
        };

        let report = structural_report(&self.schema, &value);
        if !report.is_ok() {
            for issue in &report.errors {
                tracing::error!(
                    event = "declaration_structural_error",
                    document = %origin.display(),
                    path = %issue.path,
                    message = %issue.message
                );
            }
            return Err(LoadError::Structural {
                path: origin.to_path_buf(),
                report,
            });
        }

        // TOML rejects repeated keys itself; a JSON object keeps the last one.
        if format == DocumentFormat::Json {
            let names: DeclaredNames =
                serde_json::from_str(contents).map_err(|source| LoadError::Json {
                    path: origin.to_path_buf(),
                    source,
                })?;
            names.check_unique(origin)?;
        }

        serde_json::from_value(value).map_err(|source| LoadError::Json {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Entry names of a document's `fields` and `resources` maps in document
/// order, repeats included.
#[derive(Debug, Default, Deserialize)]
struct DeclaredNames {
    #[serde(default)]
    fields: EntryNames,
    #[serde(default)]
    resources: EntryNames,
}

impl DeclaredNames {
    fn check_unique(&self, origin: &Path) -> Result<()> {
        if let Some(name) = self.fields.first_repeat() {
            tracing::error!(
                event = "duplicate_field",
                field = %name,
                document = %origin.display()
            );
            return Err(DeclarationError::DuplicateField(name.to_string()).into());
        }
        if let Some(name) = self.resources.first_repeat() {
            tracing::error!(
                event = "duplicate_resource",
                resource = %name,
                document = %origin.display()
            );
            return Err(DeclarationError::DuplicateResource(name.to_string()).into());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct EntryNames(Vec<String>);

impl EntryNames {
    fn first_repeat(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.0
            .iter()
            .find(|name| !seen.insert(name.as_str()))
            .map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for EntryNames {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryNamesVisitor;

        impl<'de> Visitor<'de> for EntryNamesVisitor {
            type Value = EntryNames;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of declarations keyed by name")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<EntryNames, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut names = Vec::new();
                while let Some((name, IgnoredAny)) = map.next_entry::<String, IgnoredAny>()? {
                    names.push(name);
                }
                Ok(EntryNames(names))
            }
        }

        deserializer.deserialize_map(EntryNamesVisitor)
    }
}

/// Expand files and directories into a sorted list of declaration documents.
///
/// Directories contribute their `.json` and `.toml` entries (non-recursive).
pub fn collect_document_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let mut found = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                let entry_path = entry.path();
                if entry_path.is_file() && DocumentFormat::from_path(&entry_path).is_some() {
                    found.push(entry_path);
                }
            }
            found.sort();
            documents.extend(found);
        } else {
            documents.push(path.clone());
        }
    }

    Ok(documents)
}

/// Declarations merged from every document of a catalog release.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    fields: Vec<Field>,
    resources: Vec<Resource>,
    field_origins: BTreeMap<String, PathBuf>,
    resource_origins: BTreeMap<String, PathBuf>,
}

impl Declarations {
    /// Add one document. A field or resource name seen in an earlier
    /// document is fatal.
    pub fn merge(&mut self, origin: &Path, document: DeclarationDocument) -> Result<()> {
        for (name, field) in document.fields {
            if let Some(first) = self.field_origins.get(&name) {
                tracing::error!(
                    event = "duplicate_field",
                    field = %name,
                    first = %first.display(),
                    second = %origin.display()
                );
                return Err(DeclarationError::DuplicateField(name).into());
            }
            self.field_origins.insert(name.clone(), origin.to_path_buf());
            self.fields.push(field.into_field(name));
        }

        for (name, resource) in document.resources {
            if let Some(first) = self.resource_origins.get(&name) {
                tracing::error!(
                    event = "duplicate_resource",
                    resource = %name,
                    first = %first.display(),
                    second = %origin.display()
                );
                return Err(DeclarationError::DuplicateResource(name).into());
            }
            self.resource_origins
                .insert(name.clone(), origin.to_path_buf());
            self.resources.push(resource.into_resource(name));
        }

        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Document that declared `resource`, if any.
    pub fn origin_of(&self, resource: &str) -> Option<&Path> {
        self.resource_origins.get(resource).map(PathBuf::as_path)
    }

    /// Build the immutable catalog from the merged declarations.
    pub fn build(self) -> Result<BuiltCatalog> {
        let registry = FieldRegistry::new(self.fields)?;
        Ok(Catalog::build(registry, self.resources)?)
    }
}

/// Load and merge every declaration document reachable from `paths`.
pub fn load_declarations(paths: &[PathBuf]) -> Result<Declarations> {
    let loader = DocumentLoader::new()?;
    let mut declarations = Declarations::default();

    for path in collect_document_paths(paths)? {
        let document = loader.load(&path)?;
        tracing::debug!(
            event = "declaration_document_loaded",
            path = %path.display(),
            fields = document.fields.len(),
            resources = document.resources.len()
        );
        declarations.merge(&path, document)?;
    }

    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use keystone_core::CatalogError;

    use super::*;

    fn parse_json(text: &str) -> Result<DeclarationDocument> {
        DocumentLoader::new()
            .expect("compile declaration schema")
            .parse(Path::new("inline.json"), text, DocumentFormat::Json)
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("glue.toml")),
            Some(DocumentFormat::Toml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("eia860.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("notes.md")), None);
    }

    #[test]
    fn misspelled_key_is_structural_error() {
        let err = parse_json(
            r#"{"resources": {"plants_pudl": {"schema": {"fields": ["plant_id_pudl"], "primary_keys": ["plant_id_pudl"]}}}}"#,
        )
        .unwrap_err();
        match err {
            LoadError::Structural { report, .. } => {
                assert!(!report.errors.is_empty());
                assert!(report.errors.iter().all(|issue| issue.code == "schema_violation"));
            }
            other => panic!("expected structural error, got {other}"),
        }
    }

    #[test]
    fn unknown_field_type_is_structural_error() {
        let err = parse_json(r#"{"fields": {"plant_id_pudl": {"type": "uuid"}}}"#).unwrap_err();
        assert!(matches!(err, LoadError::Structural { .. }));
        assert!(err.is_declaration_error());
    }

    #[test]
    fn repeated_resource_key_in_one_document_is_fatal() {
        let err = parse_json(
            r#"{"resources": {
                "plants_pudl": {"schema": {"fields": ["plant_id_pudl"]}},
                "plants_pudl": {"schema": {"fields": ["plant_name_pudl"]}}
            }}"#,
        )
        .unwrap_err();
        assert!(err.is_declaration_error());
        assert!(matches!(
            err,
            LoadError::Catalog(CatalogError::Declaration(DeclarationError::DuplicateResource(ref name)))
                if name == "plants_pudl"
        ));
    }

    #[test]
    fn repeated_field_key_in_one_document_is_fatal() {
        let err = parse_json(
            r#"{"fields": {"plant_id_pudl": {"type": "integer"}, "plant_id_pudl": {"type": "string"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Catalog(CatalogError::Declaration(DeclarationError::DuplicateField(ref name)))
                if name == "plant_id_pudl"
        ));
    }

    #[test]
    fn duplicate_resource_across_documents_is_fatal() {
        let doc = || {
            parse_json(
                r#"{"resources": {"plants_pudl": {"schema": {"fields": ["plant_id_pudl"]}}}}"#,
            )
            .expect("parse document")
        };

        let mut declarations = Declarations::default();
        declarations
            .merge(Path::new("glue.json"), doc())
            .expect("first merge");
        let err = declarations
            .merge(Path::new("ferc1.json"), doc())
            .unwrap_err();
        assert!(err.is_declaration_error());
        assert_eq!(
            declarations.origin_of("plants_pudl"),
            Some(Path::new("glue.json"))
        );
    }
}
