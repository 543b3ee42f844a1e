//! Structural validation against JSON Schema.
//!
//! A pattern is a JSON Schema; an architecture conforms to a pattern when it
//! validates against it. Patterns usually `$ref` the CALM meta schemas by
//! URL. Those are served from a [`SchemaDirectory`] instead of the network.

use std::{fs, io, path::Path};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::Value;
use walkdir::WalkDir;

use calm_core::outcome::ValidationOutput;

use crate::error::CalmError;

/// Code of outputs produced by JSON Schema validation.
pub const JSON_SCHEMA_CODE: &str = "json-schema";

/// Validates a document against a schema.
pub trait StructuralValidator {
    /// Check that `schema` compiles.
    ///
    /// # Errors
    ///
    /// Returns [`CalmError::Schema`] if the schema is invalid or references
    /// an unknown schema.
    fn check_schema(&self, schema: &Value) -> Result<(), CalmError>;

    /// Validate `document` against `schema`.
    ///
    /// Violations are returned as outputs; only an unusable schema is an
    /// error.
    fn validate(&self, schema: &Value, document: &Value)
    -> Result<Vec<ValidationOutput>, CalmError>;
}

/// Schemas indexed by their `$id`.
#[derive(Debug, Clone, Default)]
pub struct SchemaDirectory {
    schemas: IndexMap<String, Value>,
}

impl SchemaDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file below `dir`.
    ///
    /// Files are read in file-name order. A file without a string `$id` is
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CalmError::Io`] if the directory or a file cannot be read,
    /// and [`CalmError::Schema`] if a file is not valid JSON.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, CalmError> {
        let dir = dir.as_ref();
        info!(path = dir.display().to_string(); "Loading schema directory");

        let mut directory = Self::new();
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let content = fs::read_to_string(path)?;
            let schema: Value = serde_json::from_str(&content)
                .map_err(|err| CalmError::Schema(format!("{}: {err}", path.display())))?;

            match directory.insert(schema) {
                Some(id) => debug!(id, path = path.display().to_string(); "Loaded schema"),
                None => warn!(path = path.display().to_string(); "Skipping schema without $id"),
            }
        }

        info!(count = directory.len(); "Schema directory loaded");
        Ok(directory)
    }

    /// Add a schema under its `$id`, returning the id.
    ///
    /// Returns `None`, and keeps nothing, if the schema has no string `$id`.
    pub fn insert(&mut self, schema: Value) -> Option<String> {
        let id = schema.get("$id")?.as_str()?.to_string();
        self.schemas.insert(id.clone(), schema);
        Some(id)
    }

    /// Returns the schema with the given `$id`.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.schemas.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schemas.iter().map(|(id, schema)| (id.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// [`StructuralValidator`] backed by the `jsonschema` crate.
///
/// The draft is taken from the schema's `$schema` keyword. Every schema of
/// the directory is registered as a resource, so `$ref`s to them resolve
/// offline.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaValidator {
    schemas: SchemaDirectory,
}

impl JsonSchemaValidator {
    pub fn new(schemas: SchemaDirectory) -> Self {
        Self { schemas }
    }

    /// The schemas available to `$ref`.
    pub fn schemas(&self) -> &SchemaDirectory {
        &self.schemas
    }

    fn compile(&self, schema: &Value) -> Result<jsonschema::Validator, CalmError> {
        self.schemas
            .iter()
            .fold(jsonschema::options(), |options, (id, resource)| {
                options.with_resource(id, jsonschema::Resource::from_contents(resource.clone()))
            })
            .build(schema)
            .map_err(|err| CalmError::Schema(err.to_string()))
    }
}

impl StructuralValidator for JsonSchemaValidator {
    fn check_schema(&self, schema: &Value) -> Result<(), CalmError> {
        self.compile(schema).map(|_| ())
    }

    fn validate(
        &self,
        schema: &Value,
        document: &Value,
    ) -> Result<Vec<ValidationOutput>, CalmError> {
        let validator = self.compile(schema)?;

        let outputs: Vec<_> = validator
            .iter_errors(document)
            .map(|error| {
                let mut path = error.instance_path().to_string();
                if path.is_empty() {
                    path.push('/');
                }
                ValidationOutput::error(JSON_SCHEMA_CODE, error.to_string(), path)
                    .with_schema_path(error.schema_path().to_string())
            })
            .collect();

        debug!(errors = outputs.len(); "JSON Schema validation finished");
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn node_schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "https://calm.example/node.json",
            "type": "object",
            "required": ["unique-id"],
            "properties": {
                "unique-id": { "type": "string" }
            }
        })
    }

    fn pattern() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["nodes"],
            "properties": {
                "nodes": {
                    "type": "array",
                    "items": { "$ref": "https://calm.example/node.json" }
                }
            }
        })
    }

    fn validator() -> JsonSchemaValidator {
        let mut schemas = SchemaDirectory::new();
        schemas.insert(node_schema());
        JsonSchemaValidator::new(schemas)
    }

    #[test]
    fn test_valid_document() {
        let outputs = validator()
            .validate(&pattern(), &json!({ "nodes": [{ "unique-id": "a" }] }))
            .unwrap();

        assert!(outputs.is_empty());
    }

    #[test]
    fn test_errors_carry_paths() {
        let outputs = validator()
            .validate(&pattern(), &json!({ "nodes": [{ "unique-id": "a" }, { "unique-id": 7 }] }))
            .unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].code(), JSON_SCHEMA_CODE);
        assert!(outputs[0].severity().is_error());
        assert_eq!(outputs[0].path(), "/nodes/1/unique-id");
        assert!(
            outputs[0]
                .schema_path()
                .is_some_and(|p| p.ends_with("/type"))
        );
    }

    #[test]
    fn test_root_error_path() {
        let outputs = validator().validate(&pattern(), &json!({})).unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].path(), "/");
    }

    #[test]
    fn test_unknown_reference_is_schema_error() {
        let result = JsonSchemaValidator::default().check_schema(&pattern());

        assert!(matches!(result, Err(CalmError::Schema(_))));
    }

    #[test]
    fn test_check_schema() {
        assert!(validator().check_schema(&pattern()).is_ok());
        assert!(
            validator()
                .check_schema(&json!({ "type": "not-a-type" }))
                .is_err()
        );
    }

    #[test]
    fn test_insert_requires_id() {
        let mut schemas = SchemaDirectory::new();

        assert_eq!(schemas.insert(json!({ "type": "object" })), None);
        assert_eq!(
            schemas.insert(node_schema()).as_deref(),
            Some("https://calm.example/node.json")
        );
        assert_eq!(schemas.len(), 1);
    }

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("meta");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("node.json"), node_schema().to_string()).unwrap();
        fs::write(dir.path().join("anonymous.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "not json").unwrap();

        let schemas = SchemaDirectory::load(dir.path()).unwrap();

        assert_eq!(schemas.len(), 1);
        assert!(schemas.get("https://calm.example/node.json").is_some());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let result = SchemaDirectory::load(dir.path());

        assert!(matches!(result, Err(CalmError::Schema(_))));
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = tempdir().unwrap();

        let result = SchemaDirectory::load(dir.path().join("missing"));

        assert!(matches!(result, Err(CalmError::Io(_))));
    }
}
