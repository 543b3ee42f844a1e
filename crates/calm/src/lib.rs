//! CALM - validation of architecture documents against patterns.
//!
//! A CALM architecture is a JSON document of nodes, relationships and flows;
//! a pattern is a JSON Schema that architectures are instantiated from.
//! [`ValidationBuilder`] checks an architecture against its pattern, runs the
//! semantic rules on both, and places every finding at its line and
//! character in the source text.

pub mod config;
pub mod context;
pub mod rules;
pub mod schema;

mod enrich;
mod error;

pub use calm_core::{options, outcome, path, pointer};

pub use enrich::enrich_with_document_positions;
pub use error::CalmError;

use log::{debug, info, trace};
use serde_json::Value;

use calm_core::{
    options::{CalmChoice, PatternOption, extract_options, select_choices},
    outcome::{ValidationOutcome, ValidationOutput},
};

use config::AppConfig;
use context::{ARCHITECTURE, DocumentContexts, PATTERN, ParsedDocumentContext};
use rules::{CalmRules, RuleEngine, RuleTarget};
use schema::{JsonSchemaValidator, SchemaDirectory, StructuralValidator};

/// Builder for validating CALM documents.
///
/// # Examples
///
/// ```rust
/// use calm::{ValidationBuilder, config::AppConfig};
///
/// let architecture = r#"{
///   "nodes": [{ "unique-id": "api" }],
///   "relationships": []
/// }"#;
///
/// let builder = ValidationBuilder::new(AppConfig::default());
/// let report = builder.validate(Some(architecture), None)
///     .expect("Failed to validate");
///
/// // the node is not used by any relationship
/// let output = report.outcome().all_validation_outputs().next().unwrap();
/// assert_eq!(output.path(), "/nodes/api");
/// assert_eq!(output.location().unwrap().line_start, 2);
/// assert_eq!(report.exit_code(false), 0);
/// assert_eq!(report.exit_code(true), 1);
/// ```
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    config: AppConfig,
    structural: JsonSchemaValidator,
    rules: CalmRules,
    choices: Vec<CalmChoice>,
}

impl ValidationBuilder {
    /// Create a new validation builder with the given configuration.
    ///
    /// The rules disabled in the configuration are not run. No schemas are
    /// available to `$ref` until [`with_schema_directory`](Self::with_schema_directory)
    /// is called.
    pub fn new(config: AppConfig) -> Self {
        let rules = CalmRules::from_config(config.validation());
        Self {
            config,
            structural: JsonSchemaValidator::default(),
            rules,
            choices: Vec::new(),
        }
    }

    /// Resolve `$ref`s and `$schema` against the given schemas.
    pub fn with_schema_directory(mut self, schemas: SchemaDirectory) -> Self {
        self.structural = JsonSchemaValidator::new(schemas);
        self
    }

    /// Narrow the pattern's options to `choices` before validating.
    pub fn with_choices(mut self, choices: Vec<CalmChoice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// List the decisions a pattern leaves open.
    ///
    /// # Errors
    ///
    /// Returns [`CalmError::Parse`] if the pattern is not valid JSON.
    pub fn pattern_options(&self, pattern: &str) -> Result<Vec<PatternOption>, CalmError> {
        let context = parse_context(pattern, PATTERN)?;
        let options = context.data().map(extract_options).unwrap_or_default();
        debug!(options = options.len(); "Extracted pattern options");
        Ok(options)
    }

    /// Validate an architecture, a pattern, or an architecture against a
    /// pattern.
    ///
    /// With both documents the architecture is validated against the
    /// pattern and the rules run on each. With only a pattern, the pattern
    /// must compile as a schema and the pattern rules run. With only an
    /// architecture, its rules run, and if its `$schema` names a schema of
    /// the schema directory it is validated against that schema too.
    ///
    /// # Errors
    ///
    /// Returns [`CalmError::Input`] if no document is given,
    /// [`CalmError::Parse`] if a document is not valid JSON, and
    /// [`CalmError::Schema`] if the pattern cannot be compiled.
    pub fn validate(
        &self,
        architecture: Option<&str>,
        pattern: Option<&str>,
    ) -> Result<ValidationReport, CalmError> {
        info!(
            architecture = architecture.is_some(),
            pattern = pattern.is_some();
            "Validating documents"
        );

        let architecture = architecture
            .map(|source| parse_context(source, ARCHITECTURE))
            .transpose()?;
        let pattern = pattern
            .map(|source| parse_context(source, PATTERN))
            .transpose()?;

        let architecture_data = architecture.as_ref().and_then(ParsedDocumentContext::data);
        let pattern_data = pattern.as_ref().and_then(ParsedDocumentContext::data);

        let mut structural = Vec::new();
        let mut semantic = Vec::new();
        match (architecture_data, pattern_data) {
            (None, None) => {
                return Err(CalmError::Input(
                    "an architecture or a pattern is required".to_string(),
                ));
            }
            (Some(architecture), Some(pattern)) => {
                info!("Validating architecture against pattern");
                let resolved = self.resolve_options(pattern);
                structural = self.structural.validate(&resolved, architecture)?;
                semantic.extend(self.rules.check(architecture, RuleTarget::Architecture));
                // Rules see the pattern as written, so their paths match its text
                semantic.extend(self.rules.check(pattern, RuleTarget::Pattern));
            }
            (None, Some(pattern)) => {
                info!("Validating pattern");
                self.structural.check_schema(&self.resolve_options(pattern))?;
                semantic.extend(self.rules.check(pattern, RuleTarget::Pattern));
            }
            (Some(architecture), None) => {
                info!("Validating architecture");
                if let Some(schema) = self.declared_schema(architecture) {
                    structural = self.structural.validate(schema, architecture)?;
                }
                semantic.extend(self.rules.check(architecture, RuleTarget::Architecture));
            }
        }

        let contexts: DocumentContexts = architecture.into_iter().chain(pattern).collect();
        let mut outcome = ValidationOutcome::new(structural, semantic);
        enrich_with_document_positions(&mut outcome, &contexts);

        info!(
            errors = outcome.has_errors(),
            warnings = outcome.has_warnings(),
            outputs = outcome.all_validation_outputs().count();
            "Validation completed"
        );

        Ok(ValidationReport { outcome, contexts })
    }

    /// The pattern with the configured choices applied.
    fn resolve_options(&self, pattern: &Value) -> Value {
        let mut pattern = pattern.clone();
        if !self.choices.is_empty() {
            debug!(choices = self.choices.len(); "Selecting pattern choices");
            select_choices(&mut pattern, &self.choices);
        }
        pattern
    }

    /// The schema directory entry named by the architecture's `$schema`.
    fn declared_schema(&self, architecture: &Value) -> Option<&Value> {
        let id = architecture.get("$schema")?.as_str()?;
        let schema = self.structural.schemas().get(id);
        trace!(id, found = schema.is_some(); "Looked up declared schema");
        schema
    }
}

/// Parse a document, failing on syntax errors.
fn parse_context(source: &str, id: &str) -> Result<ParsedDocumentContext, CalmError> {
    let context = context::parse_document_with_positions(source, id)
        .ok_or_else(|| CalmError::Input(format!("{id} could not be read")))?;

    if let Some(err) = context.parse_result().error() {
        return Err(CalmError::new_parse_error(err, source, id));
    }
    Ok(context)
}

/// Result of a validation run: the enriched outcome and the parsed documents.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    outcome: ValidationOutcome,
    contexts: DocumentContexts,
}

impl ValidationReport {
    pub fn outcome(&self) -> &ValidationOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> ValidationOutcome {
        self.outcome
    }

    /// The parsed documents the outcome's positions refer to.
    pub fn contexts(&self) -> &DocumentContexts {
        &self.contexts
    }

    /// The document an output's position refers to.
    pub fn context_of(&self, output: &ValidationOutput) -> Option<&ParsedDocumentContext> {
        self.contexts.get(output.source()?)
    }

    /// Process exit status: `1` on errors, or on warnings when `strict`.
    pub fn exit_code(&self, strict: bool) -> i32 {
        let failed = self.outcome.has_errors() || (strict && self.outcome.has_warnings());
        i32::from(failed)
    }

    /// The outcome as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CalmError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CalmError> {
        Ok(serde_json::to_string_pretty(&self.outcome)?)
    }
}
