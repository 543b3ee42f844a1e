//! Validation outputs and the outcome aggregating them.
//!
//! A [`ValidationOutput`] is one diagnostic produced by a structural (JSON
//! Schema) or semantic (rule) check, addressed by a JSON Pointer. A
//! [`ValidationOutcome`] keeps both streams apart and derives the
//! `hasErrors`/`hasWarnings` flags from their severities.
//!
//! Outcomes serialize to the JSON shape consumed by CLI and HTTP clients:
//!
//! ```json
//! {
//!   "jsonSchemaValidationOutputs": [],
//!   "spectralSchemaValidationOutputs": [
//!     {
//!       "code": "unique-ids-must-be-unique",
//!       "severity": "error",
//!       "message": "...",
//!       "path": "/nodes/api/unique-id",
//!       "line_start": 12, "line_end": 12,
//!       "character_start": 20, "character_end": 25,
//!       "source": "architecture"
//!     }
//!   ],
//!   "hasErrors": true,
//!   "hasWarnings": false
//! }
//! ```

use std::fmt;

use serde::Serialize;

/// Severity of a validation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document does not conform.
    Error,
    /// The document conforms but something looks wrong.
    Warning,
    /// Informational finding.
    Info,
    /// Stylistic suggestion.
    Hint,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// Source range of a validation output.
///
/// Lines are 1-based, characters are 0-based UTF-16 offsets within the line.
/// The four values always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub line_start: u32,
    pub line_end: u32,
    pub character_start: u32,
    pub character_end: u32,
}

/// A single diagnostic produced by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutput {
    code: String,
    severity: Severity,
    message: String,
    path: String,
    #[serde(rename = "schemaPath", skip_serializing_if = "Option::is_none")]
    schema_path: Option<String>,
    #[serde(flatten)]
    location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl ValidationOutput {
    /// Create an output with the given code, severity, message and pointer path.
    pub fn new(
        code: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            path: path.into(),
            schema_path: None,
            location: None,
            source: None,
        }
    }

    /// Create an error output.
    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(code, Severity::Error, message, path)
    }

    /// Create a warning output.
    pub fn warning(
        code: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(code, Severity::Warning, message, path)
    }

    /// Set the schema path of the failing keyword.
    pub fn with_schema_path(mut self, schema_path: impl Into<String>) -> Self {
        self.schema_path = Some(schema_path.into());
        self
    }

    /// Set the document the path is relative to.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the code of the check that fired.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the JSON Pointer path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the schema path, if any.
    pub fn schema_path(&self) -> Option<&str> {
        self.schema_path.as_deref()
    }

    /// Get the source location, if it has been resolved.
    pub fn location(&self) -> Option<SourceLocation> {
        self.location
    }

    /// Get the document tag, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Replace the path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Replace the document tag.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Replace the source location.
    pub fn set_location(&mut self, location: SourceLocation) {
        self.location = Some(location);
    }
}

impl fmt::Display for ValidationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if !self.path.is_empty() {
            write!(f, " at {}", self.path)?;
        }
        if let Some(location) = self.location {
            write!(f, " ({}:{})", location.line_start, location.character_start)?;
        }
        Ok(())
    }
}

/// Aggregate of structural and semantic validation outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    json_schema_validation_outputs: Vec<ValidationOutput>,
    spectral_schema_validation_outputs: Vec<ValidationOutput>,
    has_errors: bool,
    has_warnings: bool,
}

impl ValidationOutcome {
    /// Create an outcome from structural and semantic outputs.
    ///
    /// The error and warning flags are derived from the outputs' severities.
    pub fn new(structural: Vec<ValidationOutput>, semantic: Vec<ValidationOutput>) -> Self {
        let severities = || structural.iter().chain(&semantic).map(|o| o.severity());
        let has_errors = severities().any(|s| s.is_error());
        let has_warnings = severities().any(|s| s.is_warning());
        Self {
            json_schema_validation_outputs: structural,
            spectral_schema_validation_outputs: semantic,
            has_errors,
            has_warnings,
        }
    }

    /// Outputs produced by JSON Schema validation.
    pub fn structural_outputs(&self) -> &[ValidationOutput] {
        &self.json_schema_validation_outputs
    }

    /// Outputs produced by the rule engine.
    pub fn semantic_outputs(&self) -> &[ValidationOutput] {
        &self.spectral_schema_validation_outputs
    }

    /// All outputs, structural first.
    pub fn all_validation_outputs(&self) -> impl Iterator<Item = &ValidationOutput> {
        self.json_schema_validation_outputs
            .iter()
            .chain(&self.spectral_schema_validation_outputs)
    }

    /// All outputs for in-place mutation, structural first.
    pub fn all_validation_outputs_mut(&mut self) -> impl Iterator<Item = &mut ValidationOutput> {
        self.json_schema_validation_outputs
            .iter_mut()
            .chain(&mut self.spectral_schema_validation_outputs)
    }

    /// Returns `true` if any output is an error.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Returns `true` if any output is a warning.
    pub fn has_warnings(&self) -> bool {
        self.has_warnings
    }

    /// Returns `true` if there are no outputs at all.
    pub fn is_empty(&self) -> bool {
        self.json_schema_validation_outputs.is_empty()
            && self.spectral_schema_validation_outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_flags_from_severities() {
        let outcome = ValidationOutcome::new(
            vec![ValidationOutput::error("json-schema", "bad", "/nodes/0")],
            vec![ValidationOutput::new("hint-rule", Severity::Hint, "meh", "/")],
        );

        assert!(outcome.has_errors());
        assert!(!outcome.has_warnings());
    }

    #[test]
    fn test_warning_only() {
        let outcome = ValidationOutcome::new(
            Vec::new(),
            vec![ValidationOutput::warning("w", "careful", "/a")],
        );

        assert!(!outcome.has_errors());
        assert!(outcome.has_warnings());
        assert!(!outcome.is_empty());
    }

    #[test]
    fn test_default_is_clean() {
        let outcome = ValidationOutcome::default();

        assert!(!outcome.has_errors());
        assert!(!outcome.has_warnings());
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_all_outputs_order_and_mutation() {
        let mut outcome = ValidationOutcome::new(
            vec![ValidationOutput::error("a", "first", "/a")],
            vec![ValidationOutput::error("b", "second", "/b")],
        );

        for output in outcome.all_validation_outputs_mut() {
            output.set_source("architecture");
        }

        let codes: Vec<_> = outcome.all_validation_outputs().map(|o| o.code()).collect();
        assert_eq!(codes, ["a", "b"]);
        assert!(
            outcome
                .all_validation_outputs()
                .all(|o| o.source() == Some("architecture"))
        );
    }

    #[test]
    fn test_serialize_without_location() {
        let output = ValidationOutput::error("json-schema", "missing", "/nodes")
            .with_schema_path("/properties/nodes/required");

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "code": "json-schema",
                "severity": "error",
                "message": "missing",
                "path": "/nodes",
                "schemaPath": "/properties/nodes/required"
            })
        );
    }

    #[test]
    fn test_serialize_with_location_and_source() {
        let mut output = ValidationOutput::warning("rule", "msg", "/x");
        output.set_source("pattern");
        output.set_location(SourceLocation {
            line_start: 2,
            line_end: 3,
            character_start: 4,
            character_end: 1,
        });

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "code": "rule",
                "severity": "warning",
                "message": "msg",
                "path": "/x",
                "line_start": 2,
                "line_end": 3,
                "character_start": 4,
                "character_end": 1,
                "source": "pattern"
            })
        );
    }

    #[test]
    fn test_serialize_outcome_field_names() {
        let outcome = ValidationOutcome::default();

        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "jsonSchemaValidationOutputs": [],
                "spectralSchemaValidationOutputs": [],
                "hasErrors": false,
                "hasWarnings": false
            })
        );
    }

    #[test]
    fn test_display() {
        let mut output = ValidationOutput::error("json-schema", "bad type", "/nodes/a");
        assert_eq!(output.to_string(), "error[json-schema]: bad type at /nodes/a");

        output.set_location(SourceLocation {
            line_start: 4,
            line_end: 4,
            character_start: 8,
            character_end: 12,
        });
        assert_eq!(
            output.to_string(),
            "error[json-schema]: bad type at /nodes/a (4:8)"
        );
    }
}
