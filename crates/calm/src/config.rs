//! Configuration types for CALM validation.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file by the CLI.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`ValidationConfig`] - Strictness, schema lookup and rule selection.
//!
//! # Example
//!
//! ```
//! # use calm::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.validation().strict());
//! assert!(config.validation().disabled_rules().is_empty());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Validation configuration section.
    #[serde(default)]
    validation: ValidationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the given validation section.
    pub fn new(validation: ValidationConfig) -> Self {
        Self { validation }
    }

    /// Returns the validation configuration.
    pub fn validation(&self) -> &ValidationConfig {
        &self.validation
    }

    /// Returns the validation configuration for modification.
    pub fn validation_mut(&mut self) -> &mut ValidationConfig {
        &mut self.validation
    }
}

/// The `[validation]` section.
///
/// ```toml
/// [validation]
/// strict = true
/// schema_directory = "calm/release"
/// disabled_rules = ["architecture-nodes-must-be-referenced"]
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Treat warnings as failures.
    #[serde(default)]
    strict: bool,

    /// Directory of JSON schemas referenced by patterns.
    #[serde(default)]
    schema_directory: Option<PathBuf>,

    /// Names of semantic rules that are not run.
    #[serde(default)]
    disabled_rules: Vec<String>,
}

impl ValidationConfig {
    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn schema_directory(&self) -> Option<&Path> {
        self.schema_directory.as_deref()
    }

    pub fn disabled_rules(&self) -> &[String] {
        &self.disabled_rules
    }

    /// Sets strict mode.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Sets the schema directory.
    pub fn set_schema_directory(&mut self, dir: impl Into<PathBuf>) {
        self.schema_directory = Some(dir.into());
    }

    /// Returns a copy with the given rules disabled.
    pub fn with_disabled_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_rules.extend(rules.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "validation": {
                "strict": true,
                "schema_directory": "schemas",
                "disabled_rules": ["unique-ids-must-be-unique"]
            }
        }))
        .unwrap();

        assert!(config.validation().strict());
        assert_eq!(
            config.validation().schema_directory(),
            Some(Path::new("schemas"))
        );
        assert_eq!(
            config.validation().disabled_rules(),
            ["unique-ids-must-be-unique"]
        );
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(!config.validation().strict());
        assert!(config.validation().schema_directory().is_none());
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.validation_mut().set_strict(true);
        config.validation_mut().set_schema_directory("dir");

        assert!(config.validation().strict());
        assert_eq!(config.validation().schema_directory(), Some(Path::new("dir")));
    }
}
