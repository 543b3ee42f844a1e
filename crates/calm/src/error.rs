//! Error types for CALM validation.
//!
//! This module provides the main error type [`CalmError`]. Validation
//! findings are not errors; they are reported in the
//! [`ValidationOutcome`](calm_core::outcome::ValidationOutcome). A
//! `CalmError` means validation could not run at all.

use std::io;

use thiserror::Error;

use calm_parser::error::ParseError;

/// The main error type for CALM operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the parser diagnostics together with the
/// source text and the name of the document, so callers can render labelled
/// snippets.
#[derive(Debug, Error)]
pub enum CalmError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{document}: {err}")]
    Parse {
        err: ParseError,
        src: String,
        document: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CalmError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(
        err: ParseError,
        src: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        Self::Parse {
            err,
            src: src.into(),
            document: document.into(),
        }
    }
}
