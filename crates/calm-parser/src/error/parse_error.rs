//! The error type wrapping the diagnostics of a failed parse.

use thiserror::Error;

use crate::error::Diagnostic;

/// A type alias for `Result<T, Diagnostic>`.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Error returned when a document is not valid JSON.
///
/// Holds every diagnostic of the parse, warnings included, in source order.
#[derive(Debug, Clone, Error)]
#[error("{}", summary(.diagnostics))]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the error, returning its diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity().is_error())
            .count()
    }
}

/// The first error, and how many more follow it.
fn summary(diagnostics: &[Diagnostic]) -> String {
    let mut errors = diagnostics.iter().filter(|d| d.severity().is_error());
    match errors.next() {
        Some(first) => match errors.count() {
            0 => first.to_string(),
            more => format!("{first} (+{more} more)"),
        },
        None => String::new(),
    }
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_error_from_diagnostic() {
        let err: ParseError = Diagnostic::error("unexpected `}`")
            .with_code(ErrorCode::E100)
            .into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.error_count(), 1);
    }

    #[test]
    fn test_parse_error_display_counts_errors_only() {
        let err: ParseError = vec![
            Diagnostic::warning("duplicate key `a`"),
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
        ]
        .into();

        assert_eq!(err.to_string(), "error: first error (+1 more)");
        assert_eq!(err.error_count(), 2);
    }
}
