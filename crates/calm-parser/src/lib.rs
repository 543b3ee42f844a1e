//! # CALM Parser
//!
//! A JSON parser that remembers where every value came from. It produces
//! the usual [`serde_json::Value`] together with a syntax tree whose nodes
//! carry byte spans, and a [`LineIndex`] to turn those spans into
//! line/character ranges. Validators report problems by JSON path; this
//! crate answers "where in the file is that?".
//!
//! Malformed input never panics. Every lexical and syntax problem becomes a
//! [`Diagnostic`](error::Diagnostic) with an error code and a labeled span.
//!
//! ## Usage
//!
//! ```
//! # use calm_core::path::JsonPath;
//! # use calm_parser::{parse, Position};
//!
//! let source = "{\n  \"nodes\": [\n    {\"unique-id\": \"api\"}\n  ]\n}";
//! let result = parse(source);
//!
//! assert!(result.diagnostics().is_empty());
//! let path = JsonPath::root().join("nodes").join(0).join("unique-id");
//! let range = result.range_for_path(&path).unwrap();
//! assert_eq!(range.start, Position::new(2, 18));
//! ```

pub mod error;
mod lexer;
mod line_index;
mod parser;
#[cfg(test)]
mod parser_tests;
mod span;
mod tokens;
mod tree;
mod validate;

pub use line_index::{LineIndex, Position, Range};
pub use span::{Span, Spanned};
pub use tree::{JsonNode, Member, NodeKind};

use calm_core::path::JsonPath;
use log::debug;
use serde_json::Value;

use error::{Diagnostic, DiagnosticCollector, ParseError};

/// Output of [`parse`].
///
/// The value is present only when the source is valid JSON. The tree is
/// also kept after a trailing-content error, so positions can still be
/// resolved for the part that did parse.
#[derive(Debug, Clone)]
pub struct ParseResult {
    tree: Option<JsonNode>,
    value: Option<Value>,
    diagnostics: Vec<Diagnostic>,
    line_index: LineIndex,
}

impl ParseResult {
    /// The syntax tree, if parsing got far enough to build one.
    pub fn tree(&self) -> Option<&JsonNode> {
        self.tree.as_ref()
    }

    /// The parsed value, if the source is valid JSON.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Consume the result, returning the parsed value.
    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    /// All diagnostics in source order, warnings included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity().is_error())
    }

    /// The diagnostics as an error, if any of them is an error.
    pub fn error(&self) -> Option<ParseError> {
        self.has_errors()
            .then(|| ParseError::new(self.diagnostics.clone()))
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// The source text that was parsed.
    pub fn source(&self) -> &str {
        self.line_index.text()
    }

    /// Byte span of the value addressed by `path`.
    pub fn span_for_path(&self, path: &JsonPath) -> Option<Span> {
        self.tree.as_ref()?.find(path).map(JsonNode::span)
    }

    /// Line/character range of the value addressed by `path`.
    ///
    /// Returns `None` when there is no tree or the address does not exist.
    pub fn range_for_path(&self, path: &JsonPath) -> Option<Range> {
        self.span_for_path(path)
            .map(|span| self.line_index.range(span))
    }
}

/// Parse JSON source text, keeping positions.
///
/// The pipeline:
///
/// 1. **Tokenize** - Convert source text to tokens, recovering from errors
/// 2. **Parse** - Build the tree from tokens
/// 3. **Trailing content** - Report tokens after the top-level value
/// 4. **Validate** - Warn about repeated object keys
///
/// # Example
///
/// ```
/// # use calm_parser::{parse, error::ErrorCode};
///
/// let result = parse("{\"a\": 1,}");
///
/// assert!(result.value().is_none());
/// assert_eq!(result.diagnostics()[0].code(), Some(ErrorCode::E100));
/// ```
pub fn parse(source: &str) -> ParseResult {
    let line_index = LineIndex::new(source);
    let mut collector = DiagnosticCollector::new();

    let tree = build(source, &mut collector);
    let value = tree
        .as_ref()
        .filter(|_| !collector.has_errors())
        .map(JsonNode::to_value);
    let diagnostics = collector.into_diagnostics();

    debug!(
        bytes = source.len(),
        lines = line_index.line_count(),
        diagnostics = diagnostics.len(),
        valid = value.is_some();
        "Parsed document"
    );

    ParseResult {
        tree,
        value,
        diagnostics,
        line_index,
    }
}

fn build(source: &str, collector: &mut DiagnosticCollector) -> Option<JsonNode> {
    // Step 1: Tokenize
    let tokens = match lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            err.into_diagnostics()
                .into_iter()
                .for_each(|d| collector.emit(d));
            return None;
        }
    };

    // Step 2: Parse
    let (tree, consumed) = match parser::build_tree(&tokens, source.len()) {
        Ok(parsed) => parsed,
        Err(diagnostic) => {
            collector.emit(diagnostic);
            return None;
        }
    };

    // Step 3: Trailing content
    if let Some(diagnostic) = parser::trailing_content(&tokens[consumed..]) {
        collector.emit(diagnostic);
    }

    // Step 4: Validate
    validate::validate_tree(&tree)
        .into_iter()
        .for_each(|d| collector.emit(d));

    Some(tree)
}

