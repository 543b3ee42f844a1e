//! Parsed documents and the set of documents taking part in a validation run.
//!
//! A [`ParsedDocumentContext`] pairs the value of a document with the
//! positions of everything in it. Validators only see the value; the
//! enricher uses the positions to place their findings back in the text.

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use calm_parser::{ParseResult, parse};

/// Name of the architecture document context.
pub const ARCHITECTURE: &str = "architecture";

/// Name of the pattern document context.
pub const PATTERN: &str = "pattern";

/// One parsed document.
#[derive(Debug, Clone)]
pub struct ParsedDocumentContext {
    id: String,
    parse_result: ParseResult,
}

impl ParsedDocumentContext {
    /// The logical name of the document, e.g. [`ARCHITECTURE`].
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The document value, absent when the text was empty or malformed.
    pub fn data(&self) -> Option<&Value> {
        self.parse_result.value()
    }

    pub fn parse_result(&self) -> &ParseResult {
        &self.parse_result
    }

    /// The source text of the document.
    pub fn source(&self) -> &str {
        self.parse_result.source()
    }
}

/// Parse `content` into a context named `id`.
///
/// Malformed JSON does not fail the call: the context is returned with no
/// data and the syntax problems in its parse result. The function always
/// returns `Some`; the `Option` leaves room for parsers that can refuse
/// input outright.
pub fn parse_document_with_positions(
    content: &str,
    id: impl Into<String>,
) -> Option<ParsedDocumentContext> {
    let id = id.into();
    let parse_result = parse(content);

    debug!(
        document = id.as_str(),
        has_data = parse_result.value().is_some(),
        diagnostics = parse_result.diagnostics().len();
        "Created document context"
    );

    Some(ParsedDocumentContext { id, parse_result })
}

/// Document contexts of a validation run, keyed by id.
///
/// Insertion order is kept, so iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DocumentContexts {
    contexts: IndexMap<String, ParsedDocumentContext>,
}

impl DocumentContexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context, replacing any context with the same id.
    pub fn insert(&mut self, context: ParsedDocumentContext) {
        self.contexts.insert(context.id.clone(), context);
    }

    /// Returns the context with the given id.
    pub fn get(&self, id: &str) -> Option<&ParsedDocumentContext> {
        self.contexts.get(id)
    }

    pub fn architecture(&self) -> Option<&ParsedDocumentContext> {
        self.get(ARCHITECTURE)
    }

    pub fn pattern(&self) -> Option<&ParsedDocumentContext> {
        self.get(PATTERN)
    }

    /// Document a finding without a source tag belongs to.
    ///
    /// The architecture wins over the pattern; other contexts are never
    /// chosen implicitly.
    pub fn default_source(&self) -> Option<&str> {
        self.architecture()
            .or_else(|| self.pattern())
            .map(ParsedDocumentContext::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsedDocumentContext> {
        self.contexts.values()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl FromIterator<ParsedDocumentContext> for DocumentContexts {
    fn from_iter<T: IntoIterator<Item = ParsedDocumentContext>>(iter: T) -> Self {
        let mut contexts = Self::new();
        for context in iter {
            contexts.insert(context);
        }
        contexts
    }
}
