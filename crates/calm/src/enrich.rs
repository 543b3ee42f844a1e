//! Position enrichment of validation outputs.
//!
//! Validators report findings against document values, addressed by JSON
//! Pointer. [`enrich_with_document_positions`] maps each finding back onto
//! the text it came from:
//!
//! 1. pick the document: the output's `source`, else the architecture, else
//!    the pattern;
//! 2. resolve the pointer to a path and look up its line/character range;
//! 3. tag the output with the document it was resolved against;
//! 4. rewrite the pointer so array steps use `unique-id`s.
//!
//! Every step is best effort. An output that cannot be resolved keeps its
//! pointer and gets no location, and never affects the other outputs.
//! Enriching an already enriched outcome changes nothing.

use log::{debug, trace};

use calm_core::{
    outcome::{SourceLocation, ValidationOutcome, ValidationOutput},
    pointer::{pointer_to_json_path, rewrite_path_with_ids},
};
use calm_parser::Range;

use crate::context::{DocumentContexts, ParsedDocumentContext};

/// Attach source positions and stable paths to every output of `outcome`.
///
/// Passing `None` does nothing.
///
/// # Example
///
/// ```
/// # use calm::{context::{parse_document_with_positions, DocumentContexts}, enrich_with_document_positions};
/// # use calm_core::outcome::{ValidationOutcome, ValidationOutput};
/// let source = "{\n  \"relationships\": [\n    {\"unique-id\": \"rel-1\"},\n    {\"unique-id\": \"rel-2\"}\n  ]\n}";
/// let contexts: DocumentContexts = parse_document_with_positions(source, "architecture")
///     .into_iter()
///     .collect();
///
/// let mut outcome = ValidationOutcome::new(
///     vec![ValidationOutput::error("json-schema", "bad", "/relationships/1")],
///     Vec::new(),
/// );
/// enrich_with_document_positions(&mut outcome, &contexts);
///
/// let output = &outcome.structural_outputs()[0];
/// assert_eq!(output.path(), "/relationships/rel-2");
/// assert_eq!(output.source(), Some("architecture"));
/// assert_eq!(output.location().unwrap().line_start, 4);
/// ```
pub fn enrich_with_document_positions<'a>(
    outcome: impl Into<Option<&'a mut ValidationOutcome>>,
    contexts: &DocumentContexts,
) {
    let Some(outcome) = outcome.into() else {
        trace!("No outcome to enrich");
        return;
    };

    let mut total = 0;
    let mut located = 0;
    for output in outcome.all_validation_outputs_mut() {
        total += 1;
        if enrich_output(output, contexts) {
            located += 1;
        }
    }

    debug!(total, located; "Enriched validation outputs");
}

/// Enrich one output. Returns `true` if a location was attached.
fn enrich_output(output: &mut ValidationOutput, contexts: &DocumentContexts) -> bool {
    let Some(context) = context_for(output, contexts) else {
        trace!(code = output.code(), source = output.source(); "No document for output");
        return false;
    };
    if output.path().is_empty() {
        return false;
    }

    let data = context.data();
    let location = pointer_to_json_path(output.path(), data)
        .and_then(|path| context.parse_result().range_for_path(&path))
        .map(to_location);
    match location {
        Some(location) => output.set_location(location),
        None => trace!(path = output.path(), document = context.id(); "Path has no position"),
    }

    if output.source().is_none() {
        output.set_source(context.id());
    }

    if let Some(friendly) = rewrite_path_with_ids(output.path(), data) {
        if !friendly.is_empty() && friendly != output.path() {
            output.set_path(friendly);
        }
    }

    location.is_some()
}

/// The context an output refers to: its own tag, or the default document.
fn context_for<'c>(
    output: &ValidationOutput,
    contexts: &'c DocumentContexts,
) -> Option<&'c ParsedDocumentContext> {
    let source = output.source().or_else(|| contexts.default_source())?;
    contexts.get(source)
}

/// Lines become 1-based; characters stay 0-based.
fn to_location(range: Range) -> SourceLocation {
    SourceLocation {
        line_start: range.start.line.saturating_add(1),
        line_end: range.end.line.saturating_add(1),
        character_start: range.start.character,
        character_end: range.end.character,
    }
}
