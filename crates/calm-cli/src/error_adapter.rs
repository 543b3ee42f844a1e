//! Adapters for rendering CALM errors and findings as miette diagnostics.
//!
//! This module provides the bridge between the library's plain error and
//! outcome types and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! When a [`calm_parser::error::ParseError`] contains multiple diagnostics, each
//! diagnostic is rendered independently. Validation findings are rendered one
//! per [`ValidationOutput`], labelled at their location in the document they
//! refer to.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use calm::{
    CalmError, ValidationReport,
    context::ParsedDocumentContext,
    outcome::{Severity, SourceLocation, ValidationOutput},
};
use calm_parser::{Position, error::Diagnostic};

/// Adapter for a single parser diagnostic.
///
/// This adapter wraps a single [`Diagnostic`] and implements
/// [`MietteDiagnostic`] to enable rich error formatting in the CLI.
pub struct DiagnosticAdapter<'a> {
    /// The wrapped diagnostic
    diag: &'a Diagnostic,
    /// Source code for displaying snippets
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        if self.diag.severity().is_warning() {
            Some(miette::Severity::Warning)
        } else {
            Some(miette::Severity::Error)
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for a single validation finding.
///
/// When the finding carries a location and its document is known, the
/// snippet of that document is shown with the located value labelled.
pub struct OutputAdapter<'a> {
    output: &'a ValidationOutput,
    src: Option<&'a str>,
    span: Option<SourceSpan>,
}

impl<'a> OutputAdapter<'a> {
    /// Create a new output adapter; `context` is the document the output's
    /// location refers to.
    pub fn new(output: &'a ValidationOutput, context: Option<&'a ParsedDocumentContext>) -> Self {
        let span = context.zip(output.location()).and_then(|(context, location)| {
            location_to_miette(context, location)
        });
        Self {
            output,
            src: context.map(ParsedDocumentContext::source),
            span,
        }
    }
}

impl fmt::Debug for OutputAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputAdapter")
            .field("output", &self.output)
            .field("span", &self.span)
            .finish()
    }
}

impl fmt::Display for OutputAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output.message())
    }
}

impl std::error::Error for OutputAdapter<'_> {}

impl MietteDiagnostic for OutputAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.output.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        let severity = match self.output.severity() {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Info | Severity::Hint => miette::Severity::Advice,
        };
        Some(severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let path = self.output.path();
        let help = match (self.output.source(), self.output.schema_path()) {
            (Some(source), Some(schema_path)) => {
                format!("in {source} at {path} (schema: {schema_path})")
            }
            (Some(source), None) => format!("in {source} at {path}"),
            (None, Some(schema_path)) => format!("at {path} (schema: {schema_path})"),
            (None, None) if path.is_empty() => return None,
            (None, None) => format!("at {path}"),
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.span?;
        self.src.as_ref().map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        let label = LabeledSpan::new_primary_with_span(Some(self.output.severity().to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for non-diagnostic [`CalmError`] variants.
///
/// This adapter handles errors that don't have rich diagnostic information,
/// such as I/O errors, schema errors and configuration errors.
pub struct ErrorAdapter<'a>(pub &'a CalmError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CalmError::Io(_) => "calm::io",
            CalmError::Parse { .. } => return None,
            CalmError::Schema(_) => "calm::schema",
            CalmError::Config(_) => "calm::config",
            CalmError::Input(_) => "calm::input",
            CalmError::Json(_) => "calm::json",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            CalmError::Input(_) => Some(Box::new("pass --architecture and/or --pattern")),
            CalmError::Schema(_) => Some(Box::new(
                "check that --schema-directory holds every schema the pattern references",
            )),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error or finding that can be rendered by miette.
///
/// This enum wraps a parser diagnostic, a validation finding or a
/// non-diagnostic error, providing a uniform interface for rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parser diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A validation finding.
    Output(OutputAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Output(o) => fmt::Display::fmt(o, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) | Reportable::Output(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Output(o) => o.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Output(o) => o.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Output(o) => o.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Output(o) => o.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Output(o) => o.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a parser [`Span`](calm_parser::Span) to a miette [`SourceSpan`].
fn span_to_miette(span: calm_parser::Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a 1-based line, UTF-16 character location to a byte span of the
/// document.
fn location_to_miette(
    context: &ParsedDocumentContext,
    location: SourceLocation,
) -> Option<SourceSpan> {
    let index = context.parse_result().line_index();
    let start = index.offset(Position::new(
        location.line_start.checked_sub(1)?,
        location.character_start,
    ))?;
    let end = index.offset(Position::new(
        location.line_end.checked_sub(1)?,
        location.character_end,
    ))?;
    Some(SourceSpan::new(start.into(), end.saturating_sub(start)))
}

/// Convert a [`CalmError`] into a list of reportable errors.
///
/// For [`CalmError::Parse`], this returns one [`Reportable`] for
/// each diagnostic in the error. For other error variants, this returns a
/// single [`Reportable`].
pub fn to_reportables(err: &CalmError) -> Vec<Reportable<'_>> {
    match err {
        CalmError::Parse {
            err: parse_err,
            src,
            ..
        } => parse_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Convert every finding of a validation report into a [`Reportable`].
pub fn report_reportables(report: &ValidationReport) -> Vec<Reportable<'_>> {
    report
        .outcome()
        .all_validation_outputs()
        .map(|output| Reportable::Output(OutputAdapter::new(output, report.context_of(output))))
        .collect()
}
