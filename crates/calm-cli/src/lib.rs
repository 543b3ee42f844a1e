//! CLI logic for the CALM validation tool.
//!
//! This module contains the core CLI logic: loading configuration and
//! documents, running the validation, and writing the report.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, OptionsArgs, OutputFormat, ValidateArgs};

use std::{
    fs,
    io::{self, Write as _},
};

use log::{debug, info};
use miette::{GraphicalReportHandler, GraphicalTheme};

use calm::{
    CalmError, ValidationBuilder, ValidationReport, config::AppConfig, options::CalmChoice,
    schema::SchemaDirectory,
};

use error_adapter::report_reportables;

/// Run the CALM CLI application
///
/// Returns the process exit status: `0` when validation passed, `1` when it
/// found errors (or warnings, in strict mode).
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CalmError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Schema loading and compilation errors
pub fn run(args: &Args) -> Result<i32, CalmError> {
    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Validate(validate_args) => validate(validate_args, app_config),
        Command::Options(options_args) => options(options_args),
    }
}

fn validate(args: &ValidateArgs, mut app_config: AppConfig) -> Result<i32, CalmError> {
    info!(
        architecture = args.architecture,
        pattern = args.pattern;
        "Validating documents"
    );

    // Command-line flags override the configuration file
    if args.strict {
        app_config.validation_mut().set_strict(true);
    }
    if let Some(dir) = &args.schema_directory {
        app_config.validation_mut().set_schema_directory(dir);
    }
    let strict = app_config.validation().strict();

    let schemas = match app_config.validation().schema_directory() {
        Some(dir) => SchemaDirectory::load(dir)?,
        None => SchemaDirectory::new(),
    };
    debug!(schemas = schemas.len(); "Loaded schema directory");

    let architecture = read_optional(args.architecture.as_deref())?;
    let pattern = read_optional(args.pattern.as_deref())?;
    let choices: Vec<CalmChoice> = match read_optional(args.choices.as_deref())? {
        Some(source) => serde_json::from_str(&source)?,
        None => Vec::new(),
    };

    let builder = ValidationBuilder::new(app_config)
        .with_schema_directory(schemas)
        .with_choices(choices);
    let report = builder.validate(architecture.as_deref(), pattern.as_deref())?;

    let rendered = match args.format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Pretty => render_pretty(&report, args.output.is_none())?,
    };
    write_output(args.output.as_deref(), &rendered)?;

    let code = report.exit_code(strict);
    info!(exit_code = code, strict; "Validation report written");
    Ok(code)
}

fn options(args: &OptionsArgs) -> Result<i32, CalmError> {
    info!(pattern = args.pattern; "Listing pattern options");

    let source = fs::read_to_string(&args.pattern)?;
    let options = ValidationBuilder::default().pattern_options(&source)?;
    write_output(None, &serde_json::to_string_pretty(&options)?)?;

    Ok(0)
}

fn read_optional(path: Option<&str>) -> Result<Option<String>, CalmError> {
    path.map(fs::read_to_string).transpose().map_err(CalmError::from)
}

fn write_output(path: Option<&str>, content: &str) -> Result<(), CalmError> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            info!(output_file = path; "Report exported successfully");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Render every finding as an annotated snippet, followed by a summary line.
fn render_pretty(report: &ValidationReport, color: bool) -> Result<String, CalmError> {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let reporter = GraphicalReportHandler::new_themed(theme);

    let mut out = String::new();
    for reportable in report_reportables(report) {
        reporter
            .render_report(&mut out, &reportable)
            .map_err(|_| CalmError::Input("failed to render report".to_string()))?;
    }

    let outcome = report.outcome();
    let errors = outcome
        .all_validation_outputs()
        .filter(|o| o.severity().is_error())
        .count();
    let warnings = outcome
        .all_validation_outputs()
        .filter(|o| o.severity().is_warning())
        .count();
    if errors == 0 && warnings == 0 {
        out.push_str("No issues found");
    } else {
        out.push_str(&format!("{errors} error(s), {warnings} warning(s)"));
    }

    Ok(out)
}
