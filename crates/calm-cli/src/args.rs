//! Command-line argument definitions for the CALM CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the documents to validate, the output
//! format and destination, configuration file selection, and logging
//! verbosity.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the CALM validation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate an architecture and/or a pattern
    Validate(ValidateArgs),

    /// List the options a pattern leaves open, as JSON
    Options(OptionsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Path to the architecture file
    #[arg(short, long)]
    pub architecture: Option<String>,

    /// Path to the pattern file
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Directory of schemas referenced by the pattern
    #[arg(short = 's', long)]
    pub schema_directory: Option<String>,

    /// Path to a JSON file of pattern choices to apply before validating
    #[arg(long)]
    pub choices: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Write the report to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<String>,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct OptionsArgs {
    /// Path to the pattern file
    #[arg(short, long)]
    pub pattern: String,
}

/// Report format of the `validate` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Annotated source snippets
    Pretty,
    /// The validation outcome as JSON
    Json,
}
