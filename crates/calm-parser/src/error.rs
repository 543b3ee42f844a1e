//! Diagnostics produced while parsing a JSON document.
//!
//! Every lexical or syntactic problem becomes a [`Diagnostic`] carrying an
//! [`ErrorCode`], a severity and one or more labeled byte spans. Parsing never
//! aborts on the first problem: the lexer recovers and keeps going, so a
//! single document may yield many diagnostics. They are wrapped in a
//! [`ParseError`] when a caller needs a `std::error::Error`.
//!
//! # Example
//!
//! ```
//! # use calm_parser::error::{Diagnostic, ErrorCode};
//! # use calm_parser::Span;
//!
//! let diag = Diagnostic::warning("duplicate key `nodes`")
//!     .with_code(ErrorCode::E103)
//!     .with_label(Span::new(40..47), "duplicate key")
//!     .with_secondary_label(Span::new(2..9), "first defined here")
//!     .with_help("the last occurrence wins");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
