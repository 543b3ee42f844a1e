//! Error codes for parse diagnostics.
//!
//! Codes are grouped by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser and document checks

use std::fmt;

/// Error codes for categorizing parse diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but the line or the input ended
    /// before the closing quote.
    E001,

    /// Unexpected character.
    ///
    /// A character or bare word that cannot start any JSON token.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are: `\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t` and
    /// `\uXXXX`.
    E003,

    /// Invalid unicode escape.
    ///
    /// A `\u` escape was not followed by exactly four hexadecimal digits.
    E004,

    /// Lone surrogate.
    ///
    /// A `\u` escape encodes half of a UTF-16 surrogate pair without the
    /// other half.
    E005,

    /// Control character in string.
    ///
    /// Characters below U+0020 must be escaped inside strings.
    E006,

    /// Invalid number literal.
    ///
    /// A number with a dangling sign, decimal point or exponent, or a value
    /// outside the representable range.
    E007,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before the value was complete.
    E101,

    /// Trailing content.
    ///
    /// Tokens remain after the top-level value.
    E102,

    /// Duplicate object key.
    ///
    /// The same key appears more than once in one object. The last
    /// occurrence wins.
    E103,

    /// Nesting too deep.
    ///
    /// Arrays and objects are nested beyond the parser's depth limit.
    E104,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid unicode escape",
            ErrorCode::E005 => "lone surrogate",
            ErrorCode::E006 => "control character in string",
            ErrorCode::E007 => "invalid number literal",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "trailing content",
            ErrorCode::E103 => "duplicate object key",
            ErrorCode::E104 => "nesting too deep",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
