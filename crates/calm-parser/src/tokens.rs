//! Token types produced by the lexer.

use std::fmt;

use crate::span::Span;

/// A JSON token.
///
/// Whitespace is not tokenized. Numbers keep their source text so that the
/// parser can decide how to represent them without losing precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    /// A string literal with escapes already decoded.
    String(String),
    /// A number literal as written in the source.
    Number(&'a str),
    True,
    False,
    Null,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftBrace => write!(f, "`{{`"),
            Token::RightBrace => write!(f, "`}}`"),
            Token::LeftBracket => write!(f, "`[`"),
            Token::RightBracket => write!(f, "`]`"),
            Token::Colon => write!(f, "`:`"),
            Token::Comma => write!(f, "`,`"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Number(raw) => write!(f, "number `{raw}`"),
            Token::True => write!(f, "`true`"),
            Token::False => write!(f, "`false`"),
            Token::Null => write!(f, "`null`"),
        }
    }
}

/// A token with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_display() {
        assert_eq!(Token::LeftBrace.to_string(), "`{`");
        assert_eq!(Token::String("id".into()).to_string(), "string \"id\"");
        assert_eq!(Token::Number("-1.5e3").to_string(), "number `-1.5e3`");
    }
}
