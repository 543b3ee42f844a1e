//! Parser for JSON tokens.
//!
//! This module turns the token stream from the [`lexer`](super::lexer) into
//! a [`JsonNode`] tree. JSON needs one token of lookahead, so every failure
//! is final: the parser stops at the first syntax error and reports the
//! token it could not accept. The entry point is [`build_tree`].

use winnow::{
    Parser as _,
    combinator::{opt, peek},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
    tree::{JsonNode, Member, NodeKind},
};

/// Maximum nesting of arrays and objects.
pub(crate) const MAX_DEPTH: usize = 128;

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what the parser expected at the failure position
    Expected(&'static str),
    /// A number literal outside the range of `f64`
    NumberOutOfRange,
    /// A container opened beyond [`MAX_DEPTH`]
    TooDeep,
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

fn failure(context: Context) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(context);
    ErrMode::Cut(e)
}

fn peek_token<'src>(input: &mut Input<'src>) -> IResult<Option<&'src PositionedToken<'src>>> {
    opt(peek(any)).parse_next(input)
}

/// Consume the next token if `accept` holds for it.
fn eat<'src>(
    input: &mut Input<'src>,
    accept: impl Fn(&Token<'_>) -> bool,
) -> IResult<Option<&'src PositionedToken<'src>>> {
    opt(any.verify(|token: &PositionedToken<'_>| accept(&token.token))).parse_next(input)
}

/// Consume the next token, which must satisfy `accept`.
fn expect<'src>(
    input: &mut Input<'src>,
    accept: impl Fn(&Token<'_>) -> bool,
    expected: &'static str,
) -> IResult<&'src PositionedToken<'src>> {
    any.verify(|token: &PositionedToken<'_>| accept(&token.token))
        .parse_next(input)
        .map_err(|_: ErrMode<ContextError<Context>>| failure(Context::Expected(expected)))
}

fn parse_number(raw: &str) -> Option<serde_json::Number> {
    serde_json::from_str(raw).ok()
}

/// Parse a string, number, boolean or null.
fn scalar<'src>(input: &mut Input<'src>) -> IResult<JsonNode> {
    let checkpoint = input.checkpoint();
    let token = any
        .parse_next(input)
        .map_err(|_: ErrMode<ContextError<Context>>| failure(Context::Expected("a value")))?;

    let kind = match &token.token {
        Token::Null => NodeKind::Null,
        Token::True => NodeKind::Bool(true),
        Token::False => NodeKind::Bool(false),
        Token::String(s) => NodeKind::String(s.clone()),
        Token::Number(raw) => match parse_number(raw) {
            Some(number) => NodeKind::Number(number),
            None => {
                input.reset(&checkpoint);
                return Err(failure(Context::NumberOutOfRange));
            }
        },
        _ => {
            input.reset(&checkpoint);
            return Err(failure(Context::Expected("a value")));
        }
    };

    Ok(JsonNode::new(kind, token.span))
}

/// Parse an object key
fn object_key<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::String(key) => Some(Spanned::new(key.clone(), token.span)),
        _ => None,
    })
    .parse_next(input)
    .map_err(|_: ErrMode<ContextError<Context>>| failure(Context::Expected("a string key")))
}

/// Parse `{ "key": value, ... }`
fn object<'src>(input: &mut Input<'src>, depth: usize) -> IResult<JsonNode> {
    if depth > MAX_DEPTH {
        return Err(failure(Context::TooDeep));
    }

    let open = expect(input, |t| matches!(t, Token::LeftBrace), "`{`")?.span;
    let mut members = Vec::new();

    if let Some(close) = eat(input, |t| matches!(t, Token::RightBrace))? {
        return Ok(JsonNode::new(NodeKind::Object(members), open.union(close.span)));
    }

    loop {
        let key = object_key(input)?;
        expect(input, |t| matches!(t, Token::Colon), "`:`")?;
        let value = value(input, depth)?;
        members.push(Member::new(key, value));

        let separator = expect(
            input,
            |t| matches!(t, Token::Comma | Token::RightBrace),
            "`,` or `}`",
        )?;
        if separator.token == Token::RightBrace {
            let span = open.union(separator.span);
            return Ok(JsonNode::new(NodeKind::Object(members), span));
        }
    }
}

/// Parse `[ value, ... ]`
fn array<'src>(input: &mut Input<'src>, depth: usize) -> IResult<JsonNode> {
    if depth > MAX_DEPTH {
        return Err(failure(Context::TooDeep));
    }

    let open = expect(input, |t| matches!(t, Token::LeftBracket), "`[`")?.span;
    let mut elements = Vec::new();

    if let Some(close) = eat(input, |t| matches!(t, Token::RightBracket))? {
        return Ok(JsonNode::new(NodeKind::Array(elements), open.union(close.span)));
    }

    loop {
        elements.push(value(input, depth)?);

        let separator = expect(
            input,
            |t| matches!(t, Token::Comma | Token::RightBracket),
            "`,` or `]`",
        )?;
        if separator.token == Token::RightBracket {
            let span = open.union(separator.span);
            return Ok(JsonNode::new(NodeKind::Array(elements), span));
        }
    }
}

/// Parse any JSON value at nesting level `depth`.
fn value<'src>(input: &mut Input<'src>, depth: usize) -> IResult<JsonNode> {
    let Some(next) = peek_token(input)? else {
        return Err(failure(Context::Expected("a value")));
    };

    match next.token {
        Token::LeftBrace => object(input, depth + 1),
        Token::LeftBracket => array(input, depth + 1),
        _ => scalar(input),
    }
}

/// Help text for common mistakes, keyed on what was expected and found.
fn help_for(expected: &str, found: &Token<'_>) -> Option<&'static str> {
    match (expected, found) {
        ("a string key", Token::RightBrace) | ("a value", Token::RightBracket) => {
            Some("trailing commas are not allowed in JSON")
        }
        ("`,` or `}`", _) => Some("object members are separated by `,`"),
        ("`,` or `]`", _) => Some("array elements are separated by `,`"),
        ("a string key", _) => Some("object keys must be double-quoted strings"),
        _ => None,
    }
}

/// Convert a parser failure at token `position` into a diagnostic.
fn convert_error(
    err: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    position: usize,
    source_len: usize,
) -> Diagnostic {
    let context = match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().next().cloned(),
        ErrMode::Incomplete(_) => None,
    };

    let Some(found) = tokens.get(position) else {
        let expected = match context {
            Some(Context::Expected(expected)) => expected,
            _ => "a value",
        };
        let mut diag = Diagnostic::error(format!("unexpected end of input, expected {expected}"))
            .with_code(ErrorCode::E101)
            .with_label(Span::new(source_len..source_len), format!("expected {expected}"));
        if let Some(first) = tokens.first() {
            diag = diag.with_secondary_label(first.span, "value starts here");
        }
        return diag;
    };

    match context {
        Some(Context::TooDeep) => {
            Diagnostic::error(format!("nesting deeper than {MAX_DEPTH} levels"))
                .with_code(ErrorCode::E104)
                .with_label(found.span, "too deeply nested")
        }
        Some(Context::NumberOutOfRange) => Diagnostic::error("number out of range")
            .with_code(ErrorCode::E007)
            .with_label(found.span, ErrorCode::E007.description())
            .with_help("numbers must fit in a 64-bit float"),
        Some(Context::Expected(expected)) => unexpected_token(expected, found),
        None => unexpected_token("a value", found),
    }
}

fn unexpected_token(expected: &'static str, found: &PositionedToken<'_>) -> Diagnostic {
    let mut diag = Diagnostic::error(format!("expected {expected}, found {}", found.token))
        .with_code(ErrorCode::E100)
        .with_label(found.span, format!("expected {expected}"));
    if let Some(help) = help_for(expected, &found.token) {
        diag = diag.with_help(help);
    }
    diag
}

/// Parse one JSON value from the start of `tokens`.
///
/// Returns the value and the number of tokens it spans. Tokens after the
/// value are left for the caller to report.
pub(crate) fn build_tree(
    tokens: &[PositionedToken<'_>],
    source_len: usize,
) -> Result<(JsonNode, usize)> {
    let mut input = TokenSlice::new(tokens);

    let result = value(&mut input, 0);
    let position = tokens.len() - input.eof_offset();

    result
        .map(|node| (node, position))
        .map_err(|err| convert_error(err, tokens, position, source_len))
}

/// Report tokens left after the top-level value.
pub(crate) fn trailing_content(rest: &[PositionedToken<'_>]) -> Option<Diagnostic> {
    let (first, last) = (rest.first()?, rest.last()?);

    Some(
        Diagnostic::error(format!("unexpected {} after the document value", first.token))
            .with_code(ErrorCode::E102)
            .with_label(first.span.union(last.span), "trailing content")
            .with_help("a JSON document holds exactly one top-level value"),
    )
}
