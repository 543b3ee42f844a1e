//! Lexical analyzer for JSON source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace is consumed between tokens and never emitted.
//!
//! The entry point is [`tokenize`], which performs error-recovering lexical
//! analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::{digit0, digit1},
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, literal, none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Build a committed error carrying `diagnostic`.
fn lexer_error(
    input: &Input<'_>,
    diagnostic: LexerDiagnostic,
) -> ErrMode<ContextError<LexerDiagnostic>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), diagnostic))
}

/// Parse exactly four hex digits of a `\u` escape.
fn hex_quad<'a>(input: &mut Input<'a>, escape_start: usize) -> IResult<'a, u16> {
    take_while(4..=4, |c: char| c.is_ascii_hexdigit())
        .try_map(|hex: &str| u16::from_str_radix(hex, 16))
        .context(LexerDiagnostic {
            code: ErrorCode::E004,
            message: "invalid unicode escape",
            help: Some("use exactly four hex digits: `\\u00e9`"),
            start: escape_start,
        })
        .parse_next(input)
}

/// Parse a unicode escape after the backslash, starting with `u`.
///
/// A high surrogate must be followed by a `\u` escape holding the matching
/// low surrogate; the pair decodes to one supplementary-plane character.
fn string_escape_unicode<'a>(input: &mut Input<'a>, escape_start: usize) -> IResult<'a, char> {
    'u'.parse_next(input)?;

    let first = cut_err(|i: &mut Input<'a>| hex_quad(i, escape_start)).parse_next(input)?;

    let code_point = match first {
        0xD800..=0xDBFF => {
            let second = cut_err(
                preceded("\\u", |i: &mut Input<'a>| hex_quad(i, escape_start))
                    .verify(|low: &u16| (0xDC00..=0xDFFF).contains(low)),
            )
            .context(LexerDiagnostic {
                code: ErrorCode::E005,
                message: "unpaired high surrogate in unicode escape",
                help: Some("follow `\\uD800`-`\\uDBFF` with a low surrogate `\\uDC00`-`\\uDFFF`"),
                start: escape_start,
            })
            .parse_next(input)?;
            0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
        }
        _ => u32::from(first),
    };

    // Only a lone low surrogate is left unrepresentable here.
    char::from_u32(code_point).ok_or_else(|| {
        lexer_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E005,
                message: "unpaired low surrogate in unicode escape",
                help: Some("a low surrogate `\\uDC00`-`\\uDFFF` must follow a high surrogate"),
                start: escape_start,
            },
        )
    })
}

/// Parse a standard escape character in a string after the backslash.
fn string_escape_char<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    alt((
        '"'.value('"'),
        '\\'.value('\\'),
        '/'.value('/'),
        'b'.value('\u{08}'),
        'f'.value('\u{0C}'),
        'n'.value('\n'),
        'r'.value('\r'),
        't'.value('\t'),
    ))
    .parse_next(input)
}

/// Parse an escape sequence in a string starting with backslash.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    let escape_start = input.current_token_start();

    '\\'.parse_next(input)?;

    match string_escape_unicode(input, escape_start) {
        Ok(ch) => return Ok(ch),
        Err(ErrMode::Backtrack(_)) => {}
        Err(e) => return Err(e),
    }

    if let Ok(ch) = string_escape_char(input) {
        return Ok(ch);
    }

    Err(lexer_error(
        input,
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some(
                "valid escapes: `\\\"`, `\\\\`, `\\/`, `\\b`, `\\f`, `\\n`, `\\r`, `\\t`, `\\uXXXX`",
            ),
            start: escape_start,
        },
    ))
}

fn peek_char<'a>(input: &mut Input<'a>) -> IResult<'a, Option<char>> {
    opt(peek(any)).parse_next(input)
}

/// Consume the closing quote of a string opened at `start_pos`.
///
/// Anything other than `"` here is either a raw control character or the
/// end of the line or input.
fn string_terminator<'a>(input: &mut Input<'a>, start_pos: usize) -> IResult<'a, ()> {
    match peek_char(input)? {
        Some('"') => '"'.void().parse_next(input),
        Some(c) if c < ' ' && c != '\n' && c != '\r' => {
            let control_start = input.current_token_start();
            input.next_token();
            Err(lexer_error(
                input,
                LexerDiagnostic {
                    code: ErrorCode::E006,
                    message: "control character in string",
                    help: Some("escape it, for example `\\t` or `\\u0000`"),
                    start: control_start,
                },
            ))
        }
        _ => Err(lexer_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E001,
                message: "unterminated string literal",
                help: Some("add closing `\"`"),
                start: start_pos,
            },
        )),
    }
}

/// Parse a complete string literal with double quotes.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    // Everything except quotes, backslashes and raw control characters
    let string_char = none_of(|c: char| c == '"' || c == '\\' || c < ' ');

    let mut string_content =
        repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        });

    let start_pos = input.current_token_start();

    '"'.parse_next(input)
        .map_err(|_: ErrMode<ContextError<LexerDiagnostic>>| {
            ErrMode::Backtrack(ContextError::new())
        })?;

    let content = string_content.parse_next(input)?;
    string_terminator(input, start_pos)?;

    Ok(Token::String(content))
}

/// Parse the integer part of a number: `0` or a digit sequence without a
/// leading zero.
fn integer_part<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    alt(('0'.void(), (one_of('1'..='9'), digit0).void())).parse_next(input)
}

/// Parse a number literal following the JSON grammar.
///
/// Once a sign, decimal point or exponent marker has been seen the literal
/// is committed and a missing digit sequence is reported as `E007`.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let invalid = LexerDiagnostic {
        code: ErrorCode::E007,
        message: "invalid number literal",
        help: Some("`-`, `.` and the exponent marker must be followed by digits"),
        start: input.current_token_start(),
    };

    (
        alt((
            preceded('-', cut_err(integer_part).context(invalid.clone())),
            integer_part,
        )),
        opt(preceded('.', cut_err(digit1).context(invalid.clone()))),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['+', '-'])),
            cut_err(digit1).context(invalid),
        )),
    )
        .take()
        .map(Token::Number)
        .parse_next(input)
}

/// Parse `true`, `false` and `null` with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        alt((
            literal("true").value(Token::True),
            literal("false").value(Token::False),
            literal("null").value(Token::Null),
        )),
        peek(not(one_of(|c: char| c.is_alphanumeric() || c == '_'))),
    )
    .parse_next(input)
}

/// Report a run of word characters as one error instead of one per
/// character.
fn bare_word<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();

    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)?;

    Err(lexer_error(
        input,
        LexerDiagnostic {
            code: ErrorCode::E002,
            message: "unexpected identifier",
            help: Some("strings must be double-quoted; literals are `true`, `false` and `null`"),
            start,
        },
    ))
}

/// Parse single character tokens
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ':'.value(Token::Colon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// Skip JSON whitespace, plus a byte-order mark.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    take_while(0.., [' ', '\t', '\n', '\r', '\u{FEFF}'])
        .void()
        .parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        punctuation,
        string_literal,
        number_literal,
        keyword,   // Must come before bare_word
        bare_word, // Always fails, with a diagnostic
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();

    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Skip the rest of a string after an error inside it, up to and including
/// the closing quote, or up to the end of the line.
fn skip_string_remainder(input: &mut Input<'_>) {
    while let Some(c) = peek_char(input).ok().flatten() {
        if c == '\n' || c == '\r' {
            return;
        }
        input.next_token();
        match c {
            '"' => return,
            '\\' => {
                input.next_token();
            }
            _ => {}
        }
    }
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        loop {
            // Whitespace never fails
            let _ = whitespace(&mut input);
            if input.is_empty() {
                break;
            }

            let token_start = input.current_token_start();
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    let code = diagnostic.code();
                    self.diagnostics.emit(diagnostic);
                    Self::recover(&mut input, code, token_start);
                }
            }
        }
    }

    /// Move past a lexical error so tokenizing can continue.
    ///
    /// Errors inside a string skip the remainder of that string so its
    /// closing quote is not mistaken for the start of a new one. Otherwise
    /// the lexer resumes where the error ended, skipping one character if
    /// nothing was consumed.
    fn recover(input: &mut Input<'a>, code: Option<ErrorCode>, token_start: usize) {
        match code {
            Some(ErrorCode::E003 | ErrorCode::E004 | ErrorCode::E005 | ErrorCode::E006) => {
                skip_string_remainder(input);
            }
            _ if input.current_token_start() == token_start && !input.is_empty() => {
                input.next_token();
            }
            _ => {}
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|_| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info
    /// with code, message, and help. Falls back to E002 (unexpected character)
    /// if no diagnostic context is found.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        // The innermost context is pushed first
        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let end = error_pos.max(start.saturating_add(1));
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..end), code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize JSON source, collecting every lexical error.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully lexed
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}
