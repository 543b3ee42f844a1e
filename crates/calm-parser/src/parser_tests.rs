//! Unit tests for the token parser and the parse pipeline
//!
//! These tests cover tree shapes and spans for valid documents, and the
//! code and position of the diagnostic for each kind of malformed input.

use calm_core::path::{JsonPath, PathSegment};
use serde_json::json;

use crate::{
    Position, Range, Span, lexer, parse,
    error::ErrorCode,
    parser::{self, MAX_DEPTH},
    tree::NodeKind,
};

/// Helper function to parse a source string into a tree
fn build(source: &str) -> Result<crate::JsonNode, String> {
    let tokens = lexer::tokenize(source).map_err(|err| format!("Lexer error: {err}"))?;
    let (tree, consumed) = parser::build_tree(&tokens, source.len())
        .map_err(|err| format!("Parser error: {err}"))?;
    assert_eq!(consumed, tokens.len(), "unexpected trailing tokens");
    Ok(tree)
}

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) {
    if let Err(e) = build(source) {
        panic!("Expected parsing to succeed, but got error: {e}");
    }
}

/// Codes of all diagnostics produced by the full pipeline
fn codes(source: &str) -> Vec<ErrorCode> {
    parse(source)
        .diagnostics()
        .iter()
        .filter_map(|d| d.code())
        .collect()
}

/// Span of the first diagnostic's primary label
fn first_error_span(source: &str) -> Span {
    parse(source).diagnostics()[0]
        .primary_span()
        .expect("diagnostic should have a primary label")
}

fn path(segments: &[&str]) -> JsonPath {
    segments
        .iter()
        .map(|segment| match segment.parse::<usize>() {
            Ok(index) => PathSegment::from(index),
            Err(_) => PathSegment::from(*segment),
        })
        .collect()
}

#[test]
fn test_scalars() {
    for source in ["null", "true", "false", "0", "-1.5e3", "\"text\""] {
        assert_parses_successfully(source);
    }
}

#[test]
fn test_nested_containers() {
    assert_parses_successfully("{}");
    assert_parses_successfully("[]");
    assert_parses_successfully(r#"{"a": [1, {"b": []}, {}], "c": {"d": null}}"#);
    assert_parses_successfully("[[[[]]]]");
}

#[test]
fn test_container_spans_cover_delimiters() {
    let tree = build(r#" { "a" : [ 1 , 2 ] } "#).unwrap();

    assert_eq!(tree.span(), Span::new(1..20));
    let array = tree.member("a").unwrap();
    assert_eq!(array.span(), Span::new(9..18));
    assert_eq!(array.element(1).unwrap().span(), Span::new(15..16));
}

#[test]
fn test_member_key_spans() {
    let tree = build(r#"{"unique-id": "api"}"#).unwrap();

    let NodeKind::Object(members) = tree.kind() else {
        panic!("expected object");
    };
    assert_eq!(members[0].key().span(), Span::new(1..12));
    assert_eq!(members[0].value().span(), Span::new(14..19));
}

#[test]
fn test_value_matches_serde() {
    let source = r#"{"nodes": [{"unique-id": "a", "n": -0.5}], "flag": true, "none": null}"#;
    let result = parse(source);

    let expected: serde_json::Value = serde_json::from_str(source).unwrap();
    assert_eq!(result.value(), Some(&expected));
}

#[test]
fn test_object_member_order_is_preserved() {
    let result = parse(r#"{"z": 1, "a": 2, "m": 3}"#);

    let keys: Vec<_> = result
        .value()
        .and_then(|v| v.as_object())
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    assert_eq!(keys, ["z", "a", "m"]);
}

#[test]
fn test_range_for_path() {
    let source = "{\n  \"nodes\": [\n    {\"unique-id\": \"api\"},\n    {\"unique-id\": \"db\"}\n  ]\n}";
    let result = parse(source);

    assert_eq!(
        result.range_for_path(&path(&["nodes", "1"])),
        Some(Range::new(Position::new(3, 4), Position::new(3, 23)))
    );
    assert_eq!(
        result.range_for_path(&path(&["nodes", "1", "unique-id"])),
        Some(Range::new(Position::new(3, 18), Position::new(3, 22)))
    );
    assert_eq!(
        result.range_for_path(&JsonPath::root()),
        Some(Range::new(Position::new(0, 0), Position::new(5, 1)))
    );
}

#[test]
fn test_range_for_missing_path() {
    let result = parse(r#"{"nodes": []}"#);

    assert!(result.range_for_path(&path(&["nodes", "0"])).is_none());
    assert!(result.range_for_path(&path(&["relationships"])).is_none());
    assert!(result.range_for_path(&path(&["nodes", "x"])).is_none());
}

#[test]
fn test_crlf_positions() {
    let result = parse("{\r\n  \"a\": 1\r\n}");

    assert_eq!(
        result.range_for_path(&path(&["a"])),
        Some(Range::new(Position::new(1, 7), Position::new(1, 8)))
    );
}

#[test]
fn test_empty_document() {
    let result = parse("   \n ");

    assert!(result.value().is_none());
    assert!(result.tree().is_none());
    assert_eq!(codes("   \n "), [ErrorCode::E101]);
    assert!(result.error().is_some());
}

#[test]
fn test_missing_comma() {
    let source = r#"{"a": 1 "b": 2}"#;

    assert_eq!(codes(source), [ErrorCode::E100]);
    assert_eq!(first_error_span(source), Span::new(8..11));
}

#[test]
fn test_trailing_comma() {
    let result = parse("[1, 2,]");

    let diagnostic = &result.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
    assert_eq!(diagnostic.message(), "expected a value, found `]`");
    assert_eq!(
        diagnostic.help(),
        Some("trailing commas are not allowed in JSON")
    );
}

#[test]
fn test_unquoted_key() {
    assert_eq!(codes("{a: 1}"), [ErrorCode::E002]);
    assert_eq!(codes("{1: 1}"), [ErrorCode::E100]);
}

#[test]
fn test_incomplete_input() {
    let source = r#"{"a": [1, 2"#;

    assert_eq!(codes(source), [ErrorCode::E101]);
    assert_eq!(first_error_span(source), Span::new(11..11));
}

#[test]
fn test_trailing_content_keeps_tree() {
    let source = r#"{"a": 1} {"b": 2}"#;
    let result = parse(source);

    assert_eq!(codes(source), [ErrorCode::E102]);
    assert_eq!(first_error_span(source), Span::new(9..17));
    assert!(result.value().is_none());
    assert!(result.range_for_path(&path(&["a"])).is_some());
}

#[test]
fn test_duplicate_keys_warn_and_last_wins() {
    let source = r#"{"id": 1, "id": 2}"#;
    let result = parse(source);

    assert_eq!(codes(source), [ErrorCode::E103]);
    assert!(!result.has_errors());
    assert!(result.error().is_none());
    assert_eq!(result.value(), Some(&json!({"id": 2})));
    assert_eq!(
        result.range_for_path(&path(&["id"])),
        Some(Range::new(Position::new(0, 16), Position::new(0, 17)))
    );

    let labels = result.diagnostics()[0].labels();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels[0].span(), Span::new(10..14));
    assert_eq!(labels[1].span(), Span::new(1..5));
}

#[test]
fn test_duplicate_keys_in_nested_objects() {
    let source = r#"[{"a": 1, "a": 2}, {"b": {"c": 1, "c": 2}}]"#;

    assert_eq!(codes(source), [ErrorCode::E103, ErrorCode::E103]);
}

#[test]
fn test_number_out_of_range() {
    let source = "[1, 1e400]";

    assert_eq!(codes(source), [ErrorCode::E007]);
    assert_eq!(first_error_span(source), Span::new(4..9));
}

#[test]
fn test_nesting_limit() {
    let within = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
    let beyond = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);

    assert!(parse(&within).value().is_some());
    assert_eq!(codes(&beyond), [ErrorCode::E104]);
}

#[test]
fn test_lexer_errors_suppress_parsing() {
    let result = parse(r#"{"a": @, "b": #}"#);

    assert!(result.tree().is_none());
    assert_eq!(
        result
            .diagnostics()
            .iter()
            .filter(|d| d.severity().is_error())
            .count(),
        2
    );
}

#[test]
fn test_parse_error_display() {
    let error = parse("[1,,]").error().unwrap();

    assert_eq!(
        error.to_string(),
        "error[E100]: expected a value, found `,`"
    );
}
