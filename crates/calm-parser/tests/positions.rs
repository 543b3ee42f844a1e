use calm_core::path::JsonPath;
use calm_parser::parse;
use proptest::prelude::*;
use serde_json::Value;

// ===================
// Strategies
// ===================

fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9é😀 \\n\"\\\\/]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z~/-]{1,6}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Every path in `value`, paired with the value it addresses.
fn collect_paths<'v>(value: &'v Value, path: JsonPath, out: &mut Vec<(JsonPath, &'v Value)>) {
    match value {
        Value::Array(elements) => {
            for (index, element) in elements.iter().enumerate() {
                collect_paths(element, path.join(index), out);
            }
        }
        Value::Object(members) => {
            for (key, member) in members {
                collect_paths(member, path.join(key.as_str()), out);
            }
        }
        _ => {}
    }
    out.push((path, value));
}

// ===================
// Property Test Functions
// ===================

/// The span found for a path is exactly the source text of that value, and
/// the line/character range maps back to the same bytes.
fn check_spans_address_values(value: &Value, pretty: bool) -> Result<(), TestCaseError> {
    let source = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| TestCaseError::fail(e.to_string()))?;

    let result = parse(&source);
    prop_assert!(
        result.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        result.diagnostics()
    );
    prop_assert_eq!(result.value(), Some(value));

    let mut paths = Vec::new();
    collect_paths(value, JsonPath::root(), &mut paths);

    for (path, expected) in paths {
        let span = result
            .span_for_path(&path)
            .ok_or_else(|| TestCaseError::fail(format!("no span for {path}")))?;
        let text = &source[span.range()];
        let reparsed: Value =
            serde_json::from_str(text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&reparsed, expected, "span {} for {}", span, path);

        let range = result
            .range_for_path(&path)
            .ok_or_else(|| TestCaseError::fail(format!("no range for {path}")))?;
        let index = result.line_index();
        prop_assert_eq!(index.offset(range.start), Some(span.start()));
        prop_assert_eq!(index.offset(range.end), Some(span.end()));
    }
    Ok(())
}

/// Parsing arbitrary text never panics and yields a value only without
/// errors.
fn check_arbitrary_text(source: &str) -> Result<(), TestCaseError> {
    let result = parse(source);
    prop_assert_eq!(result.value().is_some(), !result.has_errors());
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn spans_address_values(value in json_strategy(), pretty in any::<bool>()) {
        check_spans_address_values(&value, pretty)?;
    }

    #[test]
    fn arbitrary_text_is_handled(source in "[\\[\\]{}:,\" a-z0-9\\\\\\n.-]{0,32}") {
        check_arbitrary_text(&source)?;
    }
}
