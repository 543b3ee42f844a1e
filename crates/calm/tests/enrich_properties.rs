use calm::{
    context::{ARCHITECTURE, DocumentContexts, parse_document_with_positions},
    enrich_with_document_positions,
    outcome::{ValidationOutcome, ValidationOutput},
    pointer::resolve_pointer,
};
use calm_parser::Position;
use proptest::prelude::*;
use serde_json::{Value, json};

// ===================
// Strategies
// ===================

fn node(id: Option<String>, ports: Vec<u16>) -> Value {
    let interfaces: Vec<Value> = ports
        .into_iter()
        .enumerate()
        .map(|(index, port)| json!({ "unique-id": format!("if-{index}"), "port": port }))
        .collect();
    match id {
        Some(id) => json!({ "unique-id": id, "interfaces": interfaces }),
        None => json!({ "interfaces": interfaces }),
    }
}

fn architecture() -> impl Strategy<Value = Value> {
    prop::collection::vec(
        (
            prop::option::of("[a-z][a-z0-9-]{0,6}"),
            prop::collection::vec(any::<u16>(), 0..3),
        ),
        0..6,
    )
    .prop_map(|nodes| {
        let nodes: Vec<Value> = nodes
            .into_iter()
            .map(|(id, ports)| node(id, ports))
            .collect();
        json!({ "nodes": nodes, "relationships": [] })
    })
}

/// Pointers into the document, valid or not.
fn pointers() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            (0usize..7).prop_map(|n| format!("/nodes/{n}")),
            (0usize..7, 0usize..3).prop_map(|(n, i)| format!("/nodes/{n}/interfaces/{i}/port")),
            (0usize..7).prop_map(|n| format!("/nodes/{n}/unique-id")),
            "/[a-z]{1,5}(/[a-z0-9]{1,3}){0,2}",
            Just(String::new()),
            Just("/".to_string()),
        ],
        0..10,
    )
}

// ===================
// Property Test Functions
// ===================

fn enrich(outcome: &mut ValidationOutcome, source: &str) -> DocumentContexts {
    let contexts: DocumentContexts = parse_document_with_positions(source, ARCHITECTURE)
        .into_iter()
        .collect();
    enrich_with_document_positions(&mut *outcome, &contexts);
    contexts
}

/// A second enrichment pass changes nothing, and every located output
/// points at the text of the value its path addresses.
fn check_enrichment(doc: &Value, pointers: &[String], pretty: bool) -> Result<(), TestCaseError> {
    let source = if pretty {
        serde_json::to_string_pretty(doc)
    } else {
        serde_json::to_string(doc)
    }
    .map_err(|e| TestCaseError::fail(e.to_string()))?;

    let outputs = pointers
        .iter()
        .map(|pointer| ValidationOutput::error("json-schema", "invalid", pointer.as_str()))
        .collect();
    let mut outcome = ValidationOutcome::new(outputs, Vec::new());

    let contexts = enrich(&mut outcome, &source);
    let once = outcome.clone();
    enrich(&mut outcome, &source);
    prop_assert_eq!(&outcome, &once);

    let Some(context) = contexts.architecture() else {
        return Err(TestCaseError::fail("missing context"));
    };
    let index = context.parse_result().line_index();
    for output in outcome.all_validation_outputs() {
        let Some(location) = output.location() else {
            continue;
        };
        let expected = resolve_pointer(output.path(), doc).ok_or_else(|| {
            TestCaseError::fail(format!("{} is located but unresolved", output.path()))
        })?;

        let start = index.offset(Position::new(
            location.line_start - 1,
            location.character_start,
        ));
        let end = index.offset(Position::new(
            location.line_end - 1,
            location.character_end,
        ));
        let (Some(start), Some(end)) = (start, end) else {
            return Err(TestCaseError::fail("location outside the text"));
        };
        let located: Value = serde_json::from_str(&source[start..end])
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&located, expected);
    }
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn enrichment_is_idempotent_and_accurate(
        doc in architecture(),
        pointers in pointers(),
        pretty in any::<bool>(),
    ) {
        check_enrichment(&doc, &pointers, pretty)?;
    }
}
