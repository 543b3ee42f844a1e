use calm_core::{
    path::PathSegment,
    pointer::{escape_token, pointer_to_json_path, resolve_pointer, rewrite_path_with_ids},
};
use proptest::prelude::*;
use serde_json::{Value, json};

// ===================
// Strategies
// ===================

/// Distinct ids, including ones that need escaping. Ids never look like
/// indices.
fn distinct_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z][a-z0-9~/-]{0,5}", 1..8)
        .prop_map(|ids| ids.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// An array of elements, each optionally carrying one of the ids.
fn elements() -> impl Strategy<Value = Vec<Value>> {
    distinct_ids().prop_flat_map(|ids| {
        let len = ids.len();
        (Just(ids), prop::collection::vec(any::<bool>(), len)).prop_map(|(ids, keep)| {
            ids.into_iter()
                .zip(keep)
                .enumerate()
                .map(|(index, (id, keep))| {
                    if keep {
                        json!({ "unique-id": id, "n": index })
                    } else {
                        json!({ "n": index })
                    }
                })
                .collect()
        })
    })
}

// ===================
// Property Test Functions
// ===================

/// Rewriting `/arr/<i>` to ids and resolving it again reaches element `i`.
fn check_round_trip(items: Vec<Value>) -> Result<(), TestCaseError> {
    let doc = json!({ "arr": items });
    let len = doc["arr"].as_array().map_or(0, Vec::len);

    for index in 0..len {
        let pointer = format!("/arr/{index}");
        let rewritten = rewrite_path_with_ids(&pointer, Some(&doc))
            .ok_or_else(|| TestCaseError::fail("rewrite failed"))?;

        match doc["arr"][index].get("unique-id").and_then(Value::as_str) {
            Some(id) => prop_assert_eq!(&rewritten, &format!("/arr/{}", escape_token(id))),
            None => prop_assert_eq!(&rewritten, &pointer),
        }

        let path = pointer_to_json_path(&rewritten, Some(&doc))
            .ok_or_else(|| TestCaseError::fail(format!("{rewritten} did not resolve")))?;
        prop_assert_eq!(
            path.segments(),
            &[PathSegment::from("arr"), PathSegment::from(index)]
        );
        prop_assert_eq!(resolve_pointer(&rewritten, &doc), Some(&doc["arr"][index]));
    }
    Ok(())
}

/// Rewriting a rewritten pointer changes nothing.
fn check_rewrite_fixed_point(items: Vec<Value>, tail: &str) -> Result<(), TestCaseError> {
    let doc = json!({ "arr": items });
    let len = doc["arr"].as_array().map_or(0, Vec::len);

    for index in 0..len {
        let pointer = format!("/arr/{index}/{tail}");
        let once = rewrite_path_with_ids(&pointer, Some(&doc));
        let twice = once
            .as_deref()
            .and_then(|rewritten| rewrite_path_with_ids(rewritten, Some(&doc)));
        prop_assert_eq!(once, twice);
    }
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn round_trip_addressing(items in elements()) {
        check_round_trip(items)?;
    }

    #[test]
    fn rewrite_is_a_fixed_point(items in elements(), tail in "[a-z0-9]{1,4}") {
        check_rewrite_fixed_point(items, &tail)?;
    }
}
