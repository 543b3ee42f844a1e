//! JSON-Pointer resolution with `unique-id` aware array addressing.
//!
//! Validators report locations as RFC 6901 pointers with positional array
//! indices (`/nodes/1/node-type`). CALM documents identify array elements by
//! their `unique-id`, so this module reconciles the two addressing schemes:
//!
//! - [`pointer_to_json_path`] turns a pointer into a [`JsonPath`] usable for
//!   source-position lookup. Array tokens are matched against `unique-id`
//!   first and fall back to a positional index.
//! - [`rewrite_path_with_ids`] turns a pointer into a stable one where every
//!   array step is replaced by the `unique-id` of the element it reaches.
//!
//! Both are driven by the same traversal, so a pointer rewritten by
//! one always resolves to the same element through the other.
//!
//! # Example
//!
//! ```
//! # use calm_core::pointer::{pointer_to_json_path, rewrite_path_with_ids};
//! # use calm_core::path::PathSegment;
//! let doc = serde_json::json!({
//!     "nodes": [{ "unique-id": "web" }, { "unique-id": "db" }]
//! });
//!
//! let rewritten = rewrite_path_with_ids("/nodes/1", Some(&doc)).unwrap();
//! assert_eq!(rewritten, "/nodes/db");
//!
//! let path = pointer_to_json_path(&rewritten, Some(&doc)).unwrap();
//! assert_eq!(path.segments(), &[PathSegment::from("nodes"), PathSegment::from(1)]);
//! ```

use std::borrow::Cow;

use log::trace;
use serde_json::Value;

use crate::{
    UNIQUE_ID,
    path::{JsonPath, PathSegment},
};

/// Unescape a single pointer token (`~1` to `/`, then `~0` to `~`).
pub fn unescape_token(token: &str) -> Cow<'_, str> {
    if token.contains('~') {
        Cow::Owned(token.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Escape a string for use as a pointer token (`~` to `~0`, then `/` to `~1`).
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Split a pointer into unescaped tokens.
///
/// The leading `/` is discarded. Both `""` and `"/"` denote the root and
/// yield no tokens.
pub fn pointer_tokens(pointer: &str) -> Vec<String> {
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('/')
        .map(|token| unescape_token(token).into_owned())
        .collect()
}

/// Parse a token as a base-10 array index.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Returns the string `unique-id` of a value, if it has one.
pub fn unique_id(value: &Value) -> Option<&str> {
    value.get(UNIQUE_ID).and_then(Value::as_str)
}

/// Find the array element addressed by `token`.
///
/// An element whose `unique-id` equals the token wins; otherwise the token
/// must be an in-range integer index.
fn resolve_element<'v>(items: &'v [Value], token: &str) -> Option<(usize, &'v Value)> {
    items
        .iter()
        .position(|item| unique_id(item) == Some(token))
        .or_else(|| parse_index(token).filter(|index| *index < items.len()))
        .map(|index| (index, &items[index]))
}

/// The `unique-id` of `items[index]`, unless an earlier element has the
/// same id and would be found first.
fn stable_id(items: &[Value], index: usize) -> Option<&str> {
    let id = unique_id(items.get(index)?)?;
    let first = items.iter().position(|item| unique_id(item) == Some(id))?;
    (first == index).then_some(id)
}

/// Outcome of resolving one pointer token.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step<'v> {
    /// The token selected an array element. Carries the element's
    /// `unique-id` when that id addresses the same element.
    Element(usize, &'v Value, Option<&'v str>),
    /// The token was used as an object key; the member may be missing.
    Member(Option<&'v Value>),
    /// The token matched neither a `unique-id` nor an index of the array.
    Unresolved,
    /// There is no node to step into at this depth.
    Detached,
}

/// Resolve every token against `data`, one [`Step`] per token.
fn walk<'v>(tokens: &[String], data: &'v Value) -> Vec<Step<'v>> {
    let mut current = Some(data);
    tokens
        .iter()
        .map(|token| {
            let step = match current {
                Some(Value::Array(items)) => match resolve_element(items, token) {
                    Some((index, item)) => Step::Element(index, item, stable_id(items, index)),
                    None => Step::Unresolved,
                },
                Some(Value::Object(members)) => Step::Member(members.get(token.as_str())),
                _ => Step::Detached,
            };
            current = match step {
                Step::Element(_, item, _) => Some(item),
                Step::Member(member) => member,
                Step::Unresolved | Step::Detached => None,
            };
            step
        })
        .collect()
}

/// Returns the document if it can be walked (absent and `null` cannot).
fn walkable(data: Option<&Value>) -> Option<&Value> {
    data.filter(|value| !value.is_null())
}

/// Convert a JSON Pointer into a [`JsonPath`] for position lookup.
///
/// Returns `None` when an array token matches neither an element's
/// `unique-id` nor an in-range index. Object tokens are always literal keys.
/// Without a document, numeric tokens become indices and everything else a key.
pub fn pointer_to_json_path(pointer: &str, data: Option<&Value>) -> Option<JsonPath> {
    let tokens = pointer_tokens(pointer);

    let Some(data) = walkable(data) else {
        return Some(
            tokens
                .into_iter()
                .map(|token| match parse_index(&token) {
                    Some(index) => PathSegment::Index(index),
                    None => PathSegment::Key(token),
                })
                .collect(),
        );
    };

    let steps = walk(&tokens, data);
    let mut path = JsonPath::root();
    for (token, step) in tokens.into_iter().zip(steps) {
        match step {
            Step::Element(index, _, _) => path.push(index),
            Step::Member(_) | Step::Detached => path.push(token),
            Step::Unresolved => {
                trace!(pointer, token = token.as_str(); "Array token did not resolve");
                return None;
            }
        }
    }
    Some(path)
}

/// Rewrite a JSON Pointer so array steps use element `unique-id`s.
///
/// Array steps that reach an element with a string `unique-id` emit that id,
/// unless an earlier element shares it; every other token is kept as it was. Tokens past the point where the walk
/// leaves the document are kept too, so the result is never shorter than the
/// input. Returns `None` only when there is no document.
pub fn rewrite_path_with_ids(pointer: &str, data: Option<&Value>) -> Option<String> {
    let data = walkable(data)?;
    let tokens = pointer_tokens(pointer);
    if tokens.is_empty() {
        return Some("/".to_string());
    }

    let steps = walk(&tokens, data);
    let mut rewritten = String::with_capacity(pointer.len() + 1);
    for (token, step) in tokens.iter().zip(steps) {
        let segment = match step {
            Step::Element(_, _, id) => id.unwrap_or(token.as_str()),
            Step::Member(_) | Step::Unresolved | Step::Detached => token.as_str(),
        };
        rewritten.push('/');
        rewritten.push_str(&escape_token(segment));
    }
    Some(rewritten)
}

/// Resolve a JSON Pointer to the value it addresses.
pub fn resolve_pointer<'v>(pointer: &str, data: &'v Value) -> Option<&'v Value> {
    let tokens = pointer_tokens(pointer);
    let steps = walk(&tokens, data);
    match steps.last().copied() {
        None => Some(data),
        Some(Step::Element(_, item, _)) => Some(item),
        Some(Step::Member(member)) => member,
        Some(Step::Unresolved | Step::Detached) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn keys_and_indices(path: &JsonPath) -> Vec<String> {
        path.segments().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_tokens_unescape() {
        assert_eq!(pointer_tokens("/a~1b/m~0n/~01"), vec!["a/b", "m~n", "~1"]);
        assert!(pointer_tokens("").is_empty());
        assert!(pointer_tokens("/").is_empty());
        assert_eq!(pointer_tokens("/a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_escape_unescape_inverse() {
        for raw in ["plain", "a/b", "~", "~1", "x~/y"] {
            assert_eq!(unescape_token(&escape_token(raw)), raw);
        }
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1a"), None);
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn test_pointer_to_json_path_by_index() {
        let doc = json!({ "nodes": [{ "name": "a" }, { "name": "b" }] });

        let path = pointer_to_json_path("/nodes/1/name", Some(&doc)).unwrap();
        assert_eq!(keys_and_indices(&path), ["nodes", "1", "name"]);
        assert_eq!(path.segments()[1], PathSegment::Index(1));
    }

    #[test]
    fn test_pointer_to_json_path_by_unique_id() {
        let doc = json!({ "nodes": [{ "unique-id": "a" }, { "unique-id": "b" }] });

        let path = pointer_to_json_path("/nodes/b", Some(&doc)).unwrap();
        assert_eq!(path.segments()[1], PathSegment::Index(1));
    }

    #[test]
    fn test_unique_id_preferred_over_index() {
        let doc = json!({ "nodes": [{ "unique-id": "1" }, { "unique-id": "0" }] });

        let path = pointer_to_json_path("/nodes/1", Some(&doc)).unwrap();
        assert_eq!(path.segments()[1], PathSegment::Index(0));
    }

    #[test]
    fn test_unresolved_array_token_fails_whole_call() {
        let doc = json!({ "nodes": [{ "unique-id": "a" }] });

        assert!(pointer_to_json_path("/nodes/zzz/name", Some(&doc)).is_none());
        assert!(pointer_to_json_path("/nodes/5", Some(&doc)).is_none());
    }

    #[test]
    fn test_object_numeric_key_stays_key() {
        let doc = json!({ "ports": { "8080": { "open": true } } });

        let path = pointer_to_json_path("/ports/8080/open", Some(&doc)).unwrap();
        assert_eq!(path.segments()[1], PathSegment::Key("8080".to_string()));
    }

    #[test]
    fn test_missing_key_keeps_walking_as_keys() {
        let doc = json!({ "nodes": [] });

        let path = pointer_to_json_path("/nonexistent/path/0", Some(&doc)).unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::from("nonexistent"),
                PathSegment::from("path"),
                PathSegment::from("0"),
            ]
        );
    }

    #[test]
    fn test_pointer_without_data_coerces_numbers() {
        let path = pointer_to_json_path("/nodes/3/name", None).unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::from("nodes"),
                PathSegment::from(3),
                PathSegment::from("name"),
            ]
        );
    }

    #[test]
    fn test_rewrite_replaces_indices_with_ids() {
        let doc = json!({
            "relationships": [
                { "unique-id": "rel-1" },
                { "unique-id": "rel-2" }
            ]
        });

        assert_eq!(
            rewrite_path_with_ids("/relationships/1", Some(&doc)).as_deref(),
            Some("/relationships/rel-2")
        );
    }

    #[test]
    fn test_rewrite_nested() {
        let doc = json!({
            "nodes": [{
                "unique-id": "service",
                "interfaces": [{ "unique-id": "api", "port": 8080 }]
            }]
        });

        assert_eq!(
            rewrite_path_with_ids("/nodes/0/interfaces/0/port", Some(&doc)).as_deref(),
            Some("/nodes/service/interfaces/api/port")
        );
    }

    #[test]
    fn test_rewrite_keeps_index_without_id() {
        let doc = json!({ "nodes": [{ "name": "anon" }] });

        assert_eq!(
            rewrite_path_with_ids("/nodes/0/name", Some(&doc)).as_deref(),
            Some("/nodes/0/name")
        );
    }

    #[test]
    fn test_rewrite_off_tree_keeps_remaining_tokens() {
        let doc = json!({ "nodes": [{ "unique-id": "a" }] });

        assert_eq!(
            rewrite_path_with_ids("/nodes/0/missing/7/x", Some(&doc)).as_deref(),
            Some("/nodes/a/missing/7/x")
        );
        assert_eq!(
            rewrite_path_with_ids("/nodes/9/x", Some(&doc)).as_deref(),
            Some("/nodes/9/x")
        );
    }

    #[test]
    fn test_rewrite_keeps_index_of_duplicate_id() {
        let doc = json!({ "nodes": [{ "unique-id": "a" }, { "unique-id": "a" }] });

        assert_eq!(
            rewrite_path_with_ids("/nodes/0", Some(&doc)).as_deref(),
            Some("/nodes/a")
        );
        assert_eq!(
            rewrite_path_with_ids("/nodes/1/unique-id", Some(&doc)).as_deref(),
            Some("/nodes/1/unique-id")
        );
    }

    #[test]
    fn test_rewrite_escapes_ids() {
        let doc = json!({ "nodes": [{ "unique-id": "a/b" }] });

        assert_eq!(
            rewrite_path_with_ids("/nodes/0", Some(&doc)).as_deref(),
            Some("/nodes/a~1b")
        );
    }

    #[test]
    fn test_rewrite_root_and_absent_document() {
        let doc = json!({ "a": 1 });

        assert_eq!(rewrite_path_with_ids("", Some(&doc)).as_deref(), Some("/"));
        assert_eq!(rewrite_path_with_ids("/", Some(&doc)).as_deref(), Some("/"));
        assert_eq!(rewrite_path_with_ids("/a", None), None);
        assert_eq!(rewrite_path_with_ids("/a", Some(&Value::Null)), None);
    }

    #[test]
    fn test_rewrite_is_fixed_point() {
        let doc = json!({ "nodes": [{ "unique-id": "x", "tags": ["t"] }] });

        let once = rewrite_path_with_ids("/nodes/0/tags/0", Some(&doc)).unwrap();
        let twice = rewrite_path_with_ids(&once, Some(&doc)).unwrap();
        assert_eq!(once, "/nodes/x/tags/0");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resolve_pointer() {
        let doc = json!({ "nodes": [{ "unique-id": "x", "name": "X" }] });

        assert_eq!(resolve_pointer("/nodes/x/name", &doc), Some(&json!("X")));
        assert_eq!(resolve_pointer("/nodes/0/name", &doc), Some(&json!("X")));
        assert_eq!(resolve_pointer("", &doc), Some(&doc));
        assert_eq!(resolve_pointer("/nodes/y", &doc), None);
        assert_eq!(resolve_pointer("/nodes/0/name/deeper", &doc), None);
    }
}
