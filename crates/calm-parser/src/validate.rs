//! Checks on a syntactically valid tree.
//!
//! Currently this reports repeated object keys. They are legal JSON but the
//! earlier values are silently dropped, so each repeat is a warning.

use indexmap::{IndexMap, map::Entry};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::Span,
    tree::{JsonNode, NodeKind},
};

/// Walk the tree and return its warnings.
pub(crate) fn validate_tree(root: &JsonNode) -> Vec<Diagnostic> {
    let mut collector = DiagnosticCollector::new();
    check_node(root, &mut collector);
    collector.into_diagnostics()
}

fn check_node(node: &JsonNode, collector: &mut DiagnosticCollector) {
    match node.kind() {
        NodeKind::Array(elements) => {
            for element in elements {
                check_node(element, collector);
            }
        }
        NodeKind::Object(members) => {
            let mut first_seen: IndexMap<&str, Span> = IndexMap::with_capacity(members.len());
            for member in members {
                let key = member.key();
                match first_seen.entry(key.inner().as_str()) {
                    Entry::Occupied(first) => collector.emit(
                        Diagnostic::warning(format!("duplicate key `{}`", key.inner()))
                            .with_code(ErrorCode::E103)
                            .with_label(key.span(), "duplicate key")
                            .with_secondary_label(*first.get(), "first defined here")
                            .with_help("the last occurrence wins"),
                    ),
                    Entry::Vacant(slot) => {
                        slot.insert(key.span());
                    }
                }
                check_node(member.value(), collector);
            }
        }
        _ => {}
    }
}
