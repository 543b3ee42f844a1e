//! Syntax tree of a parsed JSON document.
//!
//! Every node remembers the byte span it was parsed from, and every object
//! key remembers its own span. The tree keeps duplicate keys in source
//! order; lookups and [`JsonNode::to_value`] resolve them to the last
//! occurrence.

use calm_core::path::{JsonPath, PathSegment};
use serde_json::{Map, Number, Value};

use crate::span::{Span, Spanned};

/// The kind of a JSON value, with children for containers.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonNode>),
    Object(Vec<Member>),
}

impl NodeKind {
    /// A short name of the kind, for messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool(_) => "boolean",
            NodeKind::Number(_) => "number",
            NodeKind::String(_) => "string",
            NodeKind::Array(_) => "array",
            NodeKind::Object(_) => "object",
        }
    }
}

/// A JSON value with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    kind: NodeKind,
    span: Span,
}

/// One `"key": value` member of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    key: Spanned<String>,
    value: JsonNode,
}

impl Member {
    pub fn new(key: Spanned<String>, value: JsonNode) -> Self {
        Self { key, value }
    }

    /// The key with the span of its string literal.
    pub fn key(&self) -> &Spanned<String> {
        &self.key
    }

    pub fn value(&self) -> &JsonNode {
        &self.value
    }
}

impl JsonNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Span of the whole value, brackets and braces included.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Look up an object member. When the key repeats, the last one wins.
    pub fn member(&self, key: &str) -> Option<&JsonNode> {
        match &self.kind {
            NodeKind::Object(members) => members
                .iter()
                .rev()
                .find(|member| member.key.inner() == key)
                .map(Member::value),
            _ => None,
        }
    }

    /// Look up an array element by position.
    pub fn element(&self, index: usize) -> Option<&JsonNode> {
        match &self.kind {
            NodeKind::Array(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Follow `path` from this node.
    ///
    /// Returns `None` when a key is missing, an index is out of range, or a
    /// segment does not fit the node kind (a key on an array, an index on an
    /// object).
    pub fn find(&self, path: &JsonPath) -> Option<&JsonNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                PathSegment::Key(key) => node.member(key),
                PathSegment::Index(index) => node.element(*index),
            })
    }

    /// Convert the tree into a [`serde_json::Value`].
    ///
    /// Member order follows the source, with a repeated key kept at its
    /// first position but holding the last value.
    pub fn to_value(&self) -> Value {
        match &self.kind {
            NodeKind::Null => Value::Null,
            NodeKind::Bool(b) => Value::Bool(*b),
            NodeKind::Number(n) => Value::Number(n.clone()),
            NodeKind::String(s) => Value::String(s.clone()),
            NodeKind::Array(elements) => {
                Value::Array(elements.iter().map(JsonNode::to_value).collect())
            }
            NodeKind::Object(members) => {
                let mut map = Map::with_capacity(members.len());
                for member in members {
                    map.insert(member.key.inner().clone(), member.value.to_value());
                }
                Value::Object(map)
            }
        }
    }
}
