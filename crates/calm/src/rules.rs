//! Semantic rules for CALM documents.
//!
//! JSON Schema checks shape. The rules here check meaning: that
//! relationships reference nodes and interfaces that exist, that identifiers
//! are unique, that no placeholder values were left behind by generation.
//!
//! Each rule has a fixed severity and applies to either architectures or
//! patterns. Outputs carry the rule name as their code and are tagged with
//! the document they were found in.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::OnceLock,
};

use log::{debug, warn};
use regex::Regex;
use serde_json::Value;

use calm_core::{
    UNIQUE_ID,
    outcome::{Severity, ValidationOutput},
    pointer::{escape_token, unique_id},
};

use crate::{
    config::ValidationConfig,
    context::{ARCHITECTURE, PATTERN},
};

/// Kind of document a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTarget {
    Architecture,
    Pattern,
}

impl RuleTarget {
    /// The document context name outputs are tagged with.
    pub fn source(&self) -> &'static str {
        match self {
            RuleTarget::Architecture => ARCHITECTURE,
            RuleTarget::Pattern => PATTERN,
        }
    }
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())
    }
}

/// Runs semantic checks on a document.
pub trait RuleEngine {
    /// Check `document` as a `target` and return the findings.
    fn check(&self, document: &Value, target: RuleTarget) -> Vec<ValidationOutput>;
}

/// A single finding before it is turned into an output.
#[derive(Debug)]
struct Violation {
    message: String,
    path: String,
}

impl Violation {
    fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
        }
    }
}

struct Rule {
    name: &'static str,
    target: RuleTarget,
    severity: Severity,
    check: fn(&Value) -> Vec<Violation>,
}

const RULES: &[Rule] = &[
    Rule {
        name: "architecture-has-nodes-relationships",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| required_fields(doc, &["nodes", "relationships"]),
    },
    Rule {
        name: "architecture-has-no-empty-properties",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: empty_properties,
    },
    Rule {
        name: "architecture-has-no-placeholder-properties-string",
        target: RuleTarget::Architecture,
        severity: Severity::Warning,
        check: string_placeholders,
    },
    Rule {
        name: "architecture-has-no-placeholder-properties-numerical",
        target: RuleTarget::Architecture,
        severity: Severity::Warning,
        check: numerical_placeholders,
    },
    Rule {
        name: "connects-relationship-references-existing-nodes-in-source",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| connects_endpoint_nodes(doc, "source"),
    },
    Rule {
        name: "connects-relationship-references-existing-nodes-in-destination",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| connects_endpoint_nodes(doc, "destination"),
    },
    Rule {
        name: "referenced-interfaces-defined-in-source",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| connects_endpoint_interfaces(doc, "source"),
    },
    Rule {
        name: "referenced-interfaces-defined-in-destination",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| connects_endpoint_interfaces(doc, "destination"),
    },
    Rule {
        name: "interacts-relationship-references-existing-nodes-in-actor",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| single_node_reference(doc, "interacts", "actor"),
    },
    Rule {
        name: "interacts-relationship-references-existing-nodes",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| node_list_reference(doc, "interacts"),
    },
    Rule {
        name: "composition-relationships-reference-existing-nodes-in-container",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| single_node_reference(doc, "composed-of", "container"),
    },
    Rule {
        name: "composition-relationships-reference-existing-nodes",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| node_list_reference(doc, "composed-of"),
    },
    Rule {
        name: "deployed-in-relationships-reference-existing-nodes-in-container",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| single_node_reference(doc, "deployed-in", "container"),
    },
    Rule {
        name: "deployed-in-relationships-reference-existing-nodes",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: |doc| node_list_reference(doc, "deployed-in"),
    },
    Rule {
        name: "unique-ids-must-be-unique",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: duplicate_unique_ids,
    },
    Rule {
        name: "flow-transitions-references-existing-relationships",
        target: RuleTarget::Architecture,
        severity: Severity::Error,
        check: flow_transitions,
    },
    Rule {
        name: "architecture-nodes-must-be-referenced",
        target: RuleTarget::Architecture,
        severity: Severity::Warning,
        check: unreferenced_nodes,
    },
    Rule {
        name: "pattern-has-nodes-relationships",
        target: RuleTarget::Pattern,
        severity: Severity::Error,
        check: pattern_collections,
    },
    Rule {
        name: "pattern-has-no-empty-properties",
        target: RuleTarget::Pattern,
        severity: Severity::Error,
        check: empty_strings,
    },
];

/// Relationship kinds and the fields holding the nodes they reference.
const NODE_REFERENCES: &[(&str, &str)] = &[
    ("interacts", "actor"),
    ("composed-of", "container"),
    ("deployed-in", "container"),
];

/// The built-in CALM rule set.
///
/// # Example
///
/// ```
/// # use calm::rules::{CalmRules, RuleEngine, RuleTarget};
/// let architecture = serde_json::json!({ "nodes": [] });
///
/// let outputs = CalmRules::new().check(&architecture, RuleTarget::Architecture);
/// assert_eq!(outputs[0].code(), "architecture-has-nodes-relationships");
/// assert_eq!(outputs[0].source(), Some("architecture"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CalmRules {
    disabled: HashSet<String>,
}

impl CalmRules {
    /// All rules enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules enabled except those the configuration disables.
    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new().with_disabled(config.disabled_rules().iter().cloned())
    }

    /// Disable the named rules. Unknown names are logged and ignored.
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !Self::rule_names().any(|known| known == name) {
                warn!(rule = name.as_str(); "Ignoring unknown rule");
                continue;
            }
            self.disabled.insert(name);
        }
        self
    }

    /// Names of every built-in rule.
    pub fn rule_names() -> impl Iterator<Item = &'static str> {
        RULES.iter().map(|rule| rule.name)
    }

    /// Returns `true` unless the rule has been disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name)
    }
}

impl RuleEngine for CalmRules {
    fn check(&self, document: &Value, target: RuleTarget) -> Vec<ValidationOutput> {
        let outputs: Vec<_> = RULES
            .iter()
            .filter(|rule| rule.target == target && self.is_enabled(rule.name))
            .flat_map(|rule| {
                (rule.check)(document).into_iter().map(|violation| {
                    ValidationOutput::new(
                        rule.name,
                        rule.severity,
                        violation.message,
                        violation.path,
                    )
                    .with_source(target.source())
                })
            })
            .collect();

        debug!(document = target.source(), outputs = outputs.len(); "Semantic rules checked");
        outputs
    }
}

// Pointer and document helpers

fn child(parent: &str, token: impl fmt::Display) -> String {
    format!("{parent}/{}", escape_token(&token.to_string()))
}

fn array<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Visit every value below `value` (not `value` itself) with its pointer.
fn walk_descendants<'v>(value: &'v Value, pointer: &str, visit: &mut impl FnMut(&'v Value, &str)) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let path = child(pointer, index);
                visit(item, &path);
                walk_descendants(item, &path, visit);
            }
        }
        Value::Object(members) => {
            for (key, member) in members {
                let path = child(pointer, key);
                visit(member, &path);
                walk_descendants(member, &path, visit);
            }
        }
        _ => {}
    }
}

fn node_ids(doc: &Value) -> HashSet<&str> {
    array(doc, "nodes").iter().filter_map(unique_id).collect()
}

/// Relationships having the given kind, with their index and kind body.
fn relationships_of_kind<'v>(
    doc: &'v Value,
    kind: &'v str,
) -> impl Iterator<Item = (usize, &'v Value)> + 'v {
    array(doc, "relationships")
        .iter()
        .enumerate()
        .filter_map(move |(index, relationship)| {
            relationship
                .get("relationship-type")
                .and_then(|rt| rt.get(kind))
                .map(|body| (index, body))
        })
}

fn kind_pointer(index: usize, kind: &str) -> String {
    format!("/relationships/{index}/relationship-type/{kind}")
}

fn missing_node(id: &str, path: String) -> Violation {
    Violation::new(
        format!("'{id}' does not refer to the unique-id of an existing node"),
        path,
    )
}

// Rule checks

fn required_fields(doc: &Value, fields: &[&str]) -> Vec<Violation> {
    fields
        .iter()
        .filter(|field| matches!(doc.get(**field), None | Some(Value::Null)))
        .map(|field| Violation::new(format!("document must define `{field}`"), "/"))
        .collect()
}

fn empty_strings(doc: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    walk_descendants(doc, "", &mut |value, path| {
        if value.as_str().is_some_and(str::is_empty) {
            violations.push(Violation::new("property must not be an empty string", path));
        }
    });
    violations
}

fn empty_properties(doc: &Value) -> Vec<Violation> {
    let mut violations = empty_strings(doc);
    walk_descendants(doc, "", &mut |value, path| {
        if value.as_f64() == Some(0.0) {
            violations.push(Violation::new("property must not be zero", path));
        }
    });
    violations
}

/// Placeholders left by generation, such as `[[ NODE_NAME ]]`.
fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\[\[\s*[A-Z_]+\s*\]\]$").ok())
        .as_ref()
}

fn string_placeholders(doc: &Value) -> Vec<Violation> {
    let Some(pattern) = placeholder_pattern() else {
        return Vec::new();
    };
    let mut violations = Vec::new();
    walk_descendants(doc, "", &mut |value, path| {
        if let Some(text) = value.as_str().filter(|text| pattern.is_match(text)) {
            violations.push(Violation::new(
                format!("placeholder value '{text}' must be replaced"),
                path,
            ));
        }
    });
    violations
}

fn numerical_placeholders(doc: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    walk_descendants(doc, "", &mut |value, path| {
        if value.as_i64() == Some(-1) {
            violations.push(Violation::new(
                "numerical placeholder -1 must be replaced",
                path,
            ));
        }
    });
    violations
}

fn connects_endpoint_nodes(doc: &Value, endpoint: &str) -> Vec<Violation> {
    let nodes = node_ids(doc);
    relationships_of_kind(doc, "connects")
        .filter_map(|(index, connects)| {
            let node = connects.get(endpoint)?.get("node")?.as_str()?;
            (!nodes.contains(node)).then(|| {
                missing_node(
                    node,
                    format!("{}/{endpoint}/node", kind_pointer(index, "connects")),
                )
            })
        })
        .collect()
}

fn connects_endpoint_interfaces(doc: &Value, endpoint: &str) -> Vec<Violation> {
    let interfaces: HashMap<&str, HashSet<&str>> = array(doc, "nodes")
        .iter()
        .filter_map(|node| {
            let id = unique_id(node)?;
            let defined = array(node, "interfaces").iter().filter_map(unique_id).collect();
            Some((id, defined))
        })
        .collect();

    let mut violations = Vec::new();
    for (index, connects) in relationships_of_kind(doc, "connects") {
        let Some(target) = connects.get(endpoint) else {
            continue;
        };
        // Unknown nodes are reported by the node reference rules
        let Some((node, defined)) = target
            .get("node")
            .and_then(Value::as_str)
            .and_then(|node| interfaces.get(node).map(|defined| (node, defined)))
        else {
            continue;
        };
        let base = format!("{}/{endpoint}/interfaces", kind_pointer(index, "connects"));
        for (position, interface) in array(target, "interfaces").iter().enumerate() {
            let Some(interface) = interface.as_str() else {
                continue;
            };
            if !defined.contains(interface) {
                violations.push(Violation::new(
                    format!("'{interface}' is not an interface of node '{node}'"),
                    child(&base, position),
                ));
            }
        }
    }
    violations
}

fn single_node_reference(doc: &Value, kind: &str, field: &str) -> Vec<Violation> {
    let nodes = node_ids(doc);
    relationships_of_kind(doc, kind)
        .filter_map(|(index, body)| {
            let node = body.get(field)?.as_str()?;
            (!nodes.contains(node))
                .then(|| missing_node(node, format!("{}/{field}", kind_pointer(index, kind))))
        })
        .collect()
}

fn node_list_reference(doc: &Value, kind: &str) -> Vec<Violation> {
    let nodes = node_ids(doc);
    let mut violations = Vec::new();
    for (index, body) in relationships_of_kind(doc, kind) {
        let base = format!("{}/nodes", kind_pointer(index, kind));
        for (position, node) in array(body, "nodes").iter().enumerate() {
            if let Some(node) = node.as_str().filter(|node| !nodes.contains(node)) {
                violations.push(missing_node(node, child(&base, position)));
            }
        }
    }
    violations
}

fn duplicate_unique_ids(doc: &Value) -> Vec<Violation> {
    let mut first_seen: HashMap<&str, String> = HashMap::new();
    let mut violations = Vec::new();
    walk_descendants(doc, "", &mut |value, path| {
        let Some(id) = unique_id(value) else {
            return;
        };
        match first_seen.get(id) {
            Some(first) => violations.push(Violation::new(
                format!("unique-id '{id}' is already used at {first}"),
                child(path, UNIQUE_ID),
            )),
            None => {
                first_seen.insert(id, path.to_string());
            }
        }
    });
    violations
}

fn flow_transitions(doc: &Value) -> Vec<Violation> {
    let relationships: HashSet<&str> = array(doc, "relationships")
        .iter()
        .filter_map(unique_id)
        .collect();

    let mut violations = Vec::new();
    for (flow_index, flow) in array(doc, "flows").iter().enumerate() {
        for (index, transition) in array(flow, "transitions").iter().enumerate() {
            let Some(relationship) = transition
                .get("relationship-unique-id")
                .and_then(Value::as_str)
            else {
                continue;
            };
            if !relationships.contains(relationship) {
                violations.push(Violation::new(
                    format!(
                        "'{relationship}' does not refer to the unique-id of an existing \
                         relationship"
                    ),
                    format!("/flows/{flow_index}/transitions/{index}/relationship-unique-id"),
                ));
            }
        }
    }
    violations
}

fn unreferenced_nodes(doc: &Value) -> Vec<Violation> {
    let mut referenced: HashSet<&str> = HashSet::new();
    for relationship in array(doc, "relationships") {
        let Some(kinds) = relationship
            .get("relationship-type")
            .and_then(Value::as_object)
        else {
            continue;
        };
        if let Some(connects) = kinds.get("connects") {
            referenced.extend(
                ["source", "destination"]
                    .iter()
                    .filter_map(|end| connects.get(*end)?.get("node")?.as_str()),
            );
        }
        for (kind, field) in NODE_REFERENCES {
            let Some(body) = kinds.get(*kind) else {
                continue;
            };
            referenced.extend(body.get(*field).and_then(Value::as_str));
            referenced.extend(array(body, "nodes").iter().filter_map(Value::as_str));
        }
    }

    array(doc, "nodes")
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let id = unique_id(node)?;
            (!referenced.contains(id)).then(|| {
                Violation::new(
                    format!("node '{id}' is not referenced by any relationship"),
                    format!("/nodes/{index}"),
                )
            })
        })
        .collect()
}

fn pattern_collections(doc: &Value) -> Vec<Violation> {
    let properties = doc.get("properties");
    ["nodes", "relationships"]
        .iter()
        .filter(|field| properties.and_then(|p| p.get(**field)).is_none())
        .map(|field| {
            let path = if properties.is_some() { "/properties" } else { "/" };
            Violation::new(format!("pattern must define `properties.{field}`"), path)
        })
        .collect()
}
