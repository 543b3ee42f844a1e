//! Pattern options: extraction and choice selection.
//!
//! A CALM pattern can leave decisions open by wrapping alternatives in
//! `oneOf`/`anyOf` blocks. Options appear in three places:
//!
//! - `properties.nodes.prefixItems[*]`, alternatives identified by their
//!   `unique-id` const;
//! - `properties.relationships.prefixItems[*]`, likewise;
//! - an options relationship's
//!   `properties.relationship-type.properties.options.prefixItems[*]`,
//!   alternatives identified by their `description` const and naming the
//!   nodes and relationships that come with the decision.
//!
//! [`extract_options`] lists the decisions a user has to make and
//! [`select_choices`] rewrites the pattern so it only contains what was chosen.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UNIQUE_ID;

/// Kind of choice block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptionType {
    /// Exactly one alternative must be chosen.
    #[serde(rename = "oneOf")]
    OneOf,
    /// Any number of alternatives may be chosen.
    #[serde(rename = "anyOf")]
    AnyOf,
}

impl OptionType {
    /// The JSON Schema keyword for this block.
    pub fn keyword(&self) -> &'static str {
        match self {
            OptionType::OneOf => "oneOf",
            OptionType::AnyOf => "anyOf",
        }
    }

    const ALL: [OptionType; 2] = [OptionType::OneOf, OptionType::AnyOf];
}

/// One alternative of an option block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalmChoice {
    /// Human-readable description; identifies the alternative.
    pub description: String,
    /// Node `unique-id`s brought in by this alternative.
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Relationship `unique-id`s brought in by this alternative.
    #[serde(default)]
    pub relationships: Vec<String>,
}

/// A decision the pattern leaves open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternOption {
    pub option_type: OptionType,
    /// Question to ask, taken from the owning relationship's description.
    pub prompt: String,
    pub choices: Vec<CalmChoice>,
}

fn const_str<'v>(schema: &'v Value, property: &str) -> Option<&'v str> {
    schema
        .get("properties")?
        .get(property)?
        .get("const")?
        .as_str()
}

fn const_strings(schema: &Value, property: &str) -> Vec<String> {
    schema
        .get("properties")
        .and_then(|p| p.get(property))
        .and_then(|p| p.get("const"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn choice_from_alternative(alternative: &Value) -> CalmChoice {
    CalmChoice {
        description: const_str(alternative, "description")
            .unwrap_or_default()
            .to_string(),
        nodes: const_strings(alternative, "nodes"),
        relationships: const_strings(alternative, "relationships"),
    }
}

/// Returns the kind and alternatives of a choice block.
fn choice_block(item: &Value) -> Option<(OptionType, &Vec<Value>)> {
    OptionType::ALL.into_iter().find_map(|option_type| {
        item.get(option_type.keyword())
            .and_then(Value::as_array)
            .map(|alternatives| (option_type, alternatives))
    })
}

/// Remove the choice block from `item`, returning its kind and alternatives.
fn take_choice_block(item: &mut Value) -> Option<(OptionType, Vec<Value>)> {
    let object = item.as_object_mut()?;
    OptionType::ALL.into_iter().find_map(|option_type| {
        match object.remove(option_type.keyword()) {
            Some(Value::Array(alternatives)) => Some((option_type, alternatives)),
            Some(other) => {
                object.insert(option_type.keyword().to_string(), other);
                None
            }
            None => None,
        }
    })
}

fn collection_mut<'v>(pattern: &'v mut Value, collection: &str) -> Option<&'v mut Value> {
    pattern.get_mut("properties")?.get_mut(collection)
}

fn prefix_items<'v>(schema: &'v Value) -> Option<&'v Vec<Value>> {
    schema.get("prefixItems").and_then(Value::as_array)
}

fn options_schema(relationship: &Value) -> Option<&Value> {
    relationship
        .get("properties")?
        .get("relationship-type")?
        .get("properties")?
        .get("options")
}

fn options_schema_mut(relationship: &mut Value) -> Option<&mut Value> {
    relationship
        .get_mut("properties")?
        .get_mut("relationship-type")?
        .get_mut("properties")?
        .get_mut("options")
}

/// List every option block attached to the pattern's relationships.
pub fn extract_options(pattern: &Value) -> Vec<PatternOption> {
    let Some(relationships) = pattern
        .get("properties")
        .and_then(|p| p.get("relationships"))
        .and_then(prefix_items)
    else {
        return Vec::new();
    };

    let mut options = Vec::new();
    for relationship in relationships {
        let Some(blocks) = options_schema(relationship).and_then(prefix_items) else {
            continue;
        };
        let prompt = const_str(relationship, "description")
            .or_else(|| const_str(relationship, UNIQUE_ID))
            .unwrap_or_default();

        for block in blocks {
            if let Some((option_type, alternatives)) = choice_block(block) {
                options.push(PatternOption {
                    option_type,
                    prompt: prompt.to_string(),
                    choices: alternatives.iter().map(choice_from_alternative).collect(),
                });
            }
        }
    }
    options
}

/// Replace every choice block in `items` by its selected alternatives.
///
/// `oneOf` blocks keep at most their first selected alternative.
/// Returns `true` if any block was found.
fn hoist_selected<F>(items: &mut Vec<Value>, is_selected: F) -> bool
where
    F: Fn(&Value) -> bool,
{
    let mut found = false;
    let original = std::mem::take(items);
    for mut item in original {
        let Some((option_type, alternatives)) = take_choice_block(&mut item) else {
            items.push(item);
            continue;
        };
        found = true;

        let mut selected = alternatives.into_iter().filter(|alt| is_selected(alt));
        match option_type {
            OptionType::OneOf => {
                items.extend(selected.next());
                if selected.next().is_some() {
                    warn!("More than one alternative selected for a oneOf block; keeping the first");
                }
            }
            OptionType::AnyOf => items.extend(selected),
        }
    }
    found
}

/// Set `minItems`/`maxItems`, where present, to the `prefixItems` length.
fn sync_item_bounds(schema: &mut Value) {
    let Some(len) = prefix_items(schema).map(Vec::len) else {
        return;
    };
    let Some(object) = schema.as_object_mut() else {
        return;
    };
    for bound in ["minItems", "maxItems"] {
        if let Some(value) = object.get_mut(bound) {
            *value = Value::from(len);
        }
    }
}

/// Resolve the choice blocks of one collection (`nodes` or `relationships`).
///
/// Items chosen by `unique-id` are hoisted; plain items named only by
/// unselected option alternatives are pruned.
fn select_in_collection(
    pattern: &mut Value,
    collection: &str,
    selected: &HashSet<&str>,
    unselected: &HashSet<&str>,
) {
    let Some(schema) = collection_mut(pattern, collection) else {
        return;
    };
    let Some(items) = schema.get_mut("prefixItems").and_then(Value::as_array_mut) else {
        return;
    };

    let hoisted = hoist_selected(items, |alternative| {
        const_str(alternative, UNIQUE_ID).is_some_and(|id| selected.contains(id))
    });

    let before = items.len();
    items.retain(|item| !const_str(item, UNIQUE_ID).is_some_and(|id| unselected.contains(id)));
    let pruned = before - items.len();

    if hoisted || pruned > 0 {
        debug!(collection, pruned; "Resolved pattern collection");
        sync_item_bounds(schema);
    }
}

/// Resolve every option block of the pattern to the given choices, in place.
///
/// After this call the pattern contains no `oneOf`/`anyOf` blocks in its
/// node, relationship or option collections, and no node or relationship
/// that only an unchosen alternative would have brought in.
pub fn select_choices(pattern: &mut Value, choices: &[CalmChoice]) {
    let selected_nodes: HashSet<&str> = choices
        .iter()
        .flat_map(|c| &c.nodes)
        .map(String::as_str)
        .collect();
    let selected_relationships: HashSet<&str> = choices
        .iter()
        .flat_map(|c| &c.relationships)
        .map(String::as_str)
        .collect();
    let selected_descriptions: HashSet<&str> =
        choices.iter().map(|c| c.description.as_str()).collect();

    let offered: Vec<CalmChoice> = extract_options(pattern)
        .into_iter()
        .flat_map(|option| option.choices)
        .collect();
    let unselected_nodes: HashSet<&str> = offered
        .iter()
        .flat_map(|c| &c.nodes)
        .map(String::as_str)
        .filter(|id| !selected_nodes.contains(id))
        .collect();
    let unselected_relationships: HashSet<&str> = offered
        .iter()
        .flat_map(|c| &c.relationships)
        .map(String::as_str)
        .filter(|id| !selected_relationships.contains(id))
        .collect();

    select_in_collection(pattern, "nodes", &selected_nodes, &unselected_nodes);
    select_in_collection(
        pattern,
        "relationships",
        &selected_relationships,
        &unselected_relationships,
    );

    let Some(relationships) = collection_mut(pattern, "relationships")
        .and_then(|schema| schema.get_mut("prefixItems"))
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    for relationship in relationships {
        let Some(options) = options_schema_mut(relationship) else {
            continue;
        };
        let Some(blocks) = options.get_mut("prefixItems").and_then(Value::as_array_mut) else {
            continue;
        };
        let hoisted = hoist_selected(blocks, |alternative| {
            const_str(alternative, "description")
                .is_some_and(|description| selected_descriptions.contains(description))
        });
        if hoisted {
            sync_item_bounds(options);
        }
    }
}
