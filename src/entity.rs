//! Entity normalization for RO-Crate graph nodes
//!
//! Converts raw JSON-LD node objects into the internal representation:
//! the reserved `@id` and `@type` keywords become the `id` and
//! `entity_type` fields, reference `@id` keys nested anywhere in the
//! property tree become `id`, and everything else lands in an open
//! property bag with its original names and value shapes intact.

use serde_json::{json, Map, Value};

use crate::error::CrateError;

/// A single node of the metadata graph.
///
/// References to other entities stay plain data (`{"id": ...}` objects);
/// they are never resolved eagerly, so entities remain independently
/// serializable even when the graph contains reference cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// The `@id` of the source node, unique within a graph
    pub id: String,
    /// Type labels from `@type`, always a list internally
    pub entity_type: Vec<String>,
    /// All remaining properties, in declaration order
    pub properties: Map<String, Value>,
}

impl Entity {
    /// Creates an entity with no properties, for programmatic graph building.
    pub fn new(id: impl Into<String>, entity_type: Vec<String>) -> Self {
        Entity {
            id: id.into(),
            entity_type,
            properties: Map::new(),
        }
    }

    /// Normalizes one raw JSON-LD node object.
    ///
    /// Fails with [`CrateError::MalformedEntity`] when the node is not an
    /// object or has no `@id`.
    pub fn from_json_node(raw: &Value) -> Result<Entity, CrateError> {
        let node = raw
            .as_object()
            .ok_or_else(|| CrateError::MalformedEntity(format!("graph node is not an object: {raw}")))?;

        let id = node
            .get("@id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CrateError::MalformedEntity(format!("graph node has no @id: {raw}"))
            })?
            .to_string();

        let entity_type = match node.get("@type") {
            Some(Value::String(label)) => vec![label.clone()],
            Some(Value::Array(labels)) => labels
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        };

        let mut properties = Map::new();
        for (key, value) in node {
            if key == "@id" || key == "@type" {
                continue;
            }
            properties.insert(key.clone(), normalize_value(value));
        }

        Ok(Entity {
            id,
            entity_type,
            properties,
        })
    }

    /// Re-derives the original JSON-LD node shape.
    ///
    /// `id` becomes `@id`, the type list becomes `@type` (a scalar when
    /// exactly one label is present, matching the format's convention) and
    /// nested reference `id` keys get their `@` prefix back.
    pub fn to_json_node(&self) -> Value {
        let mut node = Map::new();
        node.insert("@id".to_string(), json!(self.id));
        match self.entity_type.len() {
            0 => {}
            1 => {
                node.insert("@type".to_string(), json!(self.entity_type[0]));
            }
            _ => {
                node.insert("@type".to_string(), json!(self.entity_type));
            }
        }
        for (key, value) in &self.properties {
            node.insert(key.clone(), denormalize_value(value));
        }
        Value::Object(node)
    }

    /// Returns a property value, or `None` if the entity does not carry it.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// Sets a property, replacing any previous value.
    pub fn set(&mut self, property: impl Into<String>, value: Value) {
        self.properties.insert(property.into(), normalize_value(&value));
    }

    /// Check whether the entity carries a given type label.
    pub fn has_type(&self, label: &str) -> bool {
        self.entity_type.iter().any(|t| t == label)
    }

    /// Target ids of a reference-valued property.
    ///
    /// Handles a single `{"id": ...}` object and lists of them; scalar or
    /// non-reference values yield nothing.
    pub fn reference_ids(&self, property: &str) -> Vec<&str> {
        match self.properties.get(property) {
            Some(Value::Object(map)) => map
                .get("id")
                .and_then(Value::as_str)
                .into_iter()
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object())
                .filter_map(|map| map.get("id").and_then(Value::as_str))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Recursively normalizes a property value, preserving its shape.
///
/// Only the nested reference keyword `@id` is rewritten (to `id`); all
/// other property names, including other JSON-LD keywords such as
/// `@value` or `@language`, are carried through unchanged.
fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let key = if k == "@id" {
                        "id".to_string()
                    } else {
                        k.clone()
                    };
                    (key, normalize_value(v))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

/// Inverse of [`normalize_value`]: reattaches `@` to nested reference ids.
fn denormalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let key = if k == "id" {
                        "@id".to_string()
                    } else {
                        k.clone()
                    };
                    (key, denormalize_value(v))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(denormalize_value).collect()),
        other => other.clone(),
    }
}
