//! Context accumulation for RO-Crate documents
//!
//! A crate's `@context` may be a bare URL string, an inline object, or an
//! array mixing both. When several documents are read together, each
//! declaration is recorded in encounter order. Later entries may shadow
//! earlier term definitions under JSON-LD merging semantics, so order is
//! preserved and nothing is deduplicated.

use serde_json::{json, Value};

/// Ordered accumulator for `@context` declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextResolver {
    entries: Vec<Value>,
}

impl ContextResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one document's `@context` value.
    ///
    /// Arrays are flattened into one entry per element; any other value
    /// becomes a single entry.
    pub fn record(&mut self, raw: &Value) {
        match raw {
            Value::Array(items) => self.entries.extend(items.iter().cloned()),
            other => self.entries.push(other.clone()),
        }
    }

    /// All recorded entries in declaration order, each wrapped as
    /// `{"@context": <entry>}`.
    pub fn all(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|entry| json!({ "@context": entry }))
            .collect()
    }

    /// Collapses the recorded entries back into one `@context` value.
    ///
    /// A single entry is emitted as-is (a lone URL string stays a string);
    /// several entries become an array; no entries yield `None`.
    pub fn to_value(&self) -> Option<Value> {
        match self.entries.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(Value::Array(many.to_vec())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
