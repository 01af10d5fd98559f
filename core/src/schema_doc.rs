//! # Schema Document
//!
//! Ordered key/value builder for JSON Schema fragments. Insertion order is the
//! output order, so every producer decides the final layout by the order in
//! which it sets keys.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// An ordered JSON Schema object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDoc {
    entries: Map<String, Value>,
}

impl SchemaDoc {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// `{"type": <ty>}`
    pub fn typed(ty: &str) -> Self {
        let mut doc = Self::new();
        doc.set("type", ty);
        doc
    }

    /// `{"$ref": "#/<ref_root>/<id>"}`
    pub fn reference(ref_root: &str, id: &str) -> Self {
        let mut doc = Self::new();
        doc.set("$ref", format!("#/{}/{}", ref_root, id));
        doc
    }

    /// Appends `key`, or replaces its value in place when already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes `key`, keeping the relative order of the remaining keys.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Sets every key of `other`, in its order.
    pub fn extend(&mut self, other: SchemaDoc) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    /// Reads a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// True when `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in output order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no key is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts into a plain JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }
}

impl From<SchemaDoc> for Value {
    fn from(doc: SchemaDoc) -> Self {
        doc.into_value()
    }
}

impl From<Map<String, Value>> for SchemaDoc {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl Serialize for SchemaDoc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}
