//! # Documentation Provider
//!
//! Seam through which declaration comments reach the extractor.

use crate::graph::TypeId;
use std::collections::HashMap;

/// Supplies free-form documentation for declarations.
pub trait DocProvider {
    /// Documentation attached to a named type.
    fn type_doc(&self, id: TypeId) -> Option<&str>;

    /// Documentation attached to a field of `owner`.
    fn field_doc(&self, owner: TypeId, field: &str) -> Option<&str>;
}

/// Provider that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocs;

impl DocProvider for NoDocs {
    fn type_doc(&self, _id: TypeId) -> Option<&str> {
        None
    }

    fn field_doc(&self, _owner: TypeId, _field: &str) -> Option<&str> {
        None
    }
}

/// Map-backed provider, filled by the source loader.
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    types: HashMap<TypeId, String>,
    fields: HashMap<(TypeId, String), String>,
}

impl DocIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records type documentation. Blank text is ignored.
    pub fn insert_type(&mut self, id: TypeId, doc: impl Into<String>) {
        let doc = doc.into();
        let doc = doc.trim();
        if !doc.is_empty() {
            self.types.insert(id, doc.to_string());
        }
    }

    /// Records field documentation. Blank text is ignored.
    pub fn insert_field(&mut self, owner: TypeId, field: impl Into<String>, doc: impl Into<String>) {
        let doc = doc.into();
        let doc = doc.trim();
        if !doc.is_empty() {
            self.fields.insert((owner, field.into()), doc.to_string());
        }
    }
}

impl DocProvider for DocIndex {
    fn type_doc(&self, id: TypeId) -> Option<&str> {
        self.types.get(&id).map(String::as_str)
    }

    fn field_doc(&self, owner: TypeId, field: &str) -> Option<&str> {
        self.fields
            .get(&(owner, field.to_string()))
            .map(String::as_str)
    }
}
