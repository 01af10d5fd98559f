//! # Definition Registry
//!
//! Per-session bookkeeping of named types: which identities were visited,
//! which reference id each one gets, how often each was re-referenced, and
//! the shared definitions accumulated along the way.
//!
//! Reference ids are derived from the short name and the position of the
//! identity among all identities sharing that name: the first keeps the bare
//! name, later ones get `Name1`, `Name2`, ... in first-seen order.

use crate::graph::TypeId;
use crate::schema_doc::SchemaDoc;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;

struct Entry {
    name: String,
    definition: Option<SchemaDoc>,
}

/// Registry owned by exactly one extraction session.
#[derive(Default)]
pub struct DefinitionRegistry {
    seen: HashMap<String, Vec<TypeId>>,
    entries: IndexMap<TypeId, Entry>,
    use_counts: HashMap<TypeId, usize>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities seen so far under a short name, in first-seen order.
    pub fn lookup(&self, name: &str) -> &[TypeId] {
        self.seen.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True once `id` has been registered.
    pub fn is_registered(&self, id: TypeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registers a first encounter. Registering twice is a no-op.
    pub fn register(&mut self, id: TypeId, name: &str) {
        if self.is_registered(id) {
            return;
        }
        let ids = self.seen.entry(name.to_string()).or_default();
        ids.push(id);
        if ids.len() > 1 {
            debug!("{} declarations share the name {}", ids.len(), name);
        }
        self.entries.insert(
            id,
            Entry {
                name: name.to_string(),
                definition: None,
            },
        );
    }

    /// Stable reference id of a registered identity.
    pub fn resolve_id(&self, id: TypeId) -> Option<String> {
        let name = &self.entries.get(&id)?.name;
        let index = self.lookup(name).iter().position(|t| *t == id)?;
        Some(match index {
            0 => name.clone(),
            i => format!("{}{}", name, i),
        })
    }

    /// Stores the definition of `id`. Returns false, keeping the first
    /// definition, when one was already stored or `id` is unregistered.
    pub fn define_once(&mut self, id: TypeId, doc: SchemaDoc) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if entry.definition.is_none() => {
                entry.definition = Some(doc);
                true
            }
            _ => false,
        }
    }

    /// Counts a repeat reference to `id`.
    pub fn record_use(&mut self, id: TypeId) {
        *self.use_counts.entry(id).or_default() += 1;
    }

    /// Number of repeat references to `id`.
    pub fn use_count(&self, id: TypeId) -> usize {
        self.use_counts.get(&id).copied().unwrap_or(0)
    }

    /// Number of stored definitions.
    pub fn definition_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.definition.is_some())
            .count()
    }

    /// Consumes the registry into the definitions section, keyed by
    /// reference id in first-registration order.
    pub fn into_definitions(self) -> SchemaDoc {
        let mut defs = SchemaDoc::new();
        for (id, entry) in &self.entries {
            if let (Some(doc), Some(ref_id)) = (&entry.definition, self.resolve_id(*id)) {
                defs.set(ref_id, doc.clone());
            }
        }
        defs
    }
}
