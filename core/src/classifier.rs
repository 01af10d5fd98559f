//! # Type Classifier
//!
//! Maps a single type to its base JSON Schema fragment. Naming, reuse and
//! nested item schemas are the extractor's business; this module only knows
//! what a shape looks like on its own.

use crate::error::{AppError, AppResult};
use crate::graph::{ScalarKind, TypeGraph, TypeId, TypeRef};
use crate::schema_doc::SchemaDoc;

/// Description attached to unconstrained dynamic values.
pub const ANY_DESCRIPTION: &str = "any (dynamic value)";

/// Classifies types of one graph.
pub struct Classifier<'a> {
    graph: &'a TypeGraph,
    loose: bool,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier; `loose` controls `additionalProperties` on structs.
    pub fn new(graph: &'a TypeGraph, loose: bool) -> Self {
        Self { graph, loose }
    }

    /// Returns the base fragment for `ty`, or `Unsupported`.
    pub fn classify(&self, ty: &TypeRef) -> AppResult<SchemaDoc> {
        self.classify_in(ty, &mut Vec::new())
    }

    /// Like [`Classifier::classify`], but a map only yields `{"type": "object"}`;
    /// the caller attaches the value schema.
    pub fn shallow(&self, ty: &TypeRef) -> AppResult<SchemaDoc> {
        match ty {
            TypeRef::Map { .. } => Ok(SchemaDoc::typed("object")),
            _ => self.classify(ty),
        }
    }

    /// `visiting` holds the named types being expanded; re-entering one
    /// cannot be expressed without a `$ref`.
    fn classify_in(&self, ty: &TypeRef, visiting: &mut Vec<TypeId>) -> AppResult<SchemaDoc> {
        match ty {
            TypeRef::Named(id) => {
                if visiting.contains(id) {
                    return Err(AppError::unsupported(
                        self.graph.named(*id).name.clone(),
                        "type contains itself and needs a definition reference",
                    ));
                }
                visiting.push(*id);
                let doc = self.classify_in(self.graph.underlying(*id)?, visiting);
                visiting.pop();
                doc
            }
            TypeRef::Pointer(inner) => self.classify_in(inner, visiting),
            TypeRef::Scalar(kind) => Ok(scalar(*kind)),
            TypeRef::Slice(_) => Ok(SchemaDoc::typed("array")),
            TypeRef::Array { len, .. } => {
                let mut doc = SchemaDoc::typed("array");
                doc.set("maxItems", *len);
                Ok(doc)
            }
            TypeRef::Map { value, .. } => {
                let mut doc = SchemaDoc::typed("object");
                doc.set("additionalProperties", self.classify_in(value, visiting)?);
                Ok(doc)
            }
            TypeRef::Interface(iface) if iface.is_empty() => {
                let mut doc = SchemaDoc::typed("object");
                doc.set("additionalProperties", true);
                doc.set("description", ANY_DESCRIPTION);
                Ok(doc)
            }
            TypeRef::Interface(_) => Err(AppError::unsupported(
                self.graph.display(ty).to_string(),
                "interface with methods has no schema representation",
            )),
            TypeRef::Struct(_) => {
                let mut doc = SchemaDoc::typed("object");
                doc.set("additionalProperties", self.loose);
                Ok(doc)
            }
            TypeRef::Opaque(desc) => Err(AppError::unsupported(
                desc.clone(),
                "no schema representation",
            )),
        }
    }
}

fn scalar(kind: ScalarKind) -> SchemaDoc {
    match kind {
        ScalarKind::Bool => SchemaDoc::typed("boolean"),
        k if k.is_signed_integer() => SchemaDoc::typed("integer"),
        k if k.is_unsigned_integer() => {
            let mut doc = SchemaDoc::typed("integer");
            doc.set("minimum", 0);
            doc
        }
        ScalarKind::Str | ScalarKind::Char => SchemaDoc::typed("string"),
        // Unmapped kinds keep a non-standard marker instead of a guess.
        other => SchemaDoc::typed(&format!("rust:{}", other.kind_name())),
    }
}
