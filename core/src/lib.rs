#![deny(missing_docs)]

//! # Genschema Core
//!
//! Derives JSON Schema documents from type declarations: a type graph is
//! classified, field directives are resolved from tags, and named types are
//! collected into a shared definitions section referenced by `$ref`.

/// Shared error types.
pub mod error;

/// Type graph model.
pub mod graph;

/// Ordered schema documents.
pub mod schema_doc;

/// Extraction and document options.
pub mod config;

/// Documentation seam.
pub mod docs;

/// Type classification (type -> JSON Schema fragment).
pub mod classifier;

/// Field tag directives.
pub mod directives;

/// Definition bookkeeping per extraction session.
pub mod registry;

/// Recursive schema extraction.
pub mod extractor;

/// Rust source loading.
pub mod loader;

pub use classifier::Classifier;
pub use config::{DocumentOptions, ExtractOptions, DRAFT_07};
pub use directives::{FieldDirective, TagSet};
pub use docs::{DocIndex, DocProvider, NoDocs};
pub use error::{AppError, AppResult};
pub use extractor::{generate_schema, Extraction, Extractor};
pub use graph::{Field, InterfaceType, NamedType, ScalarKind, StructType, TypeGraph, TypeId, TypeRef};
pub use loader::{LoadedTypes, SourceLoader};
pub use registry::DefinitionRegistry;
pub use schema_doc::SchemaDoc;
