//! # Source Loader
//!
//! Loads Rust source files into a [`TypeGraph`] plus the documentation found
//! next to each declaration.
//!
//! Loading runs in two passes so that declarations can refer to each other
//! regardless of file or declaration order: every struct and enum is declared
//! first, then every shape is resolved.

use crate::docs::DocIndex;
use crate::error::{AppError, AppResult};
use crate::graph::{TypeGraph, TypeId};
use log::{debug, info};
use ra_ap_edition::Edition;
use ra_ap_syntax::SourceFile;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Attribute parsing.
pub mod attributes;
mod declarations;
mod types;

use declarations::{collect, shape};
use types::TypeResolver;

/// Accumulates source files before building the graph.
#[derive(Debug, Default)]
pub struct SourceLoader {
    sources: Vec<(PathBuf, String)>,
}

impl SourceLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds in-memory source code under a display origin.
    pub fn add_source(&mut self, origin: impl Into<PathBuf>, code: impl Into<String>) -> &mut Self {
        self.sources.push((origin.into(), code.into()));
        self
    }

    /// Adds a `.rs` file, or every `.rs` file below a directory in sorted
    /// order. `target` and hidden directories are skipped.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> AppResult<&mut Self> {
        let path = path.as_ref();
        if path.is_file() {
            let code = fs::read_to_string(path)?;
            self.add_source(path, code);
            return Ok(self);
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e.path(), e.file_type().is_dir()));
        for entry in walker {
            let entry = entry.map_err(|e| AppError::General(format!("Walk error: {}", e)))?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|x| x == "rs") {
                let code = fs::read_to_string(entry.path())?;
                debug!("Queued {}", entry.path().display());
                self.add_source(entry.path(), code);
            }
        }
        Ok(self)
    }

    /// Number of queued files.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when nothing was queued.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parses every queued file and builds the graph.
    pub fn finish(self) -> LoadedTypes {
        let mut graph = TypeGraph::new();
        let mut scopes = Vec::with_capacity(self.sources.len());
        let mut pending = Vec::with_capacity(self.sources.len());

        for (origin, code) in &self.sources {
            let parse = SourceFile::parse(code, Edition::Edition2021);
            if !parse.errors().is_empty() {
                debug!(
                    "{}: {} syntax errors, loading what parsed",
                    origin.display(),
                    parse.errors().len()
                );
            }
            let (scope, decls) = collect(&parse.tree(), origin, &mut graph);
            scopes.push(scope);
            pending.push(decls);
        }

        let mut docs = DocIndex::new();
        let shapes: Vec<_> = {
            let resolver = TypeResolver {
                graph: &graph,
                files: &scopes,
            };
            pending
                .iter()
                .enumerate()
                .flat_map(|(file, decls)| decls.iter().map(move |d| (file, d)))
                .map(|(file, (id, decl))| (*id, shape(&resolver, file, *id, decl, &mut docs)))
                .collect()
        };
        for (id, ty) in shapes {
            graph.define(id, ty);
        }

        info!(
            "Loaded {} declarations from {} files",
            graph.len(),
            self.sources.len()
        );
        LoadedTypes { graph, docs }
    }
}

fn is_ignored_dir(path: &Path, is_dir: bool) -> bool {
    is_dir
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == "target" || n.starts_with('.'))
}

/// The result of loading: the type graph and its documentation.
#[derive(Debug, Clone, Default)]
pub struct LoadedTypes {
    /// Every loaded declaration.
    pub graph: TypeGraph,
    /// Declaration and field comments.
    pub docs: DocIndex,
}

impl LoadedTypes {
    /// Finds the declaration named by `query`: either `Name` or
    /// `path/to/file.rs::Name`, where the path is matched as a suffix of the
    /// declaring file.
    pub fn resolve(&self, query: &str) -> AppResult<TypeId> {
        let (file, name) = match query.rsplit_once("::") {
            Some((file, name)) if file.ends_with(".rs") => (Some(Path::new(file)), name),
            _ => (None, query),
        };

        let candidates: Vec<TypeId> = self
            .graph
            .lookup(name)
            .iter()
            .copied()
            .filter(|id| match (file, &self.graph.named(*id).origin) {
                (Some(file), Some(origin)) => origin.ends_with(file),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();

        match candidates.as_slice() {
            [] => Err(AppError::NotFound(query.to_string())),
            [id] => Ok(*id),
            _ => Err(AppError::Ambiguous {
                name: query.to_string(),
                candidates: candidates
                    .iter()
                    .map(|id| self.graph.named(*id).qualified_name())
                    .collect(),
            }),
        }
    }
}
