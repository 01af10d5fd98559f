//! # Declaration Extraction
//!
//! Collects struct, enum and alias declarations from a parsed file and turns
//! each one into the shape stored in the type graph.

use crate::docs::DocIndex;
use crate::graph::{Field, ScalarKind, StructType, TypeGraph, TypeId, TypeRef};
use crate::loader::attributes::extract_attributes;
use crate::loader::types::{FileScope, TypeResolver};
use log::debug;
use ra_ap_syntax::ast::{self, HasName, HasVisibility};
use ra_ap_syntax::{AstNode, SourceFile, SyntaxKind, SyntaxNode, SyntaxToken};
use std::path::Path;

/// A struct or enum waiting for its shape.
pub(crate) enum Declaration {
    Struct(ast::Struct),
    Enum(ast::Enum),
}

impl Declaration {
    fn syntax(&self) -> &SyntaxNode {
        match self {
            Declaration::Struct(s) => s.syntax(),
            Declaration::Enum(e) => e.syntax(),
        }
    }
}

/// Declares every struct and enum of `file` in the graph and records its
/// aliases. Returns the scope of the file and the pending declarations.
pub(crate) fn collect(
    file: &SourceFile,
    origin: &Path,
    graph: &mut TypeGraph,
) -> (FileScope, Vec<(TypeId, Declaration)>) {
    let mut scope = FileScope::default();
    let mut pending = Vec::new();

    for node in file.syntax().descendants() {
        let (name, decl) = if let Some(s) = ast::Struct::cast(node.clone()) {
            (s.name(), Declaration::Struct(s))
        } else if let Some(e) = ast::Enum::cast(node.clone()) {
            (e.name(), Declaration::Enum(e))
        } else if let Some(alias) = ast::TypeAlias::cast(node) {
            if let (Some(name), Some(ty)) = (alias.name(), alias.ty()) {
                scope.aliases.entry(name.text().to_string()).or_insert(ty);
            }
            continue;
        } else {
            continue;
        };
        let Some(name) = name else {
            continue;
        };

        let name = name.text().to_string();
        let id = graph.declare(name.clone(), Some(origin.to_path_buf()));
        scope.locals.entry(name).or_insert(id);
        pending.push((id, decl));
    }

    debug!(
        "{}: {} declarations, {} aliases",
        origin.display(),
        pending.len(),
        scope.aliases.len()
    );
    (scope, pending)
}

/// Builds the shape of a declaration and records its documentation.
pub(crate) fn shape(
    resolver: &TypeResolver<'_>,
    file: usize,
    id: TypeId,
    decl: &Declaration,
    docs: &mut DocIndex,
) -> TypeRef {
    if let Some(doc) = extract_doc_comment(decl.syntax()) {
        docs.insert_type(id, doc);
    }

    match decl {
        Declaration::Struct(s) => struct_shape(resolver, file, id, s, docs),
        Declaration::Enum(e) => enum_shape(e),
    }
}

fn struct_shape(
    resolver: &TypeResolver<'_>,
    file: usize,
    id: TypeId,
    struct_def: &ast::Struct,
    docs: &mut DocIndex,
) -> TypeRef {
    let rename_all = extract_attributes(struct_def.syntax()).rename_all;

    match struct_def.field_list() {
        None => TypeRef::Struct(StructType::default()),
        Some(ast::FieldList::RecordFieldList(list)) => {
            let mut fields = Vec::new();
            for field in list.fields() {
                let (Some(fname), Some(ty)) = (field.name(), field.ty()) else {
                    continue;
                };
                let fname = fname.text().to_string();
                let attrs = extract_attributes(field.syntax());

                if let Some(doc) = extract_doc_comment(field.syntax())
                    .or_else(|| extract_trailing_comment(field.syntax()))
                {
                    docs.insert_field(id, fname.clone(), doc);
                }

                let tag = attrs.field_tag(&fname, rename_all);
                let mut parsed = Field::new(fname, resolver.resolve(file, &ty, Some(id)));
                if !tag.is_empty() {
                    parsed = parsed.with_tag(tag);
                }
                if !is_exported(&field) {
                    parsed = parsed.hidden();
                }
                fields.push(parsed);
            }
            TypeRef::Struct(StructType::new(fields))
        }
        Some(ast::FieldList::TupleFieldList(list)) => {
            let mut tys = list.fields().filter_map(|f| f.ty());
            match (tys.next(), tys.next()) {
                (Some(inner), None) => resolver.resolve(file, &inner, Some(id)),
                (None, _) => TypeRef::Struct(StructType::default()),
                _ => TypeRef::Opaque(format!(
                    "tuple struct {}",
                    struct_def.name().map(|n| n.text().to_string()).unwrap_or_default()
                )),
            }
        }
    }
}

/// Unit-only enums serialize as their variant names.
fn enum_shape(enum_def: &ast::Enum) -> TypeRef {
    let unit_only = enum_def
        .variant_list()
        .map(|list| list.variants().all(|v| v.field_list().is_none()))
        .unwrap_or(true);
    if unit_only {
        TypeRef::Scalar(ScalarKind::Str)
    } else {
        TypeRef::Opaque(format!(
            "enum {} with data-carrying variants",
            enum_def.name().map(|n| n.text().to_string()).unwrap_or_default()
        ))
    }
}

fn is_exported<N: HasVisibility>(node: &N) -> bool {
    node.visibility().is_some_and(|v| v.syntax().text() == "pub")
}

/// Helper to extract `///` comments from a syntax node's trivia children.
pub(crate) fn extract_doc_comment(node: &SyntaxNode) -> Option<String> {
    let mut lines = Vec::new();

    for child in node.children_with_tokens() {
        if child.kind() == SyntaxKind::COMMENT {
            let text = child.to_string();
            if text.starts_with("////") {
                continue;
            }
            if let Some(content) = text.strip_prefix("///") {
                lines.push(content.strip_prefix(' ').unwrap_or(content).to_owned());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n").trim().to_string())
    }
}

/// A plain `//` comment following the node on the same line.
pub(crate) fn extract_trailing_comment(node: &SyntaxNode) -> Option<String> {
    let mut token: Option<SyntaxToken> = node.last_token()?.next_token();
    while let Some(current) = token {
        match current.kind() {
            SyntaxKind::COMMA => {}
            SyntaxKind::WHITESPACE if !current.text().contains('\n') => {}
            SyntaxKind::COMMENT => {
                let text = current.text();
                if text.starts_with("///") || text.starts_with("//!") {
                    return None;
                }
                return text
                    .strip_prefix("//")
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
            }
            _ => return None,
        }
        token = current.next_token();
    }
    None
}
