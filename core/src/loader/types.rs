//! # Type Syntax Mapping
//!
//! Converts Rust type syntax into [`TypeRef`]s of the graph, resolving paths
//! against the declarations collected by the loader.

use crate::graph::{InterfaceType, ScalarKind, TypeGraph, TypeId, TypeRef};
use ra_ap_syntax::ast::{self, HasGenericArgs};
use ra_ap_syntax::AstNode;
use std::collections::HashMap;

/// Alias chains longer than this are treated as cyclic.
const MAX_ALIAS_DEPTH: usize = 32;

/// Bounds that add no behavior to a trait object.
const MARKER_BOUNDS: &[&str] = &["Any", "Send", "Sync", "'static", "Unpin"];

/// Declarations visible from one source file.
#[derive(Default)]
pub(crate) struct FileScope {
    pub(crate) locals: HashMap<String, TypeId>,
    pub(crate) aliases: HashMap<String, ast::Type>,
}

/// Resolves type syntax across every loaded file.
pub(crate) struct TypeResolver<'a> {
    pub(crate) graph: &'a TypeGraph,
    pub(crate) files: &'a [FileScope],
}

impl TypeResolver<'_> {
    /// Maps `ty` as written in file `file`. `self_id` is the declaration
    /// `Self` refers to, if any.
    pub(crate) fn resolve(&self, file: usize, ty: &ast::Type, self_id: Option<TypeId>) -> TypeRef {
        self.resolve_at(file, ty, self_id, 0)
    }

    fn resolve_at(
        &self,
        file: usize,
        ty: &ast::Type,
        self_id: Option<TypeId>,
        depth: usize,
    ) -> TypeRef {
        if depth > MAX_ALIAS_DEPTH {
            return opaque("cyclic type alias", ty);
        }
        let recurse = |inner: Option<ast::Type>| match inner {
            Some(inner) => self.resolve_at(file, &inner, self_id, depth),
            None => opaque("incomplete type", ty),
        };

        match ty {
            ast::Type::PathType(path_type) => match path_type.path() {
                Some(path) => self.resolve_path(file, &path, ty, self_id, depth),
                None => opaque("incomplete type", ty),
            },
            ast::Type::RefType(r) => recurse(r.ty()),
            ast::Type::ParenType(p) => recurse(p.ty()),
            ast::Type::SliceType(s) => TypeRef::slice(recurse(s.ty())),
            ast::Type::ArrayType(a) => {
                let len = a
                    .const_arg()
                    .and_then(|c| parse_length(&c.syntax().text().to_string()));
                match len {
                    Some(len) => TypeRef::array(recurse(a.ty()), len),
                    None => opaque("array with non-literal length", ty),
                }
            }
            ast::Type::TupleType(t) if t.fields().next().is_none() => {
                TypeRef::Scalar(ScalarKind::Unit)
            }
            ast::Type::DynTraitType(_) => dyn_interface(&ty.syntax().text().to_string()),
            _ => opaque("unsupported type syntax", ty),
        }
    }

    fn resolve_path(
        &self,
        file: usize,
        path: &ast::Path,
        ty: &ast::Type,
        self_id: Option<TypeId>,
        depth: usize,
    ) -> TypeRef {
        let Some(segment) = path.segment() else {
            return opaque("incomplete path", ty);
        };
        let Some(name_ref) = segment.name_ref() else {
            return opaque("incomplete path", ty);
        };
        let name = name_ref.text().to_string();

        let args: Vec<ast::Type> = segment
            .generic_arg_list()
            .map(|list| {
                list.generic_args()
                    .filter_map(|arg| match arg {
                        ast::GenericArg::TypeArg(type_arg) => type_arg.ty(),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let arg = |i: usize| match args.get(i) {
            Some(inner) => self.resolve_at(file, inner, self_id, depth),
            None => opaque("missing generic argument", ty),
        };

        if let Some(kind) = ScalarKind::from_name(&name) {
            return TypeRef::Scalar(kind);
        }

        match name.as_str() {
            "Option" => return TypeRef::pointer(arg(0)),
            "Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell" | "Mutex" | "RwLock" => {
                return arg(0)
            }
            "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet"
            | "BinaryHeap" => return TypeRef::slice(arg(0)),
            "HashMap" | "BTreeMap" | "IndexMap" => return TypeRef::map(arg(0), arg(1)),
            "Self" => {
                if let Some(id) = self_id {
                    return TypeRef::Named(id);
                }
            }
            _ => {}
        }

        if let Some(found) = self.lookup_declared(file, &name, self_id, depth) {
            return found;
        }

        match name.as_str() {
            "Value" | "JsonValue" => TypeRef::Interface(InterfaceType::any()),
            "Uuid" | "DateTime" | "NaiveDateTime" | "NaiveDate" | "NaiveTime" | "PathBuf"
            | "Path" | "Url" | "OsString" => TypeRef::Scalar(ScalarKind::Str),
            _ => TypeRef::Opaque(format!("unresolved type {}", ty.syntax().text())),
        }
    }

    /// Same-file declarations and aliases first, then any loaded file.
    fn lookup_declared(
        &self,
        file: usize,
        name: &str,
        self_id: Option<TypeId>,
        depth: usize,
    ) -> Option<TypeRef> {
        let scope = &self.files[file];
        if let Some(id) = scope.locals.get(name) {
            return Some(TypeRef::Named(*id));
        }
        if let Some(target) = scope.aliases.get(name) {
            return Some(self.resolve_at(file, target, self_id, depth + 1));
        }
        if let Some(id) = self.graph.lookup(name).first() {
            return Some(TypeRef::Named(*id));
        }
        self.files
            .iter()
            .enumerate()
            .find_map(|(i, scope)| scope.aliases.get(name).map(|target| (i, target)))
            .map(|(i, target)| self.resolve_at(i, target, self_id, depth + 1))
    }
}

fn opaque(what: &str, ty: &ast::Type) -> TypeRef {
    TypeRef::Opaque(format!("{} {}", what, ty.syntax().text()))
}

/// Parses `3`, `1_024` or `16usize`.
fn parse_length(text: &str) -> Option<u64> {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '_'))
        .unwrap_or(text.len());
    let suffix = &text[end..];
    if !(suffix.is_empty() || suffix.starts_with(['u', 'i'])) {
        return None;
    }
    let digits: String = text[..end].chars().filter(|c| *c != '_').collect();
    digits.parse().ok()
}

/// `dyn A + B` becomes an interface over the non-marker bounds.
fn dyn_interface(text: &str) -> TypeRef {
    let bounds = text.trim().trim_start_matches("dyn").trim();
    let methods = bounds
        .split('+')
        .map(str::trim)
        .filter(|b| !b.is_empty() && !MARKER_BOUNDS.contains(b))
        .map(str::to_string)
        .collect();
    TypeRef::Interface(InterfaceType { methods })
}
