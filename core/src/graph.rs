//! # Type Graph
//!
//! In-memory representation of the declarations a schema is extracted from.
//! Named declarations live in an arena and are addressed by [`TypeId`], so two
//! declarations sharing a short name stay distinct and self-referential types
//! can be expressed without cycles in ownership.

use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Identity of a named declaration inside a [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Scalar kinds understood by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `i128`
    I128,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `u128`
    U128,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `char`
    Char,
    /// `String` / `str`
    Str,
    /// `()`
    Unit,
}

impl ScalarKind {
    /// Maps a primitive type name to its kind.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => ScalarKind::Bool,
            "i8" => ScalarKind::I8,
            "i16" => ScalarKind::I16,
            "i32" => ScalarKind::I32,
            "i64" => ScalarKind::I64,
            "i128" => ScalarKind::I128,
            "isize" => ScalarKind::Isize,
            "u8" => ScalarKind::U8,
            "u16" => ScalarKind::U16,
            "u32" => ScalarKind::U32,
            "u64" => ScalarKind::U64,
            "u128" => ScalarKind::U128,
            "usize" => ScalarKind::Usize,
            "f32" => ScalarKind::F32,
            "f64" => ScalarKind::F64,
            "char" => ScalarKind::Char,
            "String" | "str" => ScalarKind::Str,
            _ => return None,
        };
        Some(kind)
    }

    /// Source spelling of the kind.
    pub fn kind_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::I128 => "i128",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::U128 => "u128",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::Str => "String",
            ScalarKind::Unit => "()",
        }
    }

    /// True for the signed integer kinds.
    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::I128
                | ScalarKind::Isize
        )
    }

    /// True for the unsigned integer kinds.
    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            ScalarKind::U8
                | ScalarKind::U16
                | ScalarKind::U32
                | ScalarKind::U64
                | ScalarKind::U128
                | ScalarKind::Usize
        )
    }
}

/// A field of a struct shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared identifier.
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Raw tag metadata, e.g. `json:"name,omitempty" required:"false"`.
    pub tag: String,
    /// Whether the field is visible outside its declaring module.
    pub exported: bool,
}

impl Field {
    /// Creates an exported field without tags.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: String::new(),
            exported: true,
        }
    }

    /// Sets the raw tag string.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Marks the field as hidden.
    pub fn hidden(mut self) -> Self {
        self.exported = false;
        self
    }
}

/// An anonymous struct shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructType {
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

impl StructType {
    /// Creates a struct shape from its fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}

/// An interface shape; no methods means "any value".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceType {
    /// Names of the behavioral constraints.
    pub methods: Vec<String>,
}

impl InterfaceType {
    /// The unconstrained dynamic value.
    pub fn any() -> Self {
        Self::default()
    }

    /// True when the interface carries no behavioral constraints.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Handle to a type, either a named declaration or a structural shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A named declaration in the graph.
    Named(TypeId),
    /// An anonymous struct.
    Struct(StructType),
    /// Optional wrapper.
    Pointer(Box<TypeRef>),
    /// Variable length sequence.
    Slice(Box<TypeRef>),
    /// Fixed length sequence.
    Array {
        /// Element type.
        elem: Box<TypeRef>,
        /// Declared length.
        len: u64,
    },
    /// Associative collection.
    Map {
        /// Key type.
        key: Box<TypeRef>,
        /// Value type.
        value: Box<TypeRef>,
    },
    /// Dynamic value, possibly with behavioral constraints.
    Interface(InterfaceType),
    /// Primitive value.
    Scalar(ScalarKind),
    /// A source construct with no schema analogue.
    Opaque(String),
}

impl TypeRef {
    /// `Option<elem>`
    pub fn pointer(elem: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(elem))
    }

    /// `Vec<elem>`
    pub fn slice(elem: TypeRef) -> Self {
        TypeRef::Slice(Box::new(elem))
    }

    /// `[elem; len]`
    pub fn array(elem: TypeRef, len: u64) -> Self {
        TypeRef::Array {
            elem: Box::new(elem),
            len,
        }
    }

    /// `HashMap<key, value>`
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// True for the optional wrapper.
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeRef::Pointer(_))
    }
}

/// A named declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    /// Short name.
    pub name: String,
    /// Shape (or another named type) the declaration stands for.
    pub underlying: TypeRef,
    /// File the declaration was loaded from.
    pub origin: Option<PathBuf>,
}

impl NamedType {
    /// `file.rs::Name`, or the bare name when the origin is unknown.
    pub fn qualified_name(&self) -> String {
        match &self.origin {
            Some(path) => format!("{}::{}", path.display(), self.name),
            None => self.name.clone(),
        }
    }
}

/// Arena of named declarations.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    types: Vec<NamedType>,
    by_name: HashMap<String, Vec<TypeId>>,
}

impl TypeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves an identity for a declaration; its shape is supplied later
    /// through [`TypeGraph::define`].
    pub fn declare(&mut self, name: impl Into<String>, origin: Option<PathBuf>) -> TypeId {
        let name = name.into();
        let id = TypeId(self.types.len());
        self.by_name.entry(name.clone()).or_default().push(id);
        self.types.push(NamedType {
            name,
            underlying: TypeRef::Opaque("undefined declaration".into()),
            origin,
        });
        id
    }

    /// Sets the shape of a declared type.
    pub fn define(&mut self, id: TypeId, underlying: TypeRef) {
        self.types[id.0].underlying = underlying;
    }

    /// Declares and defines in one step.
    pub fn add(&mut self, name: impl Into<String>, underlying: TypeRef) -> TypeId {
        let id = self.declare(name, None);
        self.define(id, underlying);
        id
    }

    /// Returns the declaration behind an identity.
    pub fn named(&self, id: TypeId) -> &NamedType {
        &self.types[id.0]
    }

    /// All declarations sharing a short name, in declaration order.
    pub fn lookup(&self, name: &str) -> &[TypeId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Follows named-to-named chains down to a structural shape.
    pub fn underlying(&self, id: TypeId) -> AppResult<&TypeRef> {
        let mut current = id;
        for _ in 0..=self.types.len() {
            match &self.named(current).underlying {
                TypeRef::Named(next) => current = *next,
                shape => return Ok(shape),
            }
        }
        Err(AppError::unsupported(
            self.named(id).name.clone(),
            "declaration refers to itself without a structural shape",
        ))
    }

    /// Human readable rendering of a type, used in diagnostics.
    pub fn display<'a>(&'a self, ty: &'a TypeRef) -> DisplayType<'a> {
        DisplayType { graph: self, ty }
    }
}

/// Formatter returned by [`TypeGraph::display`].
pub struct DisplayType<'a> {
    graph: &'a TypeGraph,
    ty: &'a TypeRef,
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.graph;
        match self.ty {
            TypeRef::Named(id) => write!(f, "{}", self.graph.named(*id).name),
            TypeRef::Struct(s) => {
                write!(f, "struct {{ ")?;
                for field in &s.fields {
                    write!(f, "{}: {}, ", field.name, g.display(&field.ty))?;
                }
                write!(f, "}}")
            }
            TypeRef::Pointer(inner) => write!(f, "Option<{}>", g.display(inner)),
            TypeRef::Slice(inner) => write!(f, "Vec<{}>", g.display(inner)),
            TypeRef::Array { elem, len } => write!(f, "[{}; {}]", g.display(elem), len),
            TypeRef::Map { key, value } => {
                write!(f, "Map<{}, {}>", g.display(key), g.display(value))
            }
            TypeRef::Interface(i) if i.is_empty() => write!(f, "any"),
            TypeRef::Interface(i) => write!(f, "dyn {}", i.methods.join(" + ")),
            TypeRef::Scalar(kind) => write!(f, "{}", kind.kind_name()),
            TypeRef::Opaque(desc) => write!(f, "{}", desc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_keeps_distinct_identities() {
        let mut graph = TypeGraph::new();
        let a = graph.declare("Name", Some("a.rs".into()));
        let b = graph.declare("Name", Some("b.rs".into()));
        assert_ne!(a, b);
        assert_eq!(graph.lookup("Name"), &[a, b]);
        assert!(graph.lookup("Missing").is_empty());
        assert_eq!(graph.named(b).qualified_name(), "b.rs::Name");
    }

    #[test]
    fn test_underlying_follows_named_chain() {
        let mut graph = TypeGraph::new();
        let positive = graph.add("PositiveInt", TypeRef::Scalar(ScalarKind::I64));
        let pint = graph.add("PInt", TypeRef::Named(positive));
        assert_eq!(
            graph.underlying(pint).unwrap(),
            &TypeRef::Scalar(ScalarKind::I64)
        );
    }

    #[test]
    fn test_underlying_rejects_named_cycle() {
        let mut graph = TypeGraph::new();
        let a = graph.declare("A", None);
        let b = graph.add("B", TypeRef::Named(a));
        graph.define(a, TypeRef::Named(b));
        assert!(matches!(
            graph.underlying(a),
            Err(AppError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_display_nested() {
        let mut graph = TypeGraph::new();
        let user = graph.add("User", TypeRef::Struct(StructType::default()));
        let ty = TypeRef::map(
            TypeRef::Scalar(ScalarKind::Str),
            TypeRef::slice(TypeRef::pointer(TypeRef::Named(user))),
        );
        assert_eq!(
            graph.display(&ty).to_string(),
            "Map<String, Vec<Option<User>>>"
        );
    }

    #[test]
    fn test_scalar_kind_names() {
        assert_eq!(ScalarKind::from_name("u16"), Some(ScalarKind::U16));
        assert_eq!(ScalarKind::from_name("str"), Some(ScalarKind::Str));
        assert_eq!(ScalarKind::from_name("Foo"), None);
        assert!(ScalarKind::Isize.is_signed_integer());
        assert!(ScalarKind::U8.is_unsigned_integer());
        assert!(!ScalarKind::F64.is_signed_integer());
    }
}
