//! # Extraction Engine
//!
//! Recursive walk over the type graph producing an ordered JSON Schema.
//!
//! Every call to [`Extractor::extract`] is an independent session with its
//! own [`DefinitionRegistry`]. Named types are extracted once; later
//! encounters become `$ref`s into the shared definitions section, which is
//! what keeps self-referential types finite.

use crate::classifier::Classifier;
use crate::config::{DocumentOptions, ExtractOptions};
use crate::directives;
use crate::docs::{DocProvider, NoDocs};
use crate::error::{AppError, AppResult};
use crate::graph::{StructType, TypeGraph, TypeId, TypeRef};
use crate::loader::LoadedTypes;
use crate::registry::DefinitionRegistry;
use crate::schema_doc::SchemaDoc;
use log::{debug, warn};
use std::collections::HashSet;

/// Entry point of the extraction engine.
pub struct Extractor<'a> {
    graph: &'a TypeGraph,
    options: &'a ExtractOptions,
    docs: &'a dyn DocProvider,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor without documentation.
    pub fn new(graph: &'a TypeGraph, options: &'a ExtractOptions) -> Self {
        Self {
            graph,
            options,
            docs: &NoDocs,
        }
    }

    /// Attaches a documentation provider.
    pub fn with_docs(mut self, docs: &'a dyn DocProvider) -> Self {
        self.docs = docs;
        self
    }

    /// Extracts `root` in a fresh session.
    pub fn extract(&self, root: &TypeRef) -> AppResult<Extraction> {
        let mut session = Session {
            graph: self.graph,
            options: self.options,
            docs: self.docs,
            classifier: Classifier::new(self.graph, self.options.loose),
            registry: DefinitionRegistry::new(),
            failed: HashSet::new(),
        };
        let body = session.extract(root, None, true)?;

        Ok(Extraction {
            root: match root {
                TypeRef::Named(id) => Some(*id),
                _ => None,
            },
            body,
            registry: session.registry,
            ref_root: self.options.ref_root.clone(),
        })
    }
}

struct Session<'a> {
    graph: &'a TypeGraph,
    options: &'a ExtractOptions,
    docs: &'a dyn DocProvider,
    classifier: Classifier<'a>,
    registry: DefinitionRegistry,
    failed: HashSet<TypeId>,
}

impl Session<'_> {
    /// `owner` is the nearest enclosing named type, used for field docs and
    /// diagnostics.
    fn extract(
        &mut self,
        ty: &TypeRef,
        owner: Option<TypeId>,
        is_root: bool,
    ) -> AppResult<SchemaDoc> {
        match ty {
            TypeRef::Named(id) => self.extract_named(*id, is_root),
            TypeRef::Struct(shape) => self.extract_struct(ty, shape, owner),
            TypeRef::Pointer(inner) => self.extract(inner, owner, is_root),
            TypeRef::Slice(elem) | TypeRef::Array { elem, .. } => {
                let mut doc = self.classifier.classify(ty)?;
                let items = self.extract(elem, owner, false)?;
                doc.set("items", items);
                Ok(doc)
            }
            TypeRef::Map { value, .. } => {
                let mut doc = self.classifier.shallow(ty)?;
                let items = self.extract(value, owner, false)?;
                doc.set("additionalProperties", items);
                Ok(doc)
            }
            _ => self.classifier.classify(ty),
        }
    }

    fn extract_named(&mut self, id: TypeId, is_root: bool) -> AppResult<SchemaDoc> {
        let named = self.graph.named(id);

        if self.failed.contains(&id) {
            return Err(AppError::unsupported(
                named.name.clone(),
                "extraction failed on an earlier encounter",
            ));
        }

        if self.registry.is_registered(id) {
            self.registry.record_use(id);
            let ref_id = self.ref_id(id)?;
            return Ok(SchemaDoc::reference(&self.options.ref_root, &ref_id));
        }

        self.registry.register(id, &named.name);
        let shape = self.graph.underlying(id)?;
        let mut doc = match self.extract(shape, Some(id), false) {
            Ok(doc) => doc,
            Err(err) => {
                self.failed.insert(id);
                return Err(err);
            }
        };

        if is_root {
            return Ok(doc);
        }

        if let Some(description) = self.docs.type_doc(id) {
            doc.set("description", description);
        }
        let ref_id = self.ref_id(id)?;
        debug!("defining {} as {}", named.qualified_name(), ref_id);
        self.registry.define_once(id, doc);
        Ok(SchemaDoc::reference(&self.options.ref_root, &ref_id))
    }

    fn extract_struct(
        &mut self,
        ty: &TypeRef,
        shape: &StructType,
        owner: Option<TypeId>,
    ) -> AppResult<SchemaDoc> {
        let mut doc = self.classifier.classify(ty)?;
        let additional = doc.take("additionalProperties");

        let mut properties = SchemaDoc::new();
        let mut required: Vec<String> = Vec::new();

        for field in &shape.fields {
            let Some(directive) = directives::resolve(field, self.options) else {
                continue;
            };

            let mut field_doc = match self.extract(&field.ty, owner, false) {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(
                        "{}: {} in {} -- {}",
                        field.name,
                        self.graph.display(&field.ty),
                        self.owner_name(owner),
                        err
                    );
                    continue;
                }
            };

            if let Some(description) = owner.and_then(|o| self.docs.field_doc(o, &field.name)) {
                field_doc.set("description", description);
            }
            directive.apply_overrides(&mut field_doc);

            if properties.contains_key(&directive.name) {
                warn!(
                    "{}: property {} emitted twice in {}",
                    field.name,
                    directive.name,
                    self.owner_name(owner)
                );
            }
            // The last field emitting a name decides its requiredness.
            required.retain(|name| *name != directive.name);
            if directive.required {
                required.push(directive.name.clone());
            }
            properties.set(directive.name, field_doc);
        }

        doc.set("properties", properties);
        if !required.is_empty() {
            doc.set("required", required);
        }
        if let Some(additional) = additional {
            doc.set("additionalProperties", additional);
        }
        Ok(doc)
    }

    fn ref_id(&self, id: TypeId) -> AppResult<String> {
        self.registry.resolve_id(id).ok_or_else(|| {
            AppError::General(format!(
                "no reference id for {}",
                self.graph.named(id).qualified_name()
            ))
        })
    }

    fn owner_name(&self, owner: Option<TypeId>) -> String {
        owner
            .map(|id| self.graph.named(id).qualified_name())
            .unwrap_or_else(|| "anonymous struct".to_string())
    }
}

/// Result of one extraction session.
pub struct Extraction {
    root: Option<TypeId>,
    body: SchemaDoc,
    registry: DefinitionRegistry,
    ref_root: String,
}

impl Extraction {
    /// Repeat references to the root type.
    pub fn root_use_count(&self) -> usize {
        self.root.map_or(0, |id| self.registry.use_count(id))
    }

    /// Assembles the schema without top-level metadata: the root is hoisted
    /// into the definitions section when it is referenced from inside, and
    /// the definitions section is appended when non-empty.
    pub fn into_schema(self) -> SchemaDoc {
        let Extraction {
            root,
            mut body,
            mut registry,
            ref_root,
        } = self;

        if let Some(root) = root.filter(|id| registry.use_count(*id) >= 1) {
            if let Some(ref_id) = registry.resolve_id(root) {
                debug!("hoisting root into {}/{}", ref_root, ref_id);
                registry.define_once(root, body);
                body = SchemaDoc::reference(&ref_root, &ref_id);
            }
        }

        if registry.definition_count() > 0 {
            body.set(ref_root, registry.into_definitions());
        }
        body
    }

    /// Assembles the final document: `$schema`, `title`, `description`, then
    /// the schema from [`Extraction::into_schema`].
    pub fn into_document(self, options: &DocumentOptions) -> SchemaDoc {
        let mut doc = SchemaDoc::new();
        doc.set("$schema", options.schema_spec.as_str());
        if let Some(title) = &options.title {
            doc.set("title", title.as_str());
        }
        if let Some(description) = &options.description {
            doc.set("description", description.as_str());
        }
        doc.extend(self.into_schema());
        doc
    }
}

/// Resolves `query` among the loaded declarations and produces its document.
pub fn generate_schema(
    loaded: &LoadedTypes,
    query: &str,
    options: &ExtractOptions,
    document: &DocumentOptions,
) -> AppResult<SchemaDoc> {
    let id = loaded.resolve(query)?;
    let extraction = Extractor::new(&loaded.graph, options)
        .with_docs(&loaded.docs)
        .extract(&TypeRef::Named(id))?;
    Ok(extraction.into_document(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::DocIndex;
    use crate::graph::{Field, InterfaceType, ScalarKind};
    use serde_json::{json, Value};

    fn string() -> TypeRef {
        TypeRef::Scalar(ScalarKind::Str)
    }

    fn int() -> TypeRef {
        TypeRef::Scalar(ScalarKind::Isize)
    }

    fn object(fields: Vec<Field>) -> TypeRef {
        TypeRef::Struct(StructType::new(fields))
    }

    fn schema_of(graph: &TypeGraph, root: TypeId) -> Value {
        let options = ExtractOptions::default();
        Extractor::new(graph, &options)
            .extract(&TypeRef::Named(root))
            .unwrap()
            .into_schema()
            .into_value()
    }

    #[test]
    fn test_simple_struct() {
        let mut graph = TypeGraph::new();
        let s = graph.add(
            "S",
            object(vec![
                Field::new("Name", string()).with_tag(r#"json:"name""#),
                Field::new("Age", int()).with_tag(r#"json:"age""#),
            ]),
        );
        assert_eq!(
            schema_of(&graph, s),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer"}
                },
                "required": ["name", "age"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn test_pointer_field_is_not_required() {
        let mut graph = TypeGraph::new();
        let s = graph.add(
            "S",
            object(vec![
                Field::new("Id", int()),
                Field::new("Age", TypeRef::pointer(int())),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(schema["required"], json!(["Id"]));
        assert_eq!(schema["properties"]["Age"], json!({"type": "integer"}));
    }

    #[test]
    fn test_repeated_named_type_is_defined_once() {
        let mut graph = TypeGraph::new();
        let name = graph.add("Name", string());
        let s = graph.add(
            "S",
            object(vec![
                Field::new("First", TypeRef::Named(name)),
                Field::new("Last", TypeRef::Named(name)),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(schema["properties"]["First"], json!({"$ref": "#/$defs/Name"}));
        assert_eq!(schema["properties"]["Last"], json!({"$ref": "#/$defs/Name"}));
        assert_eq!(schema["$defs"], json!({"Name": {"type": "string"}}));
    }

    #[test]
    fn test_self_reference_hoists_root() {
        let mut graph = TypeGraph::new();
        let node = graph.declare("Node", None);
        graph.define(
            node,
            object(vec![
                Field::new("Value", int()),
                Field::new("Next", TypeRef::pointer(TypeRef::Named(node))),
            ]),
        );
        let options = ExtractOptions::default();
        let extraction = Extractor::new(&graph, &options)
            .extract(&TypeRef::Named(node))
            .unwrap();
        assert_eq!(extraction.root_use_count(), 1);
        assert_eq!(
            extraction.into_schema().into_value(),
            json!({
                "$ref": "#/$defs/Node",
                "$defs": {
                    "Node": {
                        "type": "object",
                        "properties": {
                            "Value": {"type": "integer"},
                            "Next": {"$ref": "#/$defs/Node"}
                        },
                        "required": ["Value"],
                        "additionalProperties": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_short_name_collision() {
        let mut graph = TypeGraph::new();
        let a = graph.declare("Name", Some("a.rs".into()));
        graph.define(a, string());
        let b = graph.declare("Name", Some("b.rs".into()));
        graph.define(b, int());
        let s = graph.add(
            "S",
            object(vec![
                Field::new("A", TypeRef::Named(a)),
                Field::new("B", TypeRef::Named(b)),
                Field::new("Again", TypeRef::Named(a)),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(schema["properties"]["A"], json!({"$ref": "#/$defs/Name"}));
        assert_eq!(schema["properties"]["B"], json!({"$ref": "#/$defs/Name1"}));
        assert_eq!(schema["properties"]["Again"], json!({"$ref": "#/$defs/Name"}));
        assert_eq!(
            schema["$defs"],
            json!({"Name": {"type": "string"}, "Name1": {"type": "integer"}})
        );
    }

    #[test]
    fn test_unsupported_field_is_skipped() {
        let mut graph = TypeGraph::new();
        let stringer = TypeRef::Interface(InterfaceType {
            methods: vec!["Display".into()],
        });
        let s = graph.add(
            "S",
            object(vec![
                Field::new("Greeting", stringer.clone()),
                Field::new("Items", TypeRef::slice(stringer)),
                Field::new("Name", string()),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(schema["properties"], json!({"Name": {"type": "string"}}));
        assert_eq!(schema["required"], json!(["Name"]));
    }

    #[test]
    fn test_failed_named_type_never_becomes_dangling_ref() {
        let mut graph = TypeGraph::new();
        let bad = graph.add("Bad", TypeRef::Opaque("fn()".into()));
        let s = graph.add(
            "S",
            object(vec![
                Field::new("One", TypeRef::Named(bad)),
                Field::new("Two", TypeRef::Named(bad)),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(schema["properties"], json!({}));
        assert!(schema.get("$defs").is_none());
    }

    #[test]
    fn test_unsupported_root_is_fatal() {
        let mut graph = TypeGraph::new();
        let bad = graph.add(
            "Greeter",
            TypeRef::Interface(InterfaceType {
                methods: vec!["Display".into()],
            }),
        );
        let options = ExtractOptions::default();
        let result = Extractor::new(&graph, &options).extract(&TypeRef::Named(bad));
        assert!(matches!(result, Err(AppError::Unsupported { .. })));
    }

    #[test]
    fn test_collections_and_any() {
        let mut graph = TypeGraph::new();
        let s = graph.add(
            "S",
            object(vec![
                Field::new("Friends", TypeRef::slice(string())),
                Field::new("Items", TypeRef::map(string(), int())),
                Field::new("Grid", TypeRef::array(TypeRef::Scalar(ScalarKind::U8), 4)),
                Field::new("Any", TypeRef::Interface(InterfaceType::any())),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(
            schema["properties"],
            json!({
                "Friends": {"type": "array", "items": {"type": "string"}},
                "Items": {"type": "object", "additionalProperties": {"type": "integer"}},
                "Grid": {
                    "type": "array",
                    "maxItems": 4,
                    "items": {"type": "integer", "minimum": 0}
                },
                "Any": {
                    "type": "object",
                    "additionalProperties": true,
                    "description": "any (dynamic value)"
                }
            })
        );
    }

    #[test]
    fn test_docs_and_overrides() {
        let mut graph = TypeGraph::new();
        let sub = graph.add("Sub", object(vec![Field::new("Name", string())]));
        let s = graph.add(
            "S",
            object(vec![
                Field::new("Sub", TypeRef::Named(sub)).with_tag(r#"json:"sub,omitempty""#),
                Field::new("Age", int()).with_tag(
                    r#"json:"age" jsonschema-override:"{'required': false, 'deprecated': true}""#,
                ),
            ]),
        );
        let mut docs = DocIndex::new();
        docs.insert_type(s, "root docs are not emitted");
        docs.insert_type(sub, "named sub-struct");
        docs.insert_field(s, "Age", "age of object");
        docs.insert_field(sub, "Name", "name of something");

        let options = ExtractOptions::default();
        let schema = Extractor::new(&graph, &options)
            .with_docs(&docs)
            .extract(&TypeRef::Named(s))
            .unwrap()
            .into_schema()
            .into_value();

        assert!(schema.get("description").is_none());
        assert!(schema.get("required").is_none());
        assert_eq!(
            schema["properties"]["Age"],
            json!({"type": "integer", "description": "age of object", "deprecated": true})
        );
        assert_eq!(
            schema["$defs"]["Sub"],
            json!({
                "type": "object",
                "properties": {"Name": {"type": "string", "description": "name of something"}},
                "required": ["Name"],
                "additionalProperties": false,
                "description": "named sub-struct"
            })
        );
    }

    #[test]
    fn test_loose_mode_and_custom_ref_root() {
        let mut graph = TypeGraph::new();
        let name = graph.add("Name", string());
        let s = graph.add("S", object(vec![Field::new("N", TypeRef::Named(name))]));
        let options = ExtractOptions::default()
            .with_loose(true)
            .with_ref_root("definitions");
        let schema = Extractor::new(&graph, &options)
            .extract(&TypeRef::Named(s))
            .unwrap()
            .into_schema()
            .into_value();
        assert_eq!(schema["additionalProperties"], json!(true));
        assert_eq!(
            schema["properties"]["N"],
            json!({"$ref": "#/definitions/Name"})
        );
        assert_eq!(schema["definitions"]["Name"], json!({"type": "string"}));
    }

    #[test]
    fn test_document_key_order() {
        let mut graph = TypeGraph::new();
        let s = graph.add("S", object(vec![Field::new("N", string())]));
        let options = ExtractOptions::default();
        let doc = Extractor::new(&graph, &options)
            .extract(&TypeRef::Named(s))
            .unwrap()
            .into_document(
                &DocumentOptions::default()
                    .with_title("S")
                    .with_description("generated"),
            );
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(
            keys,
            vec![
                "$schema",
                "title",
                "description",
                "type",
                "properties",
                "required",
                "additionalProperties"
            ]
        );
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut graph = TypeGraph::new();
        let name = graph.add("Name", string());
        let s = graph.add("S", object(vec![Field::new("N", TypeRef::Named(name))]));
        let options = ExtractOptions::default();
        let extractor = Extractor::new(&graph, &options);
        let first = extractor.extract(&TypeRef::Named(s)).unwrap().into_schema();
        let second = extractor.extract(&TypeRef::Named(s)).unwrap().into_schema();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_map_of_itself_references_its_definition() {
        let mut graph = TypeGraph::new();
        let tree = graph.declare("Tree", None);
        graph.define(tree, TypeRef::map(string(), TypeRef::Named(tree)));
        let forest = graph.declare("Forest", None);
        graph.define(
            forest,
            TypeRef::map(string(), TypeRef::pointer(TypeRef::Named(forest))),
        );
        let root = graph.add(
            "Root",
            object(vec![
                Field::new("Tree", TypeRef::Named(tree)),
                Field::new("Forest", TypeRef::Named(forest)),
            ]),
        );

        assert_eq!(
            schema_of(&graph, root),
            json!({
                "type": "object",
                "properties": {
                    "Tree": {"$ref": "#/$defs/Tree"},
                    "Forest": {"$ref": "#/$defs/Forest"}
                },
                "required": ["Tree", "Forest"],
                "additionalProperties": false,
                "$defs": {
                    "Tree": {"type": "object", "additionalProperties": {"$ref": "#/$defs/Tree"}},
                    "Forest": {"type": "object", "additionalProperties": {"$ref": "#/$defs/Forest"}}
                }
            })
        );
        assert_eq!(
            schema_of(&graph, tree),
            json!({
                "$ref": "#/$defs/Tree",
                "$defs": {
                    "Tree": {"type": "object", "additionalProperties": {"$ref": "#/$defs/Tree"}}
                }
            })
        );
    }

    #[test]
    fn test_anonymous_struct_is_inlined_with_owner_docs() {
        let mut graph = TypeGraph::new();
        let name = graph.add("Name", string());
        let s3 = graph.add(
            "S3",
            object(vec![Field::new(
                "Unnamed",
                object(vec![
                    Field::new("Name", TypeRef::Named(name)).with_tag(r#"json:"name""#),
                    Field::new("Nick", TypeRef::pointer(string())),
                ]),
            )
            .with_tag(r#"json:"unnamed,omitempty""#)]),
        );
        let mut docs = DocIndex::new();
        docs.insert_field(s3, "Unnamed", "inline part");
        docs.insert_field(s3, "Name", "name of the inline part");

        let options = ExtractOptions::default();
        let schema = Extractor::new(&graph, &options)
            .with_docs(&docs)
            .extract(&TypeRef::Named(s3))
            .unwrap()
            .into_schema()
            .into_value();

        assert!(schema.get("required").is_none());
        assert_eq!(
            schema["properties"]["unnamed"],
            json!({
                "type": "object",
                "properties": {
                    "name": {"$ref": "#/$defs/Name", "description": "name of the inline part"},
                    "Nick": {"type": "string"}
                },
                "required": ["name"],
                "additionalProperties": false,
                "description": "inline part"
            })
        );
        assert_eq!(schema["$defs"], json!({"Name": {"type": "string"}}));
    }

    #[test]
    fn test_duplicate_property_takes_last_requiredness() {
        let mut graph = TypeGraph::new();
        let s = graph.add(
            "S",
            object(vec![
                Field::new("A", int()).with_tag(r#"json:"x""#),
                Field::new("B", string()).with_tag(r#"json:"x,omitempty""#),
                Field::new("C", int()).with_tag(r#"json:"y,omitempty""#),
                Field::new("D", string()).with_tag(r#"json:"y""#),
            ]),
        );
        let schema = schema_of(&graph, s);
        assert_eq!(
            schema["properties"],
            json!({"x": {"type": "string"}, "y": {"type": "string"}})
        );
        assert_eq!(schema["required"], json!(["y"]));
    }
}
