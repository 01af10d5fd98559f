//! # Configuration
//!
//! Options controlling extraction and the shape of the final document.

/// Default `$schema` value.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Options for one extraction session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// When true, object schemas accept unspecified properties.
    pub loose: bool,
    /// Tag keys consulted for the emitted property name, highest priority first.
    pub name_tags: Vec<String>,
    /// Tag key carrying inline schema overrides.
    pub override_tag: String,
    /// Label of the shared definitions section.
    pub ref_root: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            loose: false,
            name_tags: vec!["json".into(), "yaml".into(), "toml".into()],
            override_tag: "jsonschema-override".into(),
            ref_root: "$defs".into(),
        }
    }
}

impl ExtractOptions {
    /// Sets loose mode.
    pub fn with_loose(mut self, loose: bool) -> Self {
        self.loose = loose;
        self
    }

    /// Replaces the name tag priority list.
    pub fn with_name_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the override tag key.
    pub fn with_override_tag(mut self, tag: impl Into<String>) -> Self {
        self.override_tag = tag.into();
        self
    }

    /// Sets the definitions section label.
    pub fn with_ref_root(mut self, ref_root: impl Into<String>) -> Self {
        self.ref_root = ref_root.into();
        self
    }
}

/// Top-level metadata of the emitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// `$schema` value.
    pub schema_spec: String,
    /// Optional `title`.
    pub title: Option<String>,
    /// Optional `description`.
    pub description: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            schema_spec: DRAFT_07.into(),
            title: None,
            description: None,
        }
    }
}

impl DocumentOptions {
    /// Sets the `$schema` value.
    pub fn with_schema_spec(mut self, spec: impl Into<String>) -> Self {
        self.schema_spec = spec.into();
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
