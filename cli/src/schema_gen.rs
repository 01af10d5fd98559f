#![deny(missing_docs)]

//! # Schema Generation Command
//!
//! Loads Rust sources, resolves the queried declaration and renders its JSON
//! Schema document as JSON or YAML.

use genschema_core::error::{AppError, AppResult};
use genschema_core::{
    generate_schema, DocumentOptions, ExtractOptions, SchemaDoc, SourceLoader, DRAFT_07,
};
use log::info;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Arguments of the `genschema` command.
#[derive(clap::Args, Debug, Clone)]
pub struct SchemaGenArgs {
    /// Rust source files or directories to load (directories are walked for `*.rs`).
    #[clap(long, env = "GENSCHEMA_SOURCE", value_delimiter = ',', default_value = ".")]
    pub source: Vec<PathBuf>,

    /// Type to extract: `Name` or `path/to/file.rs::Name`.
    #[clap(long, env = "GENSCHEMA_QUERY")]
    pub query: String,

    /// Allow additional properties on struct objects.
    #[clap(long, env = "GENSCHEMA_LOOSE")]
    pub loose: bool,

    /// Tag keys consulted for property names, in priority order.
    #[clap(
        long,
        env = "GENSCHEMA_NAME_TAG",
        value_delimiter = ',',
        default_values = ["json", "yaml", "toml"]
    )]
    pub name_tag: Vec<String>,

    /// Tag key carrying JSON schema overrides.
    #[clap(long, env = "GENSCHEMA_OVERRIDE_TAG", default_value = "jsonschema-override")]
    pub override_tag: String,

    /// Key of the shared definitions section.
    #[clap(long, env = "GENSCHEMA_REF_ROOT", default_value = "$defs")]
    pub ref_root: String,

    /// `title` of the document.
    #[clap(long, env = "GENSCHEMA_SCHEMA_TITLE")]
    pub schema_title: Option<String>,

    /// `description` of the document. Defaults to the invocation.
    #[clap(long, env = "GENSCHEMA_SCHEMA_DESCRIPTION")]
    pub schema_description: Option<String>,

    /// `$schema` of the document.
    #[clap(long, env = "GENSCHEMA_SCHEMA_SPEC", default_value = DRAFT_07)]
    pub schema_spec: String,

    /// Indentation unit of JSON output.
    #[clap(long, env = "GENSCHEMA_INDENT", default_value = "\t")]
    pub indent: String,

    /// Output path. Supports .json and .yaml/.yml extensions.
    /// If not provided, prints JSON to stdout.
    #[clap(long, env = "GENSCHEMA_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl SchemaGenArgs {
    /// Options steering the extraction.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::default()
            .with_loose(self.loose)
            .with_name_tags(self.name_tag.iter().cloned())
            .with_override_tag(self.override_tag.as_str())
            .with_ref_root(self.ref_root.as_str())
    }

    /// Options of the top-level document; `invocation` fills the default
    /// description.
    pub fn document_options(&self, invocation: &str) -> DocumentOptions {
        let description = self
            .schema_description
            .clone()
            .unwrap_or_else(|| format!("Generated by `{}`", invocation));
        let options = DocumentOptions::default()
            .with_schema_spec(self.schema_spec.as_str())
            .with_description(description);
        match &self.schema_title {
            Some(title) => options.with_title(title.as_str()),
            None => options,
        }
    }
}

/// Output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn for_output(output: Option<&Path>) -> Self {
        match output.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

/// Builds the document for `args` and renders it.
pub fn render(args: &SchemaGenArgs, invocation: &str) -> AppResult<String> {
    let mut loader = SourceLoader::new();
    for source in &args.source {
        if !source.exists() {
            return Err(AppError::General(format!(
                "Source path not found: {:?}",
                source
            )));
        }
        loader.add_path(source)?;
    }
    info!("Loading {} source files", loader.len());
    let loaded = loader.finish();

    let doc = generate_schema(
        &loaded,
        &args.query,
        &args.extract_options(),
        &args.document_options(invocation),
    )?;

    match Format::for_output(args.output.as_deref()) {
        Format::Yaml => serde_yaml::to_string(&doc)
            .map_err(|e| AppError::Serialization(format!("YAML serialization failed: {}", e))),
        Format::Json => to_json(&doc, &args.indent),
    }
}

/// JSON with one `indent` per nesting level and a trailing newline; an empty
/// indent gives compact output.
fn to_json(doc: &SchemaDoc, indent: &str) -> AppResult<String> {
    let mut buf = Vec::new();
    let result = if indent.is_empty() {
        serde_json::to_writer(&mut buf, doc)
    } else {
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        doc.serialize(&mut ser)
    };
    result.map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| AppError::Serialization(e.to_string()))
}

/// Executes the schema generation.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `invocation` - Command line, used for the default description.
pub fn execute(args: &SchemaGenArgs, invocation: &str) -> AppResult<()> {
    let rendered = render(args, invocation)?;

    if let Some(out_path) = &args.output {
        if let Some(parent) = out_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(out_path, rendered)?;
        info!("Schema generated at {:?}", out_path);
    } else {
        std::io::stdout().lock().write_all(rendered.as_bytes())?;
    }

    Ok(())
}
