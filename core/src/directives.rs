//! # Field Directives
//!
//! Parses raw field tags (`json:"name,omitempty" required:"false"`) and
//! resolves them into the emitted property name, requiredness, and schema
//! overrides of a single field.

use crate::config::ExtractOptions;
use crate::graph::Field;
use crate::schema_doc::SchemaDoc;
use log::warn;
use serde_json::{Map, Value};

/// Property name that drops a field entirely.
pub const SKIP_SENTINEL: &str = "-";

/// Suffix option that makes a field optional.
pub const OMIT_EMPTY: &str = "omitempty";

/// Tag key carrying an explicit requiredness flag.
pub const REQUIRED_TAG: &str = "required";

/// Ordered `key:"value"` pairs of a raw tag string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    /// Parses a raw tag. Parsing stops at the first malformed pair, keeping
    /// what was read so far.
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        let mut rest = raw;

        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }

            let key_len = rest
                .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
                .unwrap_or(rest.len());
            if key_len == 0 || !rest[key_len..].starts_with(":\"") {
                break;
            }
            let key = &rest[..key_len];
            rest = &rest[key_len + 1..];

            let Some((value, remaining)) = split_quoted(rest) else {
                break;
            };
            entries.push((key.to_string(), value));
            rest = remaining;
        }

        Self { entries }
    }

    /// Value of the first pair with `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no pair was parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits a leading `"..."` off `input`, unescaping its content.
fn split_quoted(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let mut value = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, &body[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            other => value.push(other),
        }
    }

    None
}

/// Boolean spellings accepted by the `required` tag.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Resolved intent for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDirective {
    /// Emitted property name.
    pub name: String,
    /// Whether the property is listed in `required`.
    pub required: bool,
    /// Keys spliced into the field schema after extraction.
    pub overrides: Vec<(String, Value)>,
}

impl FieldDirective {
    /// Applies the override pairs to a field schema fragment.
    pub fn apply_overrides(&self, doc: &mut SchemaDoc) {
        for (key, value) in &self.overrides {
            doc.set(key.clone(), value.clone());
        }
    }
}

/// Resolves the directives of `field`. Returns `None` for fields that emit
/// nothing: hidden fields and fields named with the skip sentinel.
pub fn resolve(field: &Field, options: &ExtractOptions) -> Option<FieldDirective> {
    if !field.exported {
        return None;
    }

    let tags = TagSet::parse(&field.tag);
    let mut name = field.name.clone();
    let mut required = !field.ty.is_pointer();

    if let Some(value) = options
        .name_tags
        .iter()
        .find_map(|key| tags.lookup(key))
    {
        let (prefix, suffix) = value.split_once(',').unwrap_or((value, ""));
        if suffix.contains(OMIT_EMPTY) {
            required = false;
        }
        // An empty name keeps the declared identifier.
        if !prefix.is_empty() {
            name = prefix.to_string();
        }
    }

    if name == SKIP_SENTINEL {
        return None;
    }

    if let Some(raw) = tags.lookup(REQUIRED_TAG) {
        match parse_bool(raw) {
            Some(flag) => required = flag,
            None => warn!("{}: ignoring non-boolean required tag {:?}", field.name, raw),
        }
    }

    let mut overrides = Vec::new();
    if let Some(raw) = tags.lookup(&options.override_tag) {
        for (key, value) in parse_overrides(&options.override_tag, raw) {
            if key == REQUIRED_TAG {
                match value {
                    Value::Bool(flag) => required = flag,
                    other => warn!(
                        "{}: {}: required must be a boolean, got {}",
                        field.name, options.override_tag, other
                    ),
                }
                continue;
            }
            overrides.push((key, value));
        }
    }

    Some(FieldDirective {
        name,
        required,
        overrides,
    })
}

/// Parses a relaxed override payload such as `{'deprecated': true}`.
/// Malformed payloads are logged and yield no overrides.
pub fn parse_overrides(tag: &str, raw: &str) -> Map<String, Value> {
    let normalized = raw.replace('\\', "\\\\").replace('\'', "\"");
    match serde_json::from_str::<Map<String, Value>>(&normalized) {
        Ok(map) => map,
        Err(err) => {
            warn!("{}: unmarshal json is failed: {:?}: {}", tag, raw, err);
            Map::new()
        }
    }
}
