//! # Attribute Operations
//!
//! Internal logic for reading `#[serde(...)]` and `#[tag = "..."]` attributes
//! and turning them into the raw tag string carried by graph fields.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use ra_ap_syntax::ast::{self};
use ra_ap_syntax::{AstNode, SyntaxNode};
use regex::Regex;
use std::sync::OnceLock;

/// Attribute carrying a raw tag string verbatim.
pub const TAG_ATTRIBUTE: &str = "tag";

/// Tag key synthesised from serde attributes.
pub const SERDE_NAME_TAG: &str = "json";

/// Serde `rename_all` conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// `lowercase`
    Lower,
    /// `UPPERCASE`
    Upper,
    /// `PascalCase`
    Pascal,
    /// `camelCase`
    Camel,
    /// `snake_case`
    Snake,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnake,
    /// `kebab-case`
    Kebab,
    /// `SCREAMING-KEBAB-CASE`
    ScreamingKebab,
}

impl RenameRule {
    /// Parses the serde spelling of a rule.
    pub fn parse(rule: &str) -> Option<Self> {
        let rule = match rule {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            _ => return None,
        };
        Some(rule)
    }

    /// Applies the rule to a field identifier.
    pub fn apply(self, name: &str) -> String {
        match self {
            RenameRule::Lower => name.to_lowercase(),
            RenameRule::Upper => name.to_uppercase(),
            RenameRule::Pascal => name.to_upper_camel_case(),
            RenameRule::Camel => name.to_lower_camel_case(),
            RenameRule::Snake => name.to_snake_case(),
            RenameRule::ScreamingSnake => name.to_shouty_snake_case(),
            RenameRule::Kebab => name.to_kebab_case(),
            RenameRule::ScreamingKebab => name.to_shouty_kebab_case(),
        }
    }
}

/// Attributes extracted from a single node.
#[derive(Default, Debug)]
pub struct AttrInfo {
    /// The rename value if present.
    pub rename: Option<String>,
    /// The container-level rename rule if present.
    pub rename_all: Option<RenameRule>,
    /// Whether a skip flag was found.
    pub is_skipped: bool,
    /// Whether the field may be absent (`default` / `skip_serializing_if`).
    pub is_omittable: bool,
    /// Raw `#[tag = "..."]` content if present.
    pub raw_tag: Option<String>,
}

impl AttrInfo {
    /// Builds the raw tag of a field named `field`. An explicit `#[tag]`
    /// wins; serde attributes only contribute a `json` entry when the raw
    /// tag does not carry one.
    pub fn field_tag(&self, field: &str, rename_all: Option<RenameRule>) -> String {
        let raw = self.raw_tag.clone().unwrap_or_default();
        if has_tag_key(&raw, SERDE_NAME_TAG) {
            return raw;
        }

        let name = if self.is_skipped {
            Some("-".to_string())
        } else {
            self.rename
                .clone()
                .or_else(|| rename_all.map(|rule| rule.apply(field)))
        };
        if name.is_none() && !self.is_omittable {
            return raw;
        }

        let mut value = name.unwrap_or_default();
        if self.is_omittable && !self.is_skipped {
            value.push_str(",omitempty");
        }
        let synthesized = format!("{}:\"{}\"", SERDE_NAME_TAG, escape(&value));
        if raw.trim().is_empty() {
            synthesized
        } else {
            format!("{} {}", raw.trim_end(), synthesized)
        }
    }
}

fn has_tag_key(raw: &str, key: &str) -> bool {
    crate::directives::TagSet::parse(raw).contains(key)
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Analyzes attributes on a node to find `serde` or `tag` configurations.
pub fn extract_attributes(node: &SyntaxNode) -> AttrInfo {
    let mut info = AttrInfo::default();

    for attr in node.children().filter_map(ast::Attr::cast) {
        let Some(meta) = attr.meta() else {
            continue;
        };
        let Some(path) = meta.path() else {
            continue;
        };

        match path.to_string().as_str() {
            "serde" => {
                if let Some(tt) = meta.token_tree() {
                    parse_serde_content(&tt.to_string(), &mut info);
                }
            }
            TAG_ATTRIBUTE => {
                if let Some(expr) = meta.expr() {
                    info.raw_tag = unquote_literal(&expr.syntax().text().to_string());
                }
            }
            _ => {}
        }
    }

    info
}

/// Parses the inner content of a serde attribute.
fn parse_serde_content(content: &str, info: &mut AttrInfo) {
    static RENAME_RE: OnceLock<Regex> = OnceLock::new();
    let rename_re =
        RENAME_RE.get_or_init(|| Regex::new(r#"\brename\s*=\s*"([^"]+)""#).expect("Invalid regex"));

    static RENAME_ALL_RE: OnceLock<Regex> = OnceLock::new();
    let rename_all_re = RENAME_ALL_RE
        .get_or_init(|| Regex::new(r#"\brename_all\s*=\s*"([^"]+)""#).expect("Invalid regex"));

    static SKIP_RE: OnceLock<Regex> = OnceLock::new();
    let skip_re =
        SKIP_RE.get_or_init(|| Regex::new(r#"\b(skip|skip_serializing)\b"#).expect("Invalid regex"));

    static OMIT_RE: OnceLock<Regex> = OnceLock::new();
    let omit_re = OMIT_RE
        .get_or_init(|| Regex::new(r#"\b(default|skip_serializing_if)\b"#).expect("Invalid regex"));

    if let Some(caps) = rename_re.captures(content) {
        if let Some(val) = caps.get(1) {
            info.rename = Some(val.as_str().to_string());
        }
    }

    if let Some(caps) = rename_all_re.captures(content) {
        if let Some(val) = caps.get(1) {
            info.rename_all = RenameRule::parse(val.as_str());
        }
    }

    // Flags are bare words; quoted values such as paths to predicates are not.
    static QUOTED_RE: OnceLock<Regex> = OnceLock::new();
    let quoted_re =
        QUOTED_RE.get_or_init(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("Invalid regex"));
    let flags = quoted_re.replace_all(content, "\"\"");

    if skip_re.is_match(&flags) {
        info.is_skipped = true;
    }

    if omit_re.is_match(&flags) {
        info.is_omittable = true;
    }
}

/// Returns the content of a string literal, plain or raw.
pub(crate) fn unquote_literal(text: &str) -> Option<String> {
    let text = text.trim();
    if let Some(raw) = text.strip_prefix('r') {
        let hashes = raw.len() - raw.trim_start_matches('#').len();
        let inner = raw.get(hashes..raw.len().checked_sub(hashes)?)?;
        return inner
            .strip_prefix('"')?
            .strip_suffix('"')
            .map(str::to_string);
    }

    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        });
    }
    Some(out)
}
