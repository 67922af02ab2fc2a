//! Metadata block parsing and schema validation.
//!
//! Every document starts with a single map of keyword keys:
//!
//! ```text
//! {:title  "Hello"
//!  :layout :post
//!  :tags   ["rust" "blogging"]}
//! ```
//!
//! `:layout` must be a keyword. A value of the wrong shape for any recognized
//! key rejects the whole block; no partially populated record is ever built.

pub mod edn;

pub use edn::{SyntaxError, Value};

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read document: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid metadata block: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Metadata block must be a map, found {0}")]
    NotAMap(&'static str),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Metadata keys must be keywords, found {0}")]
    InvalidKey(String),

    #[error("Invalid value for :{key}: expected {expected}, found {found}")]
    InvalidField {
        key: String,
        expected: &'static str,
        found: String,
    },
}

/// Keys validated by [`Metadata::from_value`]; everything else lands in `extra`
const RECOGNIZED_KEYS: &[&str] = &[
    "layout",
    "title",
    "tags",
    "author",
    "date",
    "description",
    "toc",
    "draft?",
    "page-index",
    "navbar?",
    "home?",
];

/// Symbolic layout name (the keyword without its colon)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout(String);

impl Layout {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// Table-of-contents request: `true`/`false` or a keyword such as `:ul`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toc {
    Enabled(bool),
    Style(String),
}

/// Validated metadata for one document
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub layout: Layout,
    pub title: String,

    /// Unique, in source order
    pub tags: Vec<String>,

    pub author: Option<String>,

    /// Raw date text, parsed with the configured post date format
    pub date: Option<String>,

    pub description: Option<String>,
    pub toc: Option<Toc>,
    pub draft: bool,
    pub page_index: Option<i64>,
    pub navbar: bool,
    pub home: bool,

    /// Unrecognized keys, verbatim
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Validate a parsed value against the metadata schema
    pub fn from_value(value: Value) -> Result<Self, MetadataError> {
        let entries = match value {
            Value::Map(entries) => entries,
            other => return Err(MetadataError::NotAMap(other.kind())),
        };

        let mut layout = None;
        let mut title = None;
        let mut meta = PartialMetadata::default();

        for (key, value) in entries {
            let key = match key {
                Value::Keyword(key) => key,
                other => return Err(MetadataError::InvalidKey(other.to_string())),
            };
            // nil means absent for recognized keys; unknown keys keep it verbatim
            if value == Value::Nil && RECOGNIZED_KEYS.contains(&key.as_str()) {
                continue;
            }

            match key.as_str() {
                "layout" => match value {
                    Value::Keyword(name) => layout = Some(Layout(name)),
                    other => return Err(invalid(&key, "keyword", &other)),
                },
                "title" => title = Some(expect_string(&key, value)?),
                "tags" => meta.tags = expect_strings(&key, value)?,
                "author" => meta.author = Some(expect_string(&key, value)?),
                "date" => meta.date = Some(expect_string(&key, value)?),
                "description" => meta.description = Some(expect_string(&key, value)?),
                "toc" => {
                    meta.toc = Some(match value {
                        Value::Bool(b) => Toc::Enabled(b),
                        Value::Keyword(style) => Toc::Style(style),
                        other => return Err(invalid(&key, "boolean or keyword", &other)),
                    })
                }
                "draft?" => meta.draft = expect_bool(&key, value)?,
                "page-index" => match value {
                    Value::Int(i) => meta.page_index = Some(i),
                    other => return Err(invalid(&key, "integer", &other)),
                },
                "navbar?" => meta.navbar = expect_bool(&key, value)?,
                "home?" => meta.home = expect_bool(&key, value)?,
                _ => {
                    meta.extra.insert(key, value);
                }
            }
        }

        Ok(Metadata {
            layout: layout.ok_or(MetadataError::MissingField("layout"))?,
            title: title.ok_or(MetadataError::MissingField("title"))?,
            tags: meta.tags,
            author: meta.author,
            date: meta.date,
            description: meta.description,
            toc: meta.toc,
            draft: meta.draft,
            page_index: meta.page_index,
            navbar: meta.navbar,
            home: meta.home,
            extra: meta.extra,
        })
    }
}

#[derive(Default)]
struct PartialMetadata {
    tags: Vec<String>,
    author: Option<String>,
    date: Option<String>,
    description: Option<String>,
    toc: Option<Toc>,
    draft: bool,
    page_index: Option<i64>,
    navbar: bool,
    home: bool,
    extra: BTreeMap<String, Value>,
}

/// Read the metadata block at the head of `source`.
///
/// Returns the validated metadata and the remaining document body.
///
/// # Example
///
/// ```
/// use folio_core::metadata::read_metadata;
///
/// let source = "{:title \"My Post\" :layout :post :tags [\"rust\"]}\n# Hello\n";
/// let (meta, body) = read_metadata(source).unwrap();
/// assert_eq!(meta.title, "My Post");
/// assert_eq!(meta.layout.as_str(), "post");
/// assert_eq!(meta.tags, vec!["rust"]);
/// assert_eq!(body.trim(), "# Hello");
/// ```
pub fn read_metadata(source: &str) -> Result<(Metadata, &str), MetadataError> {
    let (value, end) = edn::read_form(source)?;
    let metadata = Metadata::from_value(value)?;
    Ok((metadata, &source[end..]))
}

/// Read the metadata block from a character stream, returning the owned body
pub fn read_metadata_from<R: Read>(mut reader: R) -> Result<(Metadata, String), MetadataError> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    let (metadata, body) = read_metadata(&source)?;
    Ok((metadata, body.to_string()))
}

fn invalid(key: &str, expected: &'static str, found: &Value) -> MetadataError {
    MetadataError::InvalidField {
        key: key.to_string(),
        expected,
        found: format!("{} {}", found.kind(), found),
    }
}

fn expect_string(key: &str, value: Value) -> Result<String, MetadataError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(invalid(key, "string", &other)),
    }
}

fn expect_bool(key: &str, value: Value) -> Result<bool, MetadataError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(invalid(key, "boolean", &other)),
    }
}

fn expect_strings(key: &str, value: Value) -> Result<Vec<String>, MetadataError> {
    let items = match value {
        Value::Vector(items) | Value::List(items) | Value::Set(items) => items,
        other => return Err(invalid(key, "collection of strings", &other)),
    };

    let mut strings: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let s = expect_string(key, item)?;
        if !strings.contains(&s) {
            strings.push(s);
        }
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_metadata() {
        let content = r#"{:title "Test Post"
 :layout :post
 :description "A test post"
 :date "2025-01-01"
 :author "Joe Smith"
 :toc true}

# Hello World

This is the content."#;

        let (meta, body) = read_metadata(content).unwrap();
        assert_eq!(meta.title, "Test Post");
        assert_eq!(meta.layout.as_str(), "post");
        assert_eq!(meta.description.as_deref(), Some("A test post"));
        assert_eq!(meta.date.as_deref(), Some("2025-01-01"));
        assert_eq!(meta.author.as_deref(), Some("Joe Smith"));
        assert_eq!(meta.toc, Some(Toc::Enabled(true)));
        assert!(body.contains("# Hello World"));
        assert!(body.contains("This is the content."));
    }

    #[test]
    fn test_quoted_layout_is_rejected() {
        let result = read_metadata(r#"{:title "Post" :layout "post"}"#);
        match result {
            Err(MetadataError::InvalidField {
                key,
                expected,
                found,
            }) => {
                assert_eq!(key, "layout");
                assert_eq!(expected, "keyword");
                assert_eq!(found, r#"string "post""#);
            }
            other => panic!("Expected InvalidField error, got {other:?}"),
        }
    }

    #[test]
    fn test_keeps_every_supplied_key() {
        let (meta, _) = read_metadata(
            r#"{:title "Page" :layout :page :page-index 2 :navbar? true :home? false
               :klipse {:selector ".clj"} :draft? false}"#,
        )
        .unwrap();

        assert_eq!(meta.page_index, Some(2));
        assert!(meta.navbar);
        assert!(!meta.home);
        assert!(!meta.draft);
        assert_eq!(
            meta.extra.get("klipse"),
            Some(&Value::Map(vec![(
                Value::Keyword("selector".into()),
                Value::Str(".clj".into())
            )]))
        );
    }

    #[test]
    fn test_tags_accept_any_collection_and_dedupe() {
        let (meta, _) =
            read_metadata(r#"{:title "T" :layout :post :tags #{"b"} }"#).unwrap();
        assert_eq!(meta.tags, vec!["b"]);

        let (meta, _) =
            read_metadata(r#"{:title "T" :layout :post :tags ["a" "b" "a"]}"#).unwrap();
        assert_eq!(meta.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_wrong_tag_shape_rejected() {
        let result = read_metadata(r#"{:title "T" :layout :post :tags [:rust]}"#);
        assert!(matches!(result, Err(MetadataError::InvalidField { .. })));

        let result = read_metadata(r#"{:title "T" :layout :post :tags "rust"}"#);
        assert!(matches!(result, Err(MetadataError::InvalidField { .. })));
    }

    #[test]
    fn test_missing_required_fields() {
        match read_metadata(r#"{:title "No layout"}"#) {
            Err(MetadataError::MissingField(field)) => assert_eq!(field, "layout"),
            other => panic!("Expected MissingField error, got {other:?}"),
        }
        match read_metadata(r#"{:layout :post}"#) {
            Err(MetadataError::MissingField(field)) => assert_eq!(field, "title"),
            other => panic!("Expected MissingField error, got {other:?}"),
        }
    }

    #[test]
    fn test_nil_optional_is_absent() {
        let (meta, _) = read_metadata(r#"{:title "T" :layout :post :author nil}"#).unwrap();
        assert_eq!(meta.author, None);
    }

    #[test]
    fn test_nil_unknown_key_is_kept() {
        let (meta, _) =
            read_metadata(r#"{:title "T" :layout :post :canonical nil :tags nil}"#).unwrap();
        assert_eq!(meta.extra.get("canonical"), Some(&Value::Nil));
        assert!(meta.tags.is_empty());
        assert!(!meta.extra.contains_key("tags"));
    }

    #[test]
    fn test_deeply_nested_block_is_a_syntax_error() {
        let source = format!("{{:title \"T\" :layout :post :x {}", "[".repeat(100_000));
        assert!(matches!(
            read_metadata(&source),
            Err(MetadataError::Syntax(_))
        ));
    }

    #[test]
    fn test_non_map_and_non_keyword_keys() {
        assert!(matches!(
            read_metadata("[:layout :post]"),
            Err(MetadataError::NotAMap("vector"))
        ));
        assert!(matches!(
            read_metadata(r#"{"title" "T" :layout :post}"#),
            Err(MetadataError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_invalid_syntax() {
        assert!(matches!(
            read_metadata("{:title \"unclosed"),
            Err(MetadataError::Syntax(_))
        ));
        assert!(matches!(read_metadata(""), Err(MetadataError::Syntax(_))));
    }

    #[test]
    fn test_read_from_stream() {
        let source = "{:title \"Streamed\" :layout :post}\nBody text";
        let (meta, body) = read_metadata_from(source.as_bytes()).unwrap();
        assert_eq!(meta.title, "Streamed");
        assert_eq!(body, "\nBody text");
    }
}
