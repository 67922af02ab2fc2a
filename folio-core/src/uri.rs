//! Canonical addresses for pages, posts and taxonomy entities.
//!
//! An [`Address`] pairs the public `uri` (percent-encoded) with the
//! `file_path` it is written to under `public/` (literal characters). Both
//! share the same prefix, segment boundaries and trailing-slash convention.

use crate::config::Config;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unreserved characters kept as-is: A-Z a-z 0-9 - . _ ~
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Address style for generated pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanUrls {
    /// `/tags-output/rust/`
    #[default]
    TrailingSlash,
    /// `/tags-output/rust`
    NoTrailingSlash,
    /// `/tags-output/rust.html`
    Dirty,
}

/// Which configured root URI an address lives under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Page,
    Post,
    Tag,
    Author,
}

impl RootKind {
    pub fn root_uri(self, config: &Config) -> &str {
        match self {
            RootKind::Page => &config.page_root_uri,
            RootKind::Post => &config.post_root_uri,
            RootKind::Tag => &config.tag_root_uri,
            RootKind::Author => &config.author_root_uri,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Address {
    /// Display name the address was built from
    pub name: String,
    /// Percent-encoded route
    pub uri: String,
    /// Same route with literal characters, relative to `public/`
    pub file_path: String,
}

impl Address {
    /// HTML file this address is written to on disk
    pub fn output_file(&self, config: &Config) -> PathBuf {
        let relative = self.file_path.trim_start_matches('/');
        let path = config.public_dir().join(relative);
        if self.file_path.ends_with('/') {
            path.join("index.html")
        } else if self.file_path.ends_with(".html") {
            path
        } else {
            let mut file = path.into_os_string();
            file.push(".html");
            PathBuf::from(file)
        }
    }
}

/// Percent-encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Address for a page-like source name such as `Joe Smith.html`.
///
/// A trailing `.html` is stripped before encoding.
///
/// ```
/// use folio_core::config::Config;
/// use folio_core::uri::{page_address, RootKind};
///
/// let config = Config::default();
/// let address = page_address("Joe Smith.html", RootKind::Author, &config);
/// assert_eq!(address.uri, "/blog/authors-output/Joe%20Smith/");
/// assert_eq!(address.file_path, "/blog/authors-output/Joe Smith/");
/// ```
pub fn page_address(page_name: &str, kind: RootKind, config: &Config) -> Address {
    let name = page_name.strip_suffix(".html").unwrap_or(page_name);
    address(name, kind, config)
}

/// Address of a tag listing
pub fn tag_address(config: &Config, tag: &str) -> Address {
    address(tag, RootKind::Tag, config)
}

/// Address of an author listing
pub fn author_address(config: &Config, author: &str) -> Address {
    address(author, RootKind::Author, config)
}

fn address(name: &str, kind: RootKind, config: &Config) -> Address {
    let root = root_path(config, kind);
    let suffix = match config.clean_urls {
        CleanUrls::TrailingSlash => "/",
        CleanUrls::NoTrailingSlash => "",
        CleanUrls::Dirty => ".html",
    };

    Address {
        name: name.to_string(),
        uri: format!("{root}/{}{suffix}", encode_segment(name)),
        file_path: format!("{root}/{name}{suffix}"),
    }
}

/// `<blog_prefix>/<root uri>` with no trailing slash
fn root_path(config: &Config, kind: RootKind) -> String {
    let mut path = String::new();
    let segments = config
        .blog_prefix
        .split('/')
        .chain(kind.root_uri(config).split('/'))
        .filter(|s| !s.is_empty());
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    path
}
