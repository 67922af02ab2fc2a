//! Content model structs for pages, posts and the site index.

use crate::config::Config;
use crate::metadata::Metadata;
use crate::uri::{Address, RootKind};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// Which content root a document was discovered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Page,
    Post,
}

impl EntryKind {
    /// Source root below `content/`
    pub fn root(self, config: &Config) -> &str {
        match self {
            EntryKind::Page => &config.page_root,
            EntryKind::Post => &config.post_root,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Page => "page",
            EntryKind::Post => "post",
        }
    }

    pub fn root_kind(self) -> RootKind {
        match self {
            EntryKind::Page => RootKind::Page,
            EntryKind::Post => RootKind::Post,
        }
    }
}

/// A parsed page or post
#[derive(Debug, Clone)]
pub struct Entry {
    pub kind: EntryKind,

    /// Validated metadata block
    pub metadata: Metadata,

    /// File name without the markup extension (and without a date prefix for posts)
    pub slug: String,

    /// Publication date; always set for posts
    pub date: Option<NaiveDate>,

    pub address: Address,

    /// Rendered HTML body
    pub content_html: String,

    /// Rendered body truncated at the more marker
    pub preview_html: Option<String>,

    /// Absolute source path
    pub source_path: PathBuf,

    /// Directory name of the markup that converted this entry
    pub markup: String,
}

impl Entry {
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn is_draft(&self) -> bool {
        self.metadata.draft
    }

    /// Preview when the entry has a marker, full content otherwise
    pub fn preview_or_content(&self) -> &str {
        self.preview_html.as_deref().unwrap_or(&self.content_html)
    }
}

/// A document the build could not turn into an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a build produced
#[derive(Debug, Clone, Default)]
pub struct SiteIndex {
    /// Ordered by `:page-index`, then slug
    pub pages: Vec<Entry>,

    /// Newest first
    pub posts: Vec<Entry>,

    /// Unique tag listings, sorted by name
    pub tags: Vec<Address>,

    /// Unique author listings, sorted by name
    pub authors: Vec<Address>,

    /// Resource files copied into the publish tree
    pub resources: Vec<PathBuf>,

    pub skipped: Vec<Skipped>,
}

impl SiteIndex {
    /// Find a page or post by slug
    pub fn find_by_slug(&self, slug: &str) -> Option<&Entry> {
        self.pages
            .iter()
            .chain(self.posts.iter())
            .find(|e| e.slug == slug)
    }

    /// Posts carrying `tag`, newest first
    pub fn posts_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.posts
            .iter()
            .filter(move |p| p.metadata.tags.iter().any(|t| t == tag))
    }
}
