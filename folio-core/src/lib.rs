//! # folio-core
//!
//! Content core for the folio static site generator.
//!
//! This crate discovers source documents under `content/`, reads their
//! metadata blocks, converts them through pluggable markups, extracts
//! previews, copies resources into `public/` and computes the addresses
//! pages and taxonomy listings are published under.

pub mod builder;
pub mod config;
pub mod discovery;
pub mod entry;
pub mod markup;
pub mod metadata;
pub mod models;
pub mod preview;
pub mod resources;
pub mod uri;

pub use builder::{BuildError, SiteBuilder};
pub use config::Config;
pub use discovery::{discover, find_pages, find_posts, SourceEntry};
pub use entry::parse_entry;
pub use markup::{MarkdownMarkup, Markup, MarkupRegistry, MarkupScope};
pub use metadata::{read_metadata, Metadata};
pub use models::{Entry, EntryKind, SiteIndex, Skipped};
pub use preview::{extract_preview, parse_html, preview_html};
pub use resources::copy_resources;
pub use uri::{author_address, page_address, tag_address, Address, CleanUrls, RootKind};
