//! Build command implementation.

use anyhow::{Context, Result};
use folio_core::{Address, Config, Entry, MarkdownMarkup, SiteBuilder, SiteIndex, Skipped};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Serialize)]
struct BuildSummary<'a> {
    pages: Vec<EntrySummary<'a>>,
    posts: Vec<EntrySummary<'a>>,
    tags: &'a [Address],
    authors: &'a [Address],
    resources: &'a [PathBuf],
    skipped: &'a [Skipped],
}

#[derive(Serialize)]
struct EntrySummary<'a> {
    title: &'a str,
    layout: &'a str,
    slug: &'a str,
    date: Option<String>,
    uri: &'a str,
    source: &'a Path,
    has_preview: bool,
}

impl<'a> EntrySummary<'a> {
    fn new(entry: &'a Entry) -> Self {
        Self {
            title: entry.title(),
            layout: entry.metadata.layout.as_str(),
            slug: &entry.slug,
            date: entry.date.map(|d| d.to_string()),
            uri: &entry.address.uri,
            source: &entry.source_path,
            has_preview: entry.preview_html.is_some(),
        }
    }
}

impl<'a> BuildSummary<'a> {
    fn new(index: &'a SiteIndex) -> Self {
        Self {
            pages: index.pages.iter().map(EntrySummary::new).collect(),
            posts: index.posts.iter().map(EntrySummary::new).collect(),
            tags: &index.tags,
            authors: &index.authors,
            resources: &index.resources,
            skipped: &index.skipped,
        }
    }
}

/// Build the site described by the config file at `config_path`
pub fn build_site(config_path: &Path, json: bool) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    let mut builder = SiteBuilder::new(config);
    let index = builder
        .build([Arc::new(MarkdownMarkup::new()) as Arc<dyn folio_core::Markup>])
        .context("Failed to build site")?;

    if json {
        let payload = serde_json::to_string_pretty(&BuildSummary::new(&index))?;
        println!("{}", payload);
    } else {
        println!(
            "Build complete: {} pages, {} posts, {} tags, {} authors, {} resources, {} skipped",
            index.pages.len(),
            index.posts.len(),
            index.tags.len(),
            index.authors.len(),
            index.resources.len(),
            index.skipped.len()
        );
        for skipped in &index.skipped {
            println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    Ok(())
}
