//! Site building logic - orchestrates discovery, parsing and resource copying.

use crate::{
    config::{Config, ConfigError},
    discovery::{discover, DiscoveryError},
    entry::{parse_entry, EntryError},
    markup::{Markup, MarkupRegistry, RegistryError},
    models::*,
    resources::{copy_resources, CopyError},
    uri::{author_address, tag_address, Address},
};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    #[error("Resource copy error: {0}")]
    Copy(#[from] CopyError),
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    registry: MarkupRegistry,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: MarkupRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the site with `markups` active for the duration of the run.
    ///
    /// Documents that fail to parse are logged and listed in
    /// [`SiteIndex::skipped`]; the run continues without them.
    pub fn build<I>(&mut self, markups: I) -> Result<SiteIndex, BuildError>
    where
        I: IntoIterator<Item = Arc<dyn Markup>>,
    {
        // Fail before touching the filesystem
        self.config.ignore_patterns()?;

        let config = &self.config;
        let scope = self.registry.scope(markups);

        let mut index = SiteIndex::default();
        for kind in [EntryKind::Page, EntryKind::Post] {
            for source in discover(config, &scope, kind)? {
                match parse_entry(config, &source, kind) {
                    Ok(entry) if entry.is_draft() => {
                        tracing::debug!("Skipping draft {:?}", source.path);
                    }
                    Ok(entry) => match kind {
                        EntryKind::Page => index.pages.push(entry),
                        EntryKind::Post => index.posts.push(entry),
                    },
                    Err(e) => {
                        if matches!(e, EntryError::Metadata(_)) {
                            tracing::warn!("Skipping {:?}: {}", source.path, e);
                        } else {
                            tracing::error!("Failed to parse {:?}: {}", source.path, e);
                        }
                        index.skipped.push(Skipped {
                            path: source.path,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        index.posts.sort_by(|a, b| {
            Reverse(a.date)
                .cmp(&Reverse(b.date))
                .then_with(|| a.slug.cmp(&b.slug))
        });
        index.pages.sort_by(|a, b| {
            page_order(a)
                .cmp(&page_order(b))
                .then_with(|| a.slug.cmp(&b.slug))
        });

        index.tags = collect_tags(config, &index.posts);
        index.authors = collect_authors(config, index.pages.iter().chain(&index.posts));
        index.resources = copy_resources(config, &scope)?.copied;

        tracing::info!(
            "Built site index with {} pages, {} posts ({} skipped)",
            index.pages.len(),
            index.posts.len(),
            index.skipped.len()
        );
        Ok(index)
    }
}

/// Pages with an index sort before pages without one
fn page_order(entry: &Entry) -> (bool, i64) {
    match entry.metadata.page_index {
        Some(i) => (false, i),
        None => (true, 0),
    }
}

fn collect_tags(config: &Config, posts: &[Entry]) -> Vec<Address> {
    let mut tags = BTreeMap::new();
    for tag in posts.iter().flat_map(|p| &p.metadata.tags) {
        tags.entry(tag.as_str())
            .or_insert_with(|| tag_address(config, tag));
    }
    tags.into_values().collect()
}

fn collect_authors<'a>(config: &Config, entries: impl Iterator<Item = &'a Entry>) -> Vec<Address> {
    let mut authors = BTreeMap::new();
    for author in entries.filter_map(|e| e.metadata.author.as_deref()) {
        authors
            .entry(author)
            .or_insert_with(|| author_address(config, author));
    }
    authors.into_values().collect()
}
