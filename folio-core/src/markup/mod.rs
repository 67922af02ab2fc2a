//! Pluggable markup formats and the registry of active ones.
//!
//! A [`Markup`] describes one source format: the subdirectory convention it
//! owns under `content/`, the file suffixes it recognizes and how it turns
//! source text into HTML. A [`MarkupRegistry`] holds the capabilities active
//! for a single build; [`MarkupRegistry::scope`] ties their lifetime to a
//! guard so nothing leaks from one run into the next.

pub mod global;
mod markdown;

pub use markdown::MarkdownMarkup;

use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("A markup scope is already active")]
    ScopeActive,
}

/// One supported document source format.
pub trait Markup: Send + Sync {
    /// Subdirectory under `content/` reserved for this format (e.g. `md`)
    fn dir(&self) -> &str;

    /// File suffixes recognized by this format, including the dot (e.g. `.md`)
    fn extensions(&self) -> &[&str];

    /// Convert source text to an HTML body
    fn convert(&self, source: &str) -> String;

    /// Whether `file_name` ends with one of this format's extensions
    fn matches(&self, file_name: &str) -> bool {
        self.extensions().iter().any(|ext| file_name.ends_with(ext))
    }

    /// Strip the matching extension from `file_name`, if any
    fn strip_extension<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.extensions()
            .iter()
            .find_map(|ext| file_name.strip_suffix(ext))
    }
}

impl fmt::Debug for dyn Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Markup")
            .field("dir", &self.dir())
            .field("extensions", &self.extensions())
            .finish()
    }
}

/// Ordered collection of the markups active for one build.
///
/// Registration order is the precedence rule when two markups claim the
/// same extension: the first one registered wins.
#[derive(Debug, Default)]
pub struct MarkupRegistry {
    markups: Vec<Arc<dyn Markup>>,
}

impl MarkupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a markup to the active set
    pub fn register(&mut self, markup: Arc<dyn Markup>) {
        for existing in &self.markups {
            if let Some(ext) = markup
                .extensions()
                .iter()
                .find(|ext| existing.extensions().contains(ext))
            {
                tracing::warn!(
                    "Markup '{}' claims extension {} already handled by '{}'; '{}' takes precedence",
                    markup.dir(),
                    ext,
                    existing.dir(),
                    existing.dir()
                );
            }
        }
        tracing::debug!("Registered markup '{}'", markup.dir());
        self.markups.push(markup);
    }

    /// Currently active markups, in registration order
    pub fn markups(&self) -> &[Arc<dyn Markup>] {
        &self.markups
    }

    pub fn is_empty(&self) -> bool {
        self.markups.is_empty()
    }

    /// Remove every registered markup
    pub fn clear(&mut self) {
        self.markups.clear();
    }

    /// First registered markup that recognizes the file name of `path`
    pub fn markup_for(&self, path: &Path) -> Option<&Arc<dyn Markup>> {
        let file_name = path.file_name()?.to_str()?;
        self.markups.iter().find(|m| m.matches(file_name))
    }

    /// Register `markups` for the lifetime of the returned guard.
    ///
    /// The registry is cleared when the guard drops, including while
    /// unwinding from a panic inside the scope.
    pub fn scope<I>(&mut self, markups: I) -> MarkupScope<'_>
    where
        I: IntoIterator<Item = Arc<dyn Markup>>,
    {
        for markup in markups {
            self.register(markup);
        }
        MarkupScope { registry: self }
    }
}

/// Guard returned by [`MarkupRegistry::scope`]; clears the registry on drop.
#[derive(Debug)]
pub struct MarkupScope<'a> {
    registry: &'a mut MarkupRegistry,
}

impl Deref for MarkupScope<'_> {
    type Target = MarkupRegistry;

    fn deref(&self) -> &MarkupRegistry {
        self.registry
    }
}

impl Drop for MarkupScope<'_> {
    fn drop(&mut self) {
        tracing::debug!("Clearing {} markup(s)", self.registry.markups.len());
        self.registry.clear();
    }
}
