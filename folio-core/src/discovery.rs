//! Source document discovery under `content/`.
//!
//! Each root is searched in two places: the flat layout
//! `content/<root>` and the per-markup layout `content/<markup dir>/<root>`.
//! Both are walked independently and the results unioned.

use crate::config::{Config, ConfigError};
use crate::markup::{Markup, MarkupRegistry};
use crate::models::EntryKind;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A discovered document and the markup that recognized it
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Absolute path of the source file
    pub path: PathBuf,
    pub markup: Arc<dyn Markup>,
}

/// Page sources for `markup`
pub fn find_pages(config: &Config, markup: &dyn Markup) -> Result<Vec<PathBuf>, DiscoveryError> {
    find_entries(config, &config.page_root, markup)
}

/// Post sources for `markup`
pub fn find_posts(config: &Config, markup: &dyn Markup) -> Result<Vec<PathBuf>, DiscoveryError> {
    find_entries(config, &config.post_root, markup)
}

/// Absolute paths of every file under either layout of `root` whose name
/// ends with one of `markup`'s extensions.
///
/// Missing directories contribute nothing. Paths are unique; the flat
/// layout is listed first and each walk is sorted by file name.
pub fn find_entries(
    config: &Config,
    root: &str,
    markup: &dyn Markup,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let ignores = config.ignore_patterns()?;
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for dir in source_dirs(config, root, markup) {
        for file in walk_files(&dir, &ignores)? {
            let path = file.path;
            if markup.matches(&file.name) && seen.insert(path.clone()) {
                tracing::debug!("Discovered {:?} ({})", path, markup.dir());
                found.push(path);
            }
        }
    }

    Ok(found)
}

/// Source entries of `kind` for every registered markup.
///
/// A file claimed by more than one markup is attributed to the first one
/// registered.
pub fn discover(
    config: &Config,
    registry: &MarkupRegistry,
    kind: EntryKind,
) -> Result<Vec<SourceEntry>, DiscoveryError> {
    let root = kind.root(config);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for markup in registry.markups() {
        for path in find_entries(config, root, markup.as_ref())? {
            if seen.insert(path.clone()) {
                entries.push(SourceEntry {
                    path,
                    markup: Arc::clone(markup),
                });
            }
        }
    }

    tracing::info!("Found {} {} source(s)", entries.len(), kind.as_str());
    Ok(entries)
}

/// The flat and per-markup directories for `root`, in search order
pub(crate) fn source_dirs(config: &Config, root: &str, markup: &dyn Markup) -> [PathBuf; 2] {
    let content = config.content_dir();
    [content.join(root), content.join(markup.dir()).join(root)]
}

/// A file found below a content directory
pub(crate) struct ContentFile {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the walked directory
    pub relative: PathBuf,
    pub name: String,
}

/// Every non-ignored file below `dir`; empty if `dir` is missing
pub(crate) fn walk_files(dir: &Path, ignores: &[Regex]) -> Result<Vec<ContentFile>, DiscoveryError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let dir = dir.canonicalize()?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&dir).sort_by_file_name() {
        let entry = entry?;
        // Symlinks are not followed while walking, but a link to a file counts as that file
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_ignored(&name, ignores) {
            tracing::debug!("Ignoring {:?} due to ignored_files", entry.path());
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push(ContentFile {
            path: entry.into_path(),
            relative,
            name,
        });
    }
    Ok(files)
}

pub(crate) fn is_ignored(file_name: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tests::TestMarkup;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{:layout :post :title \"t\"}").unwrap();
    }

    #[test]
    fn test_empty_tree_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let markup = TestMarkup::arc("md", &[".md"]);

        assert!(find_pages(&config, markup.as_ref()).unwrap().is_empty());
        assert!(find_posts(&config, markup.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn test_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let markup = TestMarkup::arc("md", &[".md"]);
        touch(&dir.path().join("content/posts/2014-01-01-first.md"));

        let found = find_posts(&config, markup.as_ref()).unwrap();
        let expected = dir
            .path()
            .canonicalize()
            .unwrap()
            .join("content/posts/2014-01-01-first.md");
        assert_eq!(found, vec![expected]);
        assert!(find_pages(&config, markup.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn test_markup_subdirectory_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let markup = TestMarkup::arc("md", &[".md"]);
        touch(&dir.path().join("content/md/pages/about.md"));

        let found = find_pages(&config, markup.as_ref()).unwrap();
        let expected = dir
            .path()
            .canonicalize()
            .unwrap()
            .join("content/md/pages/about.md");
        assert_eq!(found, vec![expected]);
    }

    #[test]
    fn test_both_layouts_are_unioned() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let markup = TestMarkup::arc("md", &[".md"]);
        touch(&dir.path().join("content/pages/legacy.md"));
        touch(&dir.path().join("content/md/pages/nested/new.md"));

        let found = find_pages(&config, markup.as_ref()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["legacy.md", "new.md"]);
        assert!(found.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_non_matching_and_ignored_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let markup = TestMarkup::arc("md", &[".md"]);
        touch(&dir.path().join("content/posts/image.png"));
        touch(&dir.path().join("content/posts/.#draft.md"));
        touch(&dir.path().join("content/posts/post.md"));

        let found = find_posts(&config, markup.as_ref()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("post.md"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_document_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        let markup = TestMarkup::arc("md", &[".md"]);
        touch(&dir.path().join("drafts/real.md"));
        fs::create_dir_all(dir.path().join("content/posts")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("drafts/real.md"),
            dir.path().join("content/posts/post.md"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("drafts/missing.md"),
            dir.path().join("content/posts/dangling.md"),
        )
        .unwrap();

        let found = find_posts(&config, markup.as_ref()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("content/posts/post.md"));
    }

    #[test]
    fn test_discover_attributes_file_to_first_markup() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        touch(&dir.path().join("content/posts/post.md"));
        touch(&dir.path().join("content/posts/other.txt"));

        let mut registry = MarkupRegistry::new();
        registry.register(TestMarkup::arc("md", &[".md"]));
        registry.register(TestMarkup::arc("plain", &[".md", ".txt"]));

        let entries = discover(&config, &registry, EntryKind::Post).unwrap();
        let owners: Vec<_> = entries
            .iter()
            .map(|e| {
                (
                    e.path.file_name().unwrap().to_str().unwrap().to_string(),
                    e.markup.dir().to_string(),
                )
            })
            .collect();
        assert_eq!(
            owners,
            vec![
                ("post.md".to_string(), "md".to_string()),
                ("other.txt".to_string(), "plain".to_string()),
            ]
        );
    }
}
