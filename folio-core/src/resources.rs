//! Copy non-document files from the content tree into the publish tree.
//!
//! For each content root and each registered markup, every file under the
//! flat layout `content/<root>` and the markup layout
//! `content/<dir>/<root>` that no registered markup recognizes is copied to
//! `public/<blog_prefix>/<root>/`, keeping its relative path. Directories are
//! only created for files actually copied.

use crate::config::Config;
use crate::discovery::{source_dirs, walk_files, DiscoveryError};
use crate::markup::MarkupRegistry;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopyError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination paths written by [`copy_resources`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
}

/// Copy every resource under the page and post roots into the publish tree
pub fn copy_resources(
    config: &Config,
    registry: &MarkupRegistry,
) -> Result<CopyReport, CopyError> {
    let ignores = config.ignore_patterns().map_err(DiscoveryError::from)?;
    let output_dir = config.blog_output_dir();
    let mut seen = HashSet::new();
    let mut report = CopyReport::default();

    for root in [&config.page_root, &config.post_root] {
        let dest_root = output_dir.join(root);

        for markup in registry.markups() {
            for dir in source_dirs(config, root, markup.as_ref()) {
                for file in walk_files(&dir, &ignores)? {
                    if registry.markups().iter().any(|m| m.matches(&file.name)) {
                        continue;
                    }
                    if !seen.insert(file.path.clone()) {
                        continue;
                    }

                    let target = dest_root.join(&file.relative);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent).map_err(|source| CopyError::CreateDir {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                    }
                    fs::copy(&file.path, &target).map_err(|source| CopyError::Copy {
                        from: file.path.clone(),
                        to: target.clone(),
                        source,
                    })?;
                    tracing::debug!("Copied {:?} to {:?}", file.path, target);
                    report.copied.push(target);
                }
            }
        }
    }

    tracing::info!("Copied {} resource(s)", report.copied.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tests::TestMarkup;
    use std::path::Path;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn registry(markups: &[(&'static str, &'static str)]) -> MarkupRegistry {
        let mut registry = MarkupRegistry::new();
        for (dir, ext) in markups {
            registry.register(TestMarkup::arc(dir, &[ext]));
        }
        registry
    }

    #[test]
    fn test_no_markups_and_no_content_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());

        let report = copy_resources(&config, &MarkupRegistry::new()).unwrap();
        assert!(report.copied.is_empty());
        assert!(!config.public_dir().exists());
    }

    #[test]
    fn test_documents_only_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        write(&dir.path().join("content/posts/post.md"), "doc");
        write(&dir.path().join("content/md/pages/page.md"), "doc");

        let report = copy_resources(&config, &registry(&[("md", ".md")])).unwrap();
        assert!(report.copied.is_empty());
        assert!(!config.blog_output_dir().join("posts").exists());
        assert!(!config.blog_output_dir().join("pages").exists());
    }

    #[test]
    fn test_flat_layout_resources_are_copied() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        write(&dir.path().join("content/posts/post.md"), "doc");
        write(&dir.path().join("content/posts/img/diagram.png"), "png");

        copy_resources(&config, &registry(&[("md", ".md")])).unwrap();

        let out = config.blog_output_dir();
        assert_eq!(
            fs::read_to_string(out.join("posts/img/diagram.png")).unwrap(),
            "png"
        );
        assert!(!out.join("posts/post.md").exists());
        assert!(!out.join("pages").exists());
    }

    #[test]
    fn test_markup_layout_resources_are_copied() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        write(&dir.path().join("content/asc/pages/about.asc"), "doc");
        write(&dir.path().join("content/asc/pages/files/cv.pdf"), "pdf");

        let report = copy_resources(&config, &registry(&[("asc", ".asc")])).unwrap();

        let out = config.blog_output_dir();
        assert_eq!(report.copied, vec![out.join("pages/files/cv.pdf")]);
        assert!(out.join("pages").is_dir());
        assert!(!out.join("posts").exists());
    }

    #[test]
    fn test_other_markup_documents_are_not_resources() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        write(&dir.path().join("content/pages/a.md"), "doc");
        write(&dir.path().join("content/pages/b.asc"), "doc");
        write(&dir.path().join("content/pages/c.txt"), "text");

        let report =
            copy_resources(&config, &registry(&[("md", ".md"), ("asc", ".asc")])).unwrap();

        assert_eq!(
            report.copied,
            vec![config.blog_output_dir().join("pages/c.txt")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_resource_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        write(&dir.path().join("assets/logo.svg"), "svg");
        fs::create_dir_all(dir.path().join("content/pages")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("assets/logo.svg"),
            dir.path().join("content/pages/logo.svg"),
        )
        .unwrap();

        let report = copy_resources(&config, &registry(&[("md", ".md")])).unwrap();

        let target = config.blog_output_dir().join("pages/logo.svg");
        assert_eq!(report.copied, vec![target.clone()]);
        assert_eq!(fs::read_to_string(target).unwrap(), "svg");
    }

    #[test]
    fn test_ignored_files_are_not_copied() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_base_dir(dir.path());
        write(&dir.path().join("content/posts/.notes.swp"), "swap");

        let report = copy_resources(&config, &registry(&[("md", ".md")])).unwrap();
        assert!(report.copied.is_empty());
        assert!(!config.blog_output_dir().join("posts").exists());
    }
}
