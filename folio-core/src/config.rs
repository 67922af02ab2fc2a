//! Configuration parsing and management.

use crate::uri::CleanUrls;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid ignored_files pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Site configuration matching the folio.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `content/` and `public/`
    pub base_dir: PathBuf,

    pub page_root: String,
    pub post_root: String,

    /// Prefix prepended to every generated address and output path
    pub blog_prefix: String,

    pub page_root_uri: String,
    pub post_root_uri: String,
    pub tag_root_uri: String,
    pub author_root_uri: String,

    pub clean_urls: CleanUrls,

    /// chrono format string used for `:date` metadata
    pub post_date_format: String,

    /// Regexes matched against file names; matches are never discovered or copied
    pub ignored_files: Vec<String>,

    pub previews: bool,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            page_root: "pages".into(),
            post_root: "posts".into(),
            blog_prefix: "/blog".into(),
            page_root_uri: "pages-output".into(),
            post_root_uri: "posts-output".into(),
            tag_root_uri: "tags-output".into(),
            author_root_uri: "authors-output".into(),
            clean_urls: CleanUrls::TrailingSlash,
            post_date_format: "%Y-%m-%d".into(),
            ignored_files: vec![r"\.#.*".into(), r".*\.swp$".into()],
            previews: true,
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text, validating patterns
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(contents)?;
        config.blog_prefix = normalize_blog_prefix(&config.blog_prefix);
        config.ignore_patterns()?;
        Ok(config)
    }

    /// Configuration rooted at `base_dir`, everything else defaulted
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Working directory, resolved relative to the config file
    pub fn base_dir(&self) -> PathBuf {
        self.resolve_path(&self.base_dir)
    }

    /// `<base>/content`
    pub fn content_dir(&self) -> PathBuf {
        self.base_dir().join("content")
    }

    /// `<base>/public`
    pub fn public_dir(&self) -> PathBuf {
        self.base_dir().join("public")
    }

    /// `<base>/public/<blog_prefix>`
    pub fn blog_output_dir(&self) -> PathBuf {
        let prefix = self.blog_prefix.trim_matches('/');
        if prefix.is_empty() {
            self.public_dir()
        } else {
            self.public_dir().join(prefix)
        }
    }

    /// Compile `ignored_files` into regexes
    pub fn ignore_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.ignored_files
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Ensure the blog prefix has a leading slash and no trailing slash.
///
/// An empty (or all-slash) prefix means "no prefix" and stays empty.
pub fn normalize_blog_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    let mut s = format!("/{trimmed}");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    s
}
