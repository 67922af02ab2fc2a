//! Turn a discovered source file into a page or post [`Entry`].

use crate::config::Config;
use crate::discovery::SourceEntry;
use crate::metadata::{read_metadata, MetadataError};
use crate::models::{Entry, EntryKind};
use crate::preview::preview_html;
use crate::uri::page_address;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Format of the date prefix on post file names (`2014-03-02-title.md`)
const FILE_DATE_FORMAT: &str = "%Y-%m-%d";
const FILE_DATE_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Date {date:?} does not match format {format:?}")]
    InvalidDate { date: String, format: String },

    #[error("Post {0:?} has no :date and no date prefix in its file name")]
    MissingDate(PathBuf),
}

/// Read, convert and address one source document
pub fn parse_entry(
    config: &Config,
    source: &SourceEntry,
    kind: EntryKind,
) -> Result<Entry, EntryError> {
    let text = fs::read_to_string(&source.path).map_err(|e| EntryError::Read {
        path: source.path.clone(),
        source: e,
    })?;
    let (metadata, body) = read_metadata(&text)?;

    let file_name = source
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = source.markup.strip_extension(file_name).unwrap_or(file_name);
    let file_date = split_date_prefix(stem);

    let date = match &metadata.date {
        Some(raw) => Some(parse_date(raw, &config.post_date_format)?),
        None => file_date.map(|(date, _)| date),
    };
    if kind == EntryKind::Post && date.is_none() {
        return Err(EntryError::MissingDate(source.path.clone()));
    }

    let slug = match (kind, file_date) {
        (EntryKind::Post, Some((_, rest))) => rest,
        _ => stem,
    }
    .to_string();

    let content_html = source.markup.convert(body);
    // A body the tree parser rejects gets no preview
    let preview = if config.previews && content_html.contains("<!--") {
        match preview_html(&content_html) {
            Ok(preview) => preview,
            Err(e) => {
                tracing::warn!("No preview for {:?}: {}", source.path, e);
                None
            }
        }
    } else {
        None
    };

    let address = page_address(&slug, kind.root_kind(), config);
    tracing::debug!("Parsed {} {:?} -> {}", kind.as_str(), source.path, address.uri);

    Ok(Entry {
        kind,
        metadata,
        slug,
        date,
        address,
        content_html,
        preview_html: preview,
        source_path: source.path.clone(),
        markup: source.markup.dir().to_string(),
    })
}

fn parse_date(raw: &str, format: &str) -> Result<NaiveDate, EntryError> {
    NaiveDate::parse_from_str(raw.trim(), format).map_err(|_| EntryError::InvalidDate {
        date: raw.to_string(),
        format: format.to_string(),
    })
}

/// Split `2014-03-02-title` into its date and the remaining name
fn split_date_prefix(stem: &str) -> Option<(NaiveDate, &str)> {
    let prefix = stem.get(..FILE_DATE_LEN)?;
    let rest = stem.get(FILE_DATE_LEN..)?.strip_prefix('-')?;
    if rest.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(prefix, FILE_DATE_FORMAT).ok()?;
    Some((date, rest))
}
