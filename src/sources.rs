//! Snapshots of the content currently present on disk
//!
//! Fetchers write their output under a data directory:
//!
//! ```text
//! data/
//! ├── docs/      # one markdown file per documentation page
//! ├── blog/      # JSON files holding post records
//! └── videos/    # JSON files holding video records
//! ```
//!
//! [`DataDir::scan`] reads that layout into a [`ContentSnapshot`], which is
//! what the change summary aggregator compares against the tracking record.
//! Snapshots can also be assembled in memory by callers that already hold
//! the fetched items.
//!
//! JSON files may contain a list of records, an object wrapping the list
//! (`{"posts": [...]}` / `{"videos": [...]}`), or a single record. Files that
//! cannot be read or parsed are logged and skipped; one bad feed dump must
//! not hide changes from the others.

use crate::error::Result;
use crate::utils::truncate_chars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Maximum characters kept from a post summary
pub const MAX_SUMMARY_CHARS: usize = 200;

/// Generated file living in the docs directory that is not a document
pub const SCRAPE_SUMMARY_FILE: &str = "scrape-summary.md";

/// A documentation file present in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedDoc {
    /// File name, e.g. `getting-started.md`
    pub filename: String,
    /// Full text
    pub content: String,
}

/// A blog/changelog post record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Post title
    pub title: String,
    /// Post URL, the dedup key
    pub url: String,
    /// Best-effort publish date as found in the feed
    #[serde(default)]
    pub date: String,
    /// Summary, truncated to [`MAX_SUMMARY_CHARS`]
    #[serde(default)]
    pub summary: String,
}

/// A video record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Video title
    pub title: String,
    /// Platform video identifier, the dedup key
    pub video_id: String,
    /// Best-effort publish date as found in the feed
    #[serde(default)]
    pub date: String,
    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: String,
}

/// Everything currently present, as seen by one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    /// Documentation files, sorted by file name
    pub docs: Vec<ScannedDoc>,
    /// Post records in file order
    pub posts: Vec<PostRecord>,
    /// Video records in file order
    pub videos: Vec<VideoRecord>,
}

/// Scanner for the on-disk data directory
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
    excluded_docs: Vec<String>,
}

impl DataDir {
    /// Create a scanner rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_docs: vec![SCRAPE_SUMMARY_FILE.to_string()],
        }
    }

    /// Replace the list of doc file names that are not documents
    pub fn with_excluded_docs(mut self, excluded: Vec<String>) -> Self {
        self.excluded_docs = excluded;
        self
    }

    /// Root of the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the whole data directory
    ///
    /// Missing subdirectories yield empty lists.
    ///
    /// # Errors
    ///
    /// - [`TrackError::WalkDir`](crate::TrackError::WalkDir) if a directory
    ///   cannot be listed
    /// - [`TrackError::Io`](crate::TrackError::Io) if a markdown file cannot
    ///   be read
    /// - [`TrackError::Utf8`](crate::TrackError::Utf8) if a markdown file is
    ///   not valid UTF-8
    pub fn scan(&self) -> Result<ContentSnapshot> {
        let snapshot = ContentSnapshot {
            docs: self.scan_docs()?,
            posts: self.scan_posts()?,
            videos: self.scan_videos()?,
        };
        debug!(
            "Scanned {:?}: {} docs, {} posts, {} videos",
            self.root,
            snapshot.docs.len(),
            snapshot.posts.len(),
            snapshot.videos.len()
        );
        Ok(snapshot)
    }

    /// Read `docs/*.md`, skipping excluded names
    pub fn scan_docs(&self) -> Result<Vec<ScannedDoc>> {
        let mut docs = Vec::new();
        for path in list_files(&self.root.join("docs"), "md")? {
            let filename = file_name(&path);
            if self.excluded_docs.iter().any(|name| *name == filename) {
                continue;
            }
            let content = String::from_utf8(fs::read(&path)?)?;
            docs.push(ScannedDoc { filename, content });
        }
        Ok(docs)
    }

    /// Read post records from `blog/*.json`
    pub fn scan_posts(&self) -> Result<Vec<PostRecord>> {
        let mut posts = Vec::new();
        for path in list_files(&self.root.join("blog"), "json")? {
            if let Some(values) = read_records(&path, "posts") {
                posts.extend(values.iter().filter_map(post_from_value));
            }
        }
        Ok(posts)
    }

    /// Read video records from `videos/*.json`
    pub fn scan_videos(&self) -> Result<Vec<VideoRecord>> {
        let mut videos = Vec::new();
        for path in list_files(&self.root.join("videos"), "json")? {
            if let Some(values) = read_records(&path, "videos") {
                videos.extend(values.iter().filter_map(video_from_value));
            }
        }
        Ok(videos)
    }
}

/// Files with `extension` directly inside `dir`, sorted by name
fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(extension)
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse a JSON file into its list of record objects
///
/// Returns `None` (after logging) when the file cannot be used.
fn read_records(path: &Path, wrapper_key: &str) -> Option<Vec<Value>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            return None;
        }
    };
    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            return None;
        }
    };
    Some(unwrap_records(value, wrapper_key))
}

/// Normalise the three accepted file shapes into a list
fn unwrap_records(value: Value, wrapper_key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(wrapper_key) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert(wrapper_key.to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        _ => Vec::new(),
    }
}

/// First non-empty string among `keys`
fn string_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Build a post record; records without a URL are dropped
pub fn post_from_value(value: &Value) -> Option<PostRecord> {
    let url = string_field(value, &["url", "link"]);
    if url.is_empty() {
        return None;
    }
    Some(PostRecord {
        title: string_field(value, &["title"]),
        url,
        date: string_field(value, &["published", "date"]),
        summary: truncate_chars(
            &string_field(value, &["summary", "description"]),
            MAX_SUMMARY_CHARS,
        ),
    })
}

/// Build a video record; records without an id are dropped
pub fn video_from_value(value: &Value) -> Option<VideoRecord> {
    let video_id = string_field(value, &["video_id", "id"]);
    if video_id.is_empty() {
        return None;
    }
    Some(VideoRecord {
        title: string_field(value, &["title"]),
        video_id,
        date: string_field(value, &["published", "date"]),
        thumbnail: string_field(value, &["thumbnail"]),
    })
}
