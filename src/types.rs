//! Core data types persisted by the tracking store
//!
//! ## Overview
//!
//! - **Record**: [`TrackingRecord`], the single JSON document holding every
//!   identifier ever seen
//! - **Document history**: [`DocVersionHistory`] and [`VersionEntry`]
//! - **Derived views**: [`TrackingStats`], [`StatusSummary`]
//!
//! All collections use ordered maps and sets so the pretty-printed record is
//! stable between saves and diffs cleanly under version control.
//!
//! ## Examples
//!
//! ```rust
//! use scrapetrack::types::TrackingRecord;
//!
//! let record = TrackingRecord::default();
//! assert!(record.video_ids.is_empty());
//! assert_eq!(record.stats.total_docs, 0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

/// Schema version written into new records
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Maximum number of entries kept in a document's history
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// Maximum number of added/removed lines kept as a diff preview
pub const MAX_PREVIEW_LINES: usize = 5;

/// Default namespace prefix for documentation paths
pub const DEFAULT_DOCS_PREFIX: &str = "docs/";

/// Default lookback window for "what's new" views
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// File name of the persisted change report inside the data directory
pub const REPORT_FILE_NAME: &str = "changes-summary.json";

/// The persisted tracking record
///
/// Every field carries a serde default so that records written by older
/// versions (or by hand) are backfilled on load instead of rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingRecord {
    /// Record format version
    #[serde(alias = "version")]
    pub schema_version: String,
    /// Time of the last save
    pub last_updated: Option<DateTime<Utc>>,
    /// Logical path -> SHA-256 of the last recorded content
    pub content_hashes: BTreeMap<String, String>,
    /// Every accepted video identifier
    pub video_ids: BTreeSet<String>,
    /// Every accepted blog/post URL
    pub blog_urls: BTreeSet<String>,
    /// Document name -> rolling version history
    pub doc_versions: BTreeMap<String, DocVersionHistory>,
    /// Derived counters
    pub stats: TrackingStats,
    /// Keys written by other tools sharing the file, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for TrackingRecord {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            last_updated: None,
            content_hashes: BTreeMap::new(),
            video_ids: BTreeSet::new(),
            blog_urls: BTreeSet::new(),
            doc_versions: BTreeMap::new(),
            stats: TrackingStats::default(),
            extra: serde_json::Map::new(),
        }
    }
}

impl TrackingRecord {
    /// Count `content_hashes` keys under the documentation namespace
    pub fn doc_key_count(&self, docs_prefix: &str) -> usize {
        self.content_hashes
            .keys()
            .filter(|key| key.starts_with(docs_prefix))
            .count()
    }

    /// Iterate tracked documentation keys
    pub fn doc_keys<'a>(&'a self, docs_prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.content_hashes
            .keys()
            .map(String::as_str)
            .filter(move |key| key.starts_with(docs_prefix))
    }

    /// Recompute every derived counter from the primary collections
    ///
    /// `last_successful_scrape` is not derived and is left untouched.
    pub fn recompute_stats(&mut self, docs_prefix: &str) {
        self.stats.total_docs = self.doc_key_count(docs_prefix);
        self.stats.total_videos = self.video_ids.len();
        self.stats.total_blog_posts = self.blog_urls.len();
    }

    /// Check the derived counters against the primary collections
    pub fn stats_consistent(&self, docs_prefix: &str) -> bool {
        self.stats.total_docs == self.doc_key_count(docs_prefix)
            && self.stats.total_videos == self.video_ids.len()
            && self.stats.total_blog_posts == self.blog_urls.len()
    }
}

/// Derived counters stored alongside the record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingStats {
    /// Number of documentation keys in `content_hashes`
    pub total_docs: usize,
    /// Size of `blog_urls`
    pub total_blog_posts: usize,
    /// Size of `video_ids`
    pub total_videos: usize,
    /// Time of the last `update` call
    pub last_successful_scrape: Option<DateTime<Utc>>,
}

/// Rolling version history for one documentation file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocVersionHistory {
    /// Hash of the most recently recorded content
    pub current_hash: String,
    /// Hash recorded before the most recent update, if any
    pub previous_hash: Option<String>,
    /// Time of the most recent update
    pub last_changed: Option<DateTime<Utc>>,
    /// Oldest to newest, never longer than [`MAX_HISTORY_ENTRIES`]
    pub history: VecDeque<VersionEntry>,
}

impl DocVersionHistory {
    /// Append an entry, evicting the oldest ones past the cap
    pub fn push_entry(&mut self, entry: VersionEntry) {
        self.history.push_back(entry);
        self.enforce_cap();
    }

    /// Drop the oldest entries past [`MAX_HISTORY_ENTRIES`]
    ///
    /// Returns the number of entries removed.
    pub fn enforce_cap(&mut self) -> usize {
        let excess = self.history.len().saturating_sub(MAX_HISTORY_ENTRIES);
        self.history.drain(..excess);
        excess
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.history.back()
    }
}

/// One recorded write of a documentation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Hash of the content written
    pub hash: String,
    /// When it was written
    pub timestamp: DateTime<Utc>,
    /// Whether the hash differs from the one recorded before it
    pub changed: bool,
    /// `"+A lines, -R lines"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
    /// Number of added lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_lines: Option<usize>,
    /// Number of removed lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_lines: Option<usize>,
    /// First few added lines, trimmed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_preview: Vec<String>,
    /// First few removed lines, trimmed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_preview: Vec<String>,
    /// Whether diff fields are populated
    #[serde(default)]
    pub has_diff: bool,
}

/// Read-only overview of a tracking record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Time of the last save
    pub last_updated: Option<DateTime<Utc>>,
    /// Tracked documentation files
    pub total_docs: usize,
    /// Known blog/post URLs
    pub total_blog_posts: usize,
    /// Known video identifiers
    pub total_videos: usize,
    /// Time of the last document update
    pub last_successful_scrape: Option<DateTime<Utc>>,
    /// All keys in `content_hashes`, documentation or not
    pub tracked_files: usize,
    /// Documents with a version history
    pub doc_versions_tracked: usize,
}

impl From<&TrackingRecord> for StatusSummary {
    fn from(record: &TrackingRecord) -> Self {
        Self {
            last_updated: record.last_updated,
            total_docs: record.stats.total_docs,
            total_blog_posts: record.stats.total_blog_posts,
            total_videos: record.stats.total_videos,
            last_successful_scrape: record.stats.last_successful_scrape,
            tracked_files: record.content_hashes.len(),
            doc_versions_tracked: record.doc_versions.len(),
        }
    }
}

/// Configuration for a [`Tracker`](crate::Tracker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Directory holding `docs/`, `blog/` and `videos/`
    pub data_dir: PathBuf,
    /// Tracking record file
    pub metadata_path: PathBuf,
    /// Where a corrupted or reset record is moved
    pub backup_path: PathBuf,
    /// Namespace prefix of documentation keys
    pub docs_prefix: String,
    /// Default lookback window in days
    pub window_days: u32,
    /// File names in `docs/` that are not documents
    pub excluded_docs: Vec<String>,
}

impl TrackerConfig {
    /// Configuration with every path derived from `data_dir`
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let metadata_path = data_dir.join("metadata.json");
        Self {
            backup_path: crate::storage::default_backup_path(&metadata_path),
            metadata_path,
            data_dir,
            docs_prefix: DEFAULT_DOCS_PREFIX.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            excluded_docs: vec![crate::sources::SCRAPE_SUMMARY_FILE.to_string()],
        }
    }

    /// Location of the persisted change report
    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILE_NAME)
    }

    /// Data directory as a path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::for_data_dir("data")
    }
}
