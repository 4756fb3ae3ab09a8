//! Change summary aggregation
//!
//! The aggregator compares a [`ContentSnapshot`] against a loaded
//! [`TrackingRecord`] and produces a [`ChangeReport`]: which documents are
//! new, changed, unchanged or deleted, and which posts and videos have not
//! been accepted by the duplicate guard yet.
//!
//! The aggregator only reads. Recording the changes it finds is the job of
//! [`ChangeDetector::update`](crate::ChangeDetector::update) and
//! [`DuplicateGuard`](crate::DuplicateGuard).
//!
//! ## Example
//!
//! ```rust
//! use scrapetrack::sources::{ContentSnapshot, ScannedDoc};
//! use scrapetrack::summary::Aggregator;
//! use scrapetrack::types::TrackingRecord;
//!
//! let record = TrackingRecord::default();
//! let snapshot = ContentSnapshot {
//!     docs: vec![ScannedDoc { filename: "a.md".into(), content: "hello".into() }],
//!     ..Default::default()
//! };
//!
//! let report = Aggregator::new(&record, &snapshot, "docs/").report();
//! assert!(report.has_changes);
//! assert_eq!(report.details.docs.new, vec!["a.md".to_string()]);
//! ```

use crate::detector::doc_name;
use crate::error::Result;
use crate::sources::{ContentSnapshot, PostRecord, VideoRecord};
use crate::types::TrackingRecord;
use crate::utils::{self, hash_content, parse_timestamp};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Number of posts/videos listed per section in the summary text
pub const MAX_LISTED_ITEMS: usize = 5;

/// A tracked document whose content no longer matches the record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChange {
    /// File name, e.g. `getting-started.md`
    pub filename: String,
    /// Time of the most recent recorded version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Diff summary of the most recent recorded version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
    /// Lines added in the most recent recorded version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_lines: Option<usize>,
    /// Lines removed in the most recent recorded version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_lines: Option<usize>,
    /// First added lines of the most recent recorded version
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_preview: Vec<String>,
    /// First removed lines of the most recent recorded version
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_preview: Vec<String>,
}

/// Documents partitioned by their state relative to the record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChanges {
    /// Present but never tracked
    pub new: Vec<String>,
    /// Present with a different hash
    pub changed: Vec<DocChange>,
    /// Present with the recorded hash
    pub unchanged: Vec<String>,
    /// Tracked but no longer present
    pub deleted: Vec<String>,
}

impl DocChanges {
    /// New, changed and deleted documents
    pub fn total(&self) -> usize {
        self.new.len() + self.changed.len() + self.deleted.len()
    }
}

/// Posts not yet accepted by the duplicate guard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogChanges {
    /// Newest first, undated last
    pub new_posts: Vec<PostRecord>,
    /// `new_posts.len()`
    pub count: usize,
}

/// Videos not yet accepted by the duplicate guard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoChanges {
    /// Newest first, undated last
    pub new_videos: Vec<VideoRecord>,
    /// `new_videos.len()`
    pub count: usize,
}

/// The three partitions of a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetails {
    /// Documentation partitions
    pub docs: DocChanges,
    /// Posts not seen before
    pub blog: BlogChanges,
    /// Videos not seen before
    pub videos: VideoChanges,
}

/// Full change report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Whether anything at all changed
    pub has_changes: bool,
    /// Plain-text rendering for digests and logs
    pub summary: String,
    /// Structured partitions
    pub details: ChangeDetails,
    /// Generation time
    pub timestamp: DateTime<Utc>,
}

impl ChangeReport {
    /// Number of changes across all partitions
    pub fn total_changes(&self) -> usize {
        self.details.docs.total() + self.details.blog.count + self.details.videos.count
    }
}

/// Changes restricted to a lookback window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsNew {
    /// `"Last N days"`, or `"Last 24 hours"` for a one-day window
    pub period: String,
    /// Sum of the three lists
    pub total_changes: usize,
    /// New and changed document file names
    pub new_docs: Vec<String>,
    /// Posts dated inside the window
    pub new_blog_posts: Vec<PostRecord>,
    /// Videos dated inside the window
    pub new_videos: Vec<VideoRecord>,
}

/// Read-only comparison of a snapshot against a record
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    record: &'a TrackingRecord,
    snapshot: &'a ContentSnapshot,
    docs_prefix: &'a str,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator
    pub fn new(
        record: &'a TrackingRecord,
        snapshot: &'a ContentSnapshot,
        docs_prefix: &'a str,
    ) -> Self {
        Self {
            record,
            snapshot,
            docs_prefix,
        }
    }

    /// Partition the snapshot's documents
    pub fn doc_changes(&self) -> DocChanges {
        let mut changes = DocChanges::default();
        let mut present = BTreeSet::new();

        for doc in &self.snapshot.docs {
            present.insert(doc.filename.as_str());
            let key = format!("{}{}", self.docs_prefix, doc.filename);

            match self.record.content_hashes.get(&key) {
                None => changes.new.push(doc.filename.clone()),
                Some(stored) if *stored == hash_content(&doc.content) => {
                    changes.unchanged.push(doc.filename.clone())
                }
                Some(_) => changes.changed.push(self.describe_change(&key, &doc.filename)),
            }
        }

        changes.deleted = self
            .record
            .doc_keys(self.docs_prefix)
            .filter_map(|key| key.strip_prefix(self.docs_prefix))
            .filter(|filename| !present.contains(filename))
            .map(str::to_string)
            .collect();

        changes.new.sort();
        changes.unchanged.sort();
        changes.changed.sort_by(|a, b| a.filename.cmp(&b.filename));
        changes
    }

    /// Enrich a changed document with its latest history entry
    fn describe_change(&self, key: &str, filename: &str) -> DocChange {
        let latest = doc_name(key, self.docs_prefix)
            .and_then(|name| self.record.doc_versions.get(&name))
            .and_then(|history| history.latest());

        match latest {
            Some(entry) => DocChange {
                filename: filename.to_string(),
                timestamp: Some(entry.timestamp),
                diff_summary: entry.diff_summary.clone(),
                added_lines: entry.added_lines,
                removed_lines: entry.removed_lines,
                added_preview: entry.added_preview.clone(),
                removed_preview: entry.removed_preview.clone(),
            },
            None => DocChange {
                filename: filename.to_string(),
                timestamp: None,
                diff_summary: None,
                added_lines: None,
                removed_lines: None,
                added_preview: Vec::new(),
                removed_preview: Vec::new(),
            },
        }
    }

    /// Posts whose URL has not been accepted yet
    pub fn blog_changes(&self) -> BlogChanges {
        let mut new_posts: Vec<PostRecord> = self
            .snapshot
            .posts
            .iter()
            .filter(|post| !self.record.blog_urls.contains(&post.url))
            .cloned()
            .collect();
        new_posts.sort_by(|a, b| b.date.cmp(&a.date));

        BlogChanges {
            count: new_posts.len(),
            new_posts,
        }
    }

    /// Videos whose id has not been accepted yet
    pub fn video_changes(&self) -> VideoChanges {
        let mut new_videos: Vec<VideoRecord> = self
            .snapshot
            .videos
            .iter()
            .filter(|video| !self.record.video_ids.contains(&video.video_id))
            .cloned()
            .collect();
        new_videos.sort_by(|a, b| b.date.cmp(&a.date));

        VideoChanges {
            count: new_videos.len(),
            new_videos,
        }
    }

    /// Build the full report stamped with the current time
    pub fn report(&self) -> ChangeReport {
        self.report_at(utils::now())
    }

    /// Build the full report stamped with `now`
    pub fn report_at(&self, now: DateTime<Utc>) -> ChangeReport {
        let details = ChangeDetails {
            docs: self.doc_changes(),
            blog: self.blog_changes(),
            videos: self.video_changes(),
        };
        let total = details.docs.total() + details.blog.count + details.videos.count;
        debug!(
            "Aggregated {} changes ({} docs, {} posts, {} videos)",
            total,
            details.docs.total(),
            details.blog.count,
            details.videos.count
        );

        ChangeReport {
            has_changes: total > 0,
            summary: render_summary(&details, now),
            details,
            timestamp: now,
        }
    }

    /// Changes within the last `days` days, relative to the current time
    pub fn whats_new(&self, days: u32) -> WhatsNew {
        self.whats_new_at(days, utils::now())
    }

    /// Changes within the last `days` days, relative to `now`
    ///
    /// Documents carry no publish date, so every new or changed document is
    /// listed. Posts and videos without a parseable date are left out.
    /// A window reaching past the earliest representable time includes
    /// every dated item.
    pub fn whats_new_at(&self, days: u32, now: DateTime<Utc>) -> WhatsNew {
        let cutoff = now.checked_sub_signed(Duration::days(i64::from(days)));
        let in_window = |date: &str| {
            parse_timestamp(date).is_some_and(|ts| cutoff.map_or(true, |cutoff| ts >= cutoff))
        };

        let docs = self.doc_changes();
        let new_docs: Vec<String> = docs
            .new
            .into_iter()
            .chain(docs.changed.into_iter().map(|change| change.filename))
            .collect();
        let new_blog_posts: Vec<PostRecord> = self
            .blog_changes()
            .new_posts
            .into_iter()
            .filter(|post| in_window(&post.date))
            .collect();
        let new_videos: Vec<VideoRecord> = self
            .video_changes()
            .new_videos
            .into_iter()
            .filter(|video| in_window(&video.date))
            .collect();

        WhatsNew {
            period: period_label(days),
            total_changes: new_docs.len() + new_blog_posts.len() + new_videos.len(),
            new_docs,
            new_blog_posts,
            new_videos,
        }
    }
}

/// Human label for a lookback window
pub fn period_label(days: u32) -> String {
    if days > 1 {
        format!("Last {} days", days)
    } else {
        "Last 24 hours".to_string()
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} new {}", count, noun)
    } else {
        format!("{} new {}s", count, noun)
    }
}

/// First ten characters of a date, or a placeholder
fn short_date(date: &str) -> &str {
    if date.is_empty() {
        return "Unknown date";
    }
    match date.char_indices().nth(10) {
        Some((idx, _)) => &date[..idx],
        None => date,
    }
}

/// Render the plain-text summary for a set of partitions
pub fn render_summary(details: &ChangeDetails, now: DateTime<Utc>) -> String {
    let docs_total = details.docs.total();
    let total = docs_total + details.blog.count + details.videos.count;
    if total == 0 {
        return "No changes detected since last update.".to_string();
    }

    let mut out = format!("Changes detected on {}:\n\n", now.format("%B %d, %Y"));

    if docs_total > 0 {
        out.push_str(&format!("Documentation: {} changes\n", docs_total));
        for change in &details.docs.changed {
            match &change.diff_summary {
                Some(diff) => out.push_str(&format!("  - {}: Updated ({})\n", change.filename, diff)),
                None => out.push_str(&format!("  - {}: Updated content\n", change.filename)),
            }
        }
        for filename in &details.docs.new {
            out.push_str(&format!("  - {}: New file added\n", filename));
        }
        for filename in &details.docs.deleted {
            out.push_str(&format!("  - {}: File deleted\n", filename));
        }
        out.push('\n');
    }

    if details.blog.count > 0 {
        out.push_str(&format!("Blog Posts: {}\n", plural(details.blog.count, "article")));
        for post in details.blog.new_posts.iter().take(MAX_LISTED_ITEMS) {
            out.push_str(&listed_item(&post.title, &post.date));
        }
        out.push('\n');
    }

    if details.videos.count > 0 {
        out.push_str(&format!("Videos: {}\n", plural(details.videos.count, "video")));
        for video in details.videos.new_videos.iter().take(MAX_LISTED_ITEMS) {
            out.push_str(&listed_item(&video.title, &video.date));
        }
        out.push('\n');
    }

    out.push_str(&format!("Total: {} changes detected", total));
    out
}

fn listed_item(title: &str, date: &str) -> String {
    format!("  - \"{}\" ({})\n", title, short_date(date))
}

#[derive(Serialize)]
struct SavedBlog<'a> {
    new_count: usize,
    new_posts: &'a [PostRecord],
}

#[derive(Serialize)]
struct SavedVideos<'a> {
    new_count: usize,
    new_videos: &'a [VideoRecord],
}

#[derive(Serialize)]
struct SavedReport<'a> {
    generated_at: DateTime<Utc>,
    has_changes: bool,
    total_changes: usize,
    docs: &'a DocChanges,
    blog: SavedBlog<'a>,
    videos: SavedVideos<'a>,
    summary_text: &'a str,
    whats_new: &'a WhatsNew,
}

/// Persist a report and its what's-new view as pretty JSON
///
/// The file is written atomically; renderers may read it concurrently.
pub fn save_report(path: &Path, report: &ChangeReport, whats_new: &WhatsNew) -> Result<()> {
    let saved = SavedReport {
        generated_at: report.timestamp,
        has_changes: report.has_changes,
        total_changes: report.total_changes(),
        docs: &report.details.docs,
        blog: SavedBlog {
            new_count: report.details.blog.count,
            new_posts: &report.details.blog.new_posts,
        },
        videos: SavedVideos {
            new_count: report.details.videos.count,
            new_videos: &report.details.videos.new_videos,
        },
        summary_text: &report.summary,
        whats_new,
    };

    let mut json = serde_json::to_string_pretty(&saved)?;
    json.push('\n');
    utils::atomic_write(path, json.as_bytes())?;
    info!("Saved change report to {:?}", path);
    Ok(())
}
