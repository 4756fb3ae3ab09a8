//! Hash-based change detection for versioned documents
//!
//! The detector answers two questions for a logical path such as
//! `docs/getting-started.md`:
//!
//! - [`ChangeDetector::is_changed`]: does this content differ from what was
//!   last recorded? Read-only.
//! - [`ChangeDetector::update`]: record this content as the current version,
//!   and for documentation paths append a bounded history entry.
//!
//! ## Diffs
//!
//! A hash alone cannot say *what* changed. `update` takes the previous text
//! as an optional argument; callers that want diff statistics in the history
//! must read the old content before overwriting it. Without it the history
//! entry is hash-only (`has_diff == false`).
//!
//! ## Example
//!
//! ```rust,no_run
//! use scrapetrack::{ChangeDetector, TrackingStore};
//!
//! # fn example() -> scrapetrack::Result<()> {
//! let store = TrackingStore::new("data/metadata.json");
//! let detector = ChangeDetector::new(&store);
//!
//! if detector.is_changed("docs/a.md", "v2")? {
//!     detector.update("docs/a.md", "v2", Some("v1"))?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::diff::compute_content_diff;
use crate::error::{Result, TrackError};
use crate::storage::TrackingStore;
use crate::types::{DocVersionHistory, VersionEntry};
use crate::utils::{self, hash_content};
use std::path::Path;
use tracing::{debug, instrument};

/// Result of a single [`ChangeDetector::update`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Hash now stored for the path
    pub hash: String,
    /// Hash stored before this call, if the path was known
    pub previous_hash: Option<String>,
    /// Whether the stored hash changed (always true for new paths)
    pub content_changed: bool,
    /// History entry appended, for documentation paths
    pub entry: Option<VersionEntry>,
}

/// Change detector backed by a [`TrackingStore`]
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector<'a> {
    store: &'a TrackingStore,
}

/// Derive the document name for a documentation path
///
/// Returns `None` when `path` is outside the documentation namespace.
/// The name is the file stem: `docs/getting-started.md` → `getting-started`.
pub fn doc_name(path: &str, docs_prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(docs_prefix)?;
    Path::new(rest)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

impl<'a> ChangeDetector<'a> {
    /// Create a detector over `store`
    pub fn new(store: &'a TrackingStore) -> Self {
        Self { store }
    }

    /// Check whether `content` differs from what is recorded for `path`
    ///
    /// Paths never passed to [`update`](Self::update) are reported as changed.
    pub fn is_changed(&self, path: &str, content: &str) -> Result<bool> {
        let record = self.store.load()?;
        Ok(match record.content_hashes.get(path) {
            Some(stored) => *stored != hash_content(content),
            None => true,
        })
    }

    /// Record `content` as the current version of `path`
    ///
    /// The prior hash is read from the same loaded record that is written
    /// back, so the `changed` flag always matches what was persisted.
    /// Documentation paths additionally get a history entry, with diff
    /// statistics when the path was known before and `previous_content` is
    /// supplied. The record is always saved.
    #[instrument(skip(self, content, previous_content))]
    pub fn update(
        &self,
        path: &str,
        content: &str,
        previous_content: Option<&str>,
    ) -> Result<UpdateOutcome> {
        let new_hash = hash_content(content);
        let docs_prefix = self.store.docs_prefix().to_string();

        let outcome = self.store.modify(|record| {
            let now = utils::now();
            let previous_hash = record
                .content_hashes
                .insert(path.to_string(), new_hash.clone());
            let content_changed = previous_hash.as_deref() != Some(new_hash.as_str());

            let mut entry = None;
            if let Some(name) = doc_name(path, &docs_prefix) {
                let mut version = VersionEntry {
                    hash: new_hash.clone(),
                    timestamp: now,
                    changed: content_changed,
                    diff_summary: None,
                    added_lines: None,
                    removed_lines: None,
                    added_preview: Vec::new(),
                    removed_preview: Vec::new(),
                    has_diff: false,
                };

                if let (true, Some(_), Some(old_text)) =
                    (content_changed, previous_hash.as_ref(), previous_content)
                {
                    let diff = compute_content_diff(old_text, content);
                    version.diff_summary = Some(diff.summary);
                    version.added_lines = Some(diff.added);
                    version.removed_lines = Some(diff.removed);
                    version.added_preview = diff.added_preview;
                    version.removed_preview = diff.removed_preview;
                    version.has_diff = true;
                }

                let history: &mut DocVersionHistory =
                    record.doc_versions.entry(name).or_default();
                history.current_hash = new_hash.clone();
                history.previous_hash = previous_hash.clone();
                history.last_changed = Some(now);
                history.push_entry(version.clone());
                entry = Some(version);
            }

            record.stats.total_docs = record.doc_key_count(&docs_prefix);
            record.stats.last_successful_scrape = Some(now);

            let outcome = UpdateOutcome {
                hash: new_hash.clone(),
                previous_hash,
                content_changed,
                entry,
            };
            (outcome, true)
        })?;

        debug!(
            "Recorded {} as {} (changed: {})",
            path,
            utils::display_hash(&outcome.hash),
            outcome.content_changed
        );
        Ok(outcome)
    }

    /// Version history for a document name
    ///
    /// # Errors
    ///
    /// - [`TrackError::UnknownDocument`] if the document has never been updated
    pub fn history(&self, name: &str) -> Result<DocVersionHistory> {
        self.store
            .load()?
            .doc_versions
            .remove(name)
            .ok_or_else(|| TrackError::UnknownDocument(name.to_string()))
    }
}
