//! Duplicate guard for discrete items (videos, blog posts)
//!
//! Fetchers call the guard once per item. The first call for an identifier
//! records it and returns `true`; every later call returns `false` and leaves
//! the record untouched.
//!
//! Identifiers are compared as exact strings. The guard performs no
//! canonicalisation, so callers normalise URLs (trailing slashes, tracking
//! parameters) before asking.

use crate::error::Result;
use crate::storage::TrackingStore;
use tracing::debug;

/// Which identifier set a guard call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Video,
    BlogPost,
}

/// Idempotent "have I seen this before" gate backed by a [`TrackingStore`]
#[derive(Debug, Clone, Copy)]
pub struct DuplicateGuard<'a> {
    store: &'a TrackingStore,
}

impl<'a> DuplicateGuard<'a> {
    /// Create a guard over `store`
    pub fn new(store: &'a TrackingStore) -> Self {
        Self { store }
    }

    /// Record a video identifier
    ///
    /// Returns `true` if the id was new, `false` if it had been seen before.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use scrapetrack::{DuplicateGuard, TrackingStore};
    ///
    /// # fn example() -> scrapetrack::Result<()> {
    /// let store = TrackingStore::new("data/metadata.json");
    /// let guard = DuplicateGuard::new(&store);
    /// assert!(guard.add_video_id("abc123")?);
    /// assert!(!guard.add_video_id("abc123")?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_video_id(&self, id: &str) -> Result<bool> {
        self.add(ItemKind::Video, id)
    }

    /// Record a blog/post URL
    ///
    /// Returns `true` if the URL was new, `false` if it had been seen before.
    pub fn add_blog_url(&self, url: &str) -> Result<bool> {
        self.add(ItemKind::BlogPost, url)
    }

    /// Check whether a video identifier is known, without recording it
    pub fn has_video_id(&self, id: &str) -> Result<bool> {
        Ok(self.store.load()?.video_ids.contains(id))
    }

    /// Check whether a blog/post URL is known, without recording it
    pub fn has_blog_url(&self, url: &str) -> Result<bool> {
        Ok(self.store.load()?.blog_urls.contains(url))
    }

    fn add(&self, kind: ItemKind, identifier: &str) -> Result<bool> {
        let inserted = self.store.modify(|record| {
            let inserted = match kind {
                ItemKind::Video => {
                    let inserted = record.video_ids.insert(identifier.to_string());
                    record.stats.total_videos = record.video_ids.len();
                    inserted
                }
                ItemKind::BlogPost => {
                    let inserted = record.blog_urls.insert(identifier.to_string());
                    record.stats.total_blog_posts = record.blog_urls.len();
                    inserted
                }
            };
            (inserted, inserted)
        })?;

        if inserted {
            debug!("Recorded new {:?}: {}", kind, identifier);
        } else {
            debug!("Skipping duplicate {:?}: {}", kind, identifier);
        }
        Ok(inserted)
    }
}
