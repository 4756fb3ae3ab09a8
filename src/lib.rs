//! # Scrapetrack - change detection and dedup for scraped content
//!
//! A small persistence-backed library that remembers what a scraping
//! pipeline has already seen, so a daily digest only reports what is new.
//!
//! ## Overview
//!
//! Scrapetrack keeps one JSON tracking record and answers three questions:
//! - Have I seen this video id / post URL before? ([`DuplicateGuard`])
//! - Has this document changed since it was last recorded? ([`ChangeDetector`])
//! - What changed across docs, posts and videos? ([`summary::Aggregator`])
//!
//! ## Architecture
//!
//! - **Content hashing**: SHA-256 over UTF-8 text, stored and compared as the
//!   full hex digest, truncated only for display
//! - **Tracking store**: a pretty-printed JSON record written atomically,
//!   recovered from corruption by moving the bad file aside
//! - **Version history**: the last 10 versions of every document, with line
//!   diff statistics when the previous text is available
//! - **Snapshots**: a scanner for the `docs/`, `blog/` and `videos/` layout
//!   fetchers write to
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrapetrack::TrackerBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new().data_dir("./data").build()?;
//!
//! // Discrete items: record once, skip afterwards
//! if tracker.add_blog_url("https://example.com/blog/launch")? {
//!     println!("new post");
//! }
//!
//! // Versioned documents: hash, compare, record
//! let old = std::fs::read_to_string("./data/docs/intro.md").ok();
//! let new = "# Intro\n\nUpdated text\n";
//! if tracker.is_changed("docs/intro.md", new)? {
//!     tracker.update("docs/intro.md", new, old.as_deref())?;
//! }
//!
//! // Reporting
//! let report = tracker.detect_changes()?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-level use
//!
//! The components can be used without the facade. They all borrow one
//! [`TrackingStore`], which is the only thing holding state:
//!
//! ```rust,no_run
//! use scrapetrack::{ChangeDetector, DuplicateGuard, TrackingStore};
//!
//! # fn main() -> scrapetrack::Result<()> {
//! let store = TrackingStore::new("data/metadata.json");
//! let guard = DuplicateGuard::new(&store);
//! let detector = ChangeDetector::new(&store);
//!
//! guard.add_video_id("abc123")?;
//! detector.update("docs/a.md", "text", None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] with a [`TrackError`]. A corrupted
//! record is not an error: it is backed up, replaced by a fresh record and
//! reported through a `tracing` warning.
//!
//! ## Module Organization
//!
//! - [`storage`]: the tracking store
//! - [`dedup`]: duplicate guard for videos and posts
//! - [`detector`]: hash-based change detection and version history
//! - [`diff`]: line diff statistics
//! - [`sources`]: data directory snapshots
//! - [`summary`]: change reports
//! - [`tracker`]: facade and builder
//! - [`types`]: persisted types and configuration
//! - [`utils`]: hashing, atomic writes, timestamps
//! - [`error`]: error types

pub mod dedup;
pub mod detector;
pub mod diff;
pub mod error;
pub mod sources;
pub mod storage;
pub mod summary;
pub mod tracker;
pub mod types;
pub mod utils;

pub use dedup::DuplicateGuard;
pub use detector::{ChangeDetector, UpdateOutcome};
pub use error::{Result, TrackError};
pub use sources::{ContentSnapshot, DataDir, PostRecord, ScannedDoc, VideoRecord};
pub use storage::TrackingStore;
pub use summary::{ChangeReport, WhatsNew};
pub use tracker::{Tracker, TrackerBuilder};
pub use types::*;
pub use utils::hash_content;
