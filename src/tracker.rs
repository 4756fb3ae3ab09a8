//! High-level tracker facade
//!
//! [`Tracker`] bundles a [`TrackingStore`], the [`DuplicateGuard`] and
//! [`ChangeDetector`] that write through it, and a [`DataDir`] scanner for
//! building reports. It is what the CLI and most embedding callers use.
//!
//! ## Example
//!
//! ```rust,no_run
//! use scrapetrack::TrackerBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new().data_dir("./data").build()?;
//!
//! if tracker.add_video_id("dQw4w9WgXcQ")? {
//!     println!("new video");
//! }
//!
//! let report = tracker.detect_changes()?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

use crate::dedup::DuplicateGuard;
use crate::detector::{ChangeDetector, UpdateOutcome};
use crate::error::{Result, TrackError};
use crate::sources::{ContentSnapshot, DataDir};
use crate::storage::{default_backup_path, TrackingStore};
use crate::summary::{self, Aggregator, ChangeReport, WhatsNew};
use crate::types::{DocVersionHistory, StatusSummary, TrackerConfig, TrackingRecord};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Change tracking for one data directory
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    store: TrackingStore,
    data: DataDir,
}

impl Tracker {
    /// Create a tracker from a validated configuration
    ///
    /// # Errors
    ///
    /// - [`TrackError::InvalidConfiguration`] if the docs prefix is empty or
    ///   the backup path equals the record path
    pub fn new(config: TrackerConfig) -> Result<Self> {
        validate(&config)?;

        let store = TrackingStore::new(&config.metadata_path)
            .with_backup_path(&config.backup_path)
            .with_docs_prefix(config.docs_prefix.clone());
        let data = DataDir::new(&config.data_dir).with_excluded_docs(config.excluded_docs.clone());

        Ok(Self {
            config,
            store,
            data,
        })
    }

    /// Tracker with default settings for `data_dir`
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(TrackerConfig::for_data_dir(data_dir))
    }

    /// Active configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    /// Duplicate guard writing through this tracker's store
    pub fn guard(&self) -> DuplicateGuard<'_> {
        DuplicateGuard::new(&self.store)
    }

    /// Change detector writing through this tracker's store
    pub fn detector(&self) -> ChangeDetector<'_> {
        ChangeDetector::new(&self.store)
    }

    /// See [`DuplicateGuard::add_video_id`]
    pub fn add_video_id(&self, id: &str) -> Result<bool> {
        self.guard().add_video_id(id)
    }

    /// See [`DuplicateGuard::add_blog_url`]
    pub fn add_blog_url(&self, url: &str) -> Result<bool> {
        self.guard().add_blog_url(url)
    }

    /// See [`ChangeDetector::is_changed`]
    pub fn is_changed(&self, path: &str, content: &str) -> Result<bool> {
        self.detector().is_changed(path, content)
    }

    /// See [`ChangeDetector::update`]
    pub fn update(
        &self,
        path: &str,
        content: &str,
        previous_content: Option<&str>,
    ) -> Result<UpdateOutcome> {
        self.detector().update(path, content, previous_content)
    }

    /// Version history of a document
    pub fn history(&self, doc_name: &str) -> Result<DocVersionHistory> {
        self.detector().history(doc_name)
    }

    /// Current record, created or recovered if necessary
    pub fn record(&self) -> Result<TrackingRecord> {
        self.store.load()
    }

    /// Counters and timestamps of the current record
    pub fn status(&self) -> Result<StatusSummary> {
        Ok(StatusSummary::from(&self.store.load()?))
    }

    /// Back up the record and start over
    pub fn reset(&self) -> Result<TrackingRecord> {
        self.store.reset()
    }

    /// Read the data directory
    pub fn scan(&self) -> Result<ContentSnapshot> {
        self.data.scan()
    }

    /// Compare the data directory against the record
    pub fn detect_changes(&self) -> Result<ChangeReport> {
        let snapshot = self.scan()?;
        self.detect_changes_in(&snapshot)
    }

    /// Compare a caller-supplied snapshot against the record
    pub fn detect_changes_in(&self, snapshot: &ContentSnapshot) -> Result<ChangeReport> {
        let record = self.store.load()?;
        Ok(Aggregator::new(&record, snapshot, &self.config.docs_prefix).report())
    }

    /// Changes in the data directory within the last `days` days
    ///
    /// `None` uses the configured window.
    pub fn whats_new(&self, days: Option<u32>) -> Result<WhatsNew> {
        let snapshot = self.scan()?;
        self.whats_new_in(&snapshot, days)
    }

    /// Changes in a caller-supplied snapshot within the last `days` days
    pub fn whats_new_in(&self, snapshot: &ContentSnapshot, days: Option<u32>) -> Result<WhatsNew> {
        let record = self.store.load()?;
        let days = days.unwrap_or(self.config.window_days);
        Ok(Aggregator::new(&record, snapshot, &self.config.docs_prefix).whats_new(days))
    }

    /// Build a report and persist it next to the data
    ///
    /// Returns the report and the path it was written to.
    #[instrument(skip(self))]
    pub fn save_report(&self, path: Option<&Path>) -> Result<(ChangeReport, PathBuf)> {
        let snapshot = self.scan()?;
        let record = self.store.load()?;
        let aggregator = Aggregator::new(&record, &snapshot, &self.config.docs_prefix);
        let report = aggregator.report();
        let whats_new = aggregator.whats_new(self.config.window_days);

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.report_path());
        summary::save_report(&path, &report, &whats_new)?;
        info!("{} changes written to {:?}", report.total_changes(), path);
        Ok((report, path))
    }
}

fn validate(config: &TrackerConfig) -> Result<()> {
    if config.docs_prefix.is_empty() {
        return Err(TrackError::InvalidConfiguration(
            "docs prefix must not be empty".to_string(),
        ));
    }
    if config.metadata_path == config.backup_path {
        return Err(TrackError::InvalidConfiguration(format!(
            "backup path {:?} must differ from the record path",
            config.backup_path
        )));
    }
    Ok(())
}

/// Builder for [`Tracker`]
///
/// Paths not set explicitly are derived from the data directory:
/// `<data>/metadata.json` for the record and `<stem>.backup.json` next to it
/// for the backup.
#[derive(Debug, Clone, Default)]
pub struct TrackerBuilder {
    data_dir: Option<PathBuf>,
    metadata_path: Option<PathBuf>,
    backup_path: Option<PathBuf>,
    docs_prefix: Option<String>,
    window_days: Option<u32>,
    excluded_docs: Option<Vec<String>>,
}

impl TrackerBuilder {
    /// Create a builder with default settings
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scrapetrack::TrackerBuilder;
    ///
    /// let builder = TrackerBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory (default `data`)
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the tracking record file
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scrapetrack::TrackerBuilder;
    ///
    /// let builder = TrackerBuilder::new()
    ///     .data_dir("/srv/digest/data")
    ///     .metadata_path("/srv/digest/state/metadata.json");
    /// ```
    pub fn metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    /// Set the backup location for corrupted or reset records
    pub fn backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_path = Some(path.into());
        self
    }

    /// Set the documentation key prefix (default `docs/`)
    pub fn docs_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.docs_prefix = Some(prefix.into());
        self
    }

    /// Set the default lookback window (default 7 days)
    pub fn window_days(mut self, days: u32) -> Self {
        self.window_days = Some(days);
        self
    }

    /// Replace the doc file names skipped while scanning
    pub fn excluded_docs(mut self, names: Vec<String>) -> Self {
        self.excluded_docs = Some(names);
        self
    }

    /// Resolve the configuration without building a tracker
    pub fn config(&self) -> TrackerConfig {
        let mut config = match &self.data_dir {
            Some(dir) => TrackerConfig::for_data_dir(dir),
            None => TrackerConfig::default(),
        };
        if let Some(path) = &self.metadata_path {
            config.metadata_path = path.clone();
            config.backup_path = default_backup_path(path);
        }
        if let Some(path) = &self.backup_path {
            config.backup_path = path.clone();
        }
        if let Some(prefix) = &self.docs_prefix {
            config.docs_prefix = prefix.clone();
        }
        if let Some(days) = self.window_days {
            config.window_days = days;
        }
        if let Some(names) = &self.excluded_docs {
            config.excluded_docs = names.clone();
        }
        config
    }

    /// Build the tracker
    ///
    /// No file is touched until the first operation.
    pub fn build(self) -> Result<Tracker> {
        Tracker::new(self.config())
    }
}
