//! Durable storage for the tracking record
//!
//! This module owns the single JSON file that records every identifier the
//! scraper has ever accepted. It provides:
//!
//! - **Lazy creation**: a default record is written on first load
//! - **Atomic saves**: records are written to a temporary sibling and renamed
//! - **Corruption recovery**: malformed files are moved to a backup path and
//!   replaced by a fresh default record
//! - **Backfill**: records missing fields are completed and their derived
//!   counters recomputed once, at load time
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── metadata.json          # The tracking record
//! └── metadata.backup.json   # Last corrupted or reset record
//! ```
//!
//! ## Failure Semantics
//!
//! OS-level I/O errors propagate as [`TrackError::Io`]. Corruption never
//! reaches the caller: it is logged at `warn` level and recovered.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scrapetrack::TrackingStore;
//!
//! # fn example() -> scrapetrack::Result<()> {
//! let store = TrackingStore::new("data/metadata.json");
//! let mut record = store.load()?;
//! record.video_ids.insert("dQw4w9WgXcQ".to_string());
//! record.recompute_stats(store.docs_prefix());
//! store.save(&mut record)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TrackError};
use crate::types::{TrackingRecord, DEFAULT_DOCS_PREFIX, SCHEMA_VERSION};
use crate::utils;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace, warn};

/// File-backed store for the [`TrackingRecord`]
///
/// The store is constructed with an explicit path; there is no process-wide
/// default. Components borrow it, so tests can run any number of isolated
/// stores side by side.
///
/// Read-modify-write sequences issued through one `TrackingStore` value are
/// serialised by an internal mutex. Separate processes are not coordinated;
/// the deployment runs a single writer at a time.
pub struct TrackingStore {
    /// Path of the tracking record
    path: PathBuf,
    /// Where corrupted or reset records are moved
    backup_path: PathBuf,
    /// Namespace prefix identifying documentation keys
    docs_prefix: String,
    /// Serialises load-mutate-save sequences
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for TrackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingStore")
            .field("path", &self.path)
            .field("backup_path", &self.backup_path)
            .field("docs_prefix", &self.docs_prefix)
            .finish()
    }
}

/// Default backup location: `<stem>.backup.<ext>` next to the record
///
/// `data/metadata.json` becomes `data/metadata.backup.json`.
pub fn default_backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "metadata".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}.backup.{}", stem, ext.to_string_lossy()),
        None => format!("{}.backup", stem),
    };
    path.with_file_name(name)
}

impl TrackingStore {
    /// Create a store for the record at `path`
    ///
    /// Nothing is read or written until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = default_backup_path(&path);
        Self {
            path,
            backup_path,
            docs_prefix: DEFAULT_DOCS_PREFIX.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Override the backup location
    pub fn with_backup_path(mut self, backup_path: impl Into<PathBuf>) -> Self {
        self.backup_path = backup_path.into();
        self
    }

    /// Override the documentation namespace prefix
    pub fn with_docs_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.docs_prefix = prefix.into();
        self
    }

    /// Path of the tracking record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the backup record
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Documentation namespace prefix
    pub fn docs_prefix(&self) -> &str {
        &self.docs_prefix
    }

    /// Load the record, creating or recovering it as needed
    ///
    /// - Missing file: a default record is created, saved and returned.
    /// - Corrupted file: renamed to the backup path, a warning is logged and a
    ///   fresh default record is saved and returned.
    ///
    /// # Errors
    ///
    /// - [`TrackError::Io`] if the file or its directory cannot be accessed
    pub fn load(&self) -> Result<TrackingRecord> {
        let _guard = self.write_lock.lock();
        self.load_locked()
    }

    /// Save the record atomically
    ///
    /// Sets `last_updated` to the current UTC time before writing. The stamp
    /// never moves backwards relative to the value already on the record.
    pub fn save(&self, record: &mut TrackingRecord) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.save_locked(record)
    }

    /// Back up the current record (if any) and replace it with defaults
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn reset(&self) -> Result<TrackingRecord> {
        let _guard = self.write_lock.lock();

        if self.path.exists() {
            fs::copy(&self.path, &self.backup_path)?;
            info!("Backed up tracking record to {:?}", self.backup_path);
        }

        let mut record = TrackingRecord::default();
        self.save_locked(&mut record)?;
        info!("Tracking record reset to defaults");
        Ok(record)
    }

    /// Run a load-mutate-save round trip under the store lock
    ///
    /// The closure returns its result and whether the record was modified.
    /// The record is only written back when it was.
    pub fn modify<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TrackingRecord) -> (T, bool),
    {
        let _guard = self.write_lock.lock();
        let mut record = self.load_locked()?;
        let (result, dirty) = f(&mut record);
        if dirty {
            self.save_locked(&mut record)?;
        }
        Ok(result)
    }

    /// Read and validate the record on disk without any recovery
    ///
    /// Returns `Ok(None)` when no record exists yet and
    /// [`TrackError::Corrupted`] when the file is not a valid record.
    pub fn inspect(&self) -> Result<Option<TrackingRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let text = String::from_utf8(bytes)
            .map_err(|e| TrackError::corrupted(&self.path, format!("not valid UTF-8: {}", e)))?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| TrackError::corrupted(&self.path, format!("not valid JSON: {}", e)))?;

        if !value.is_object() {
            return Err(TrackError::corrupted(
                &self.path,
                "top-level value is not an object",
            ));
        }

        let record: TrackingRecord = serde_json::from_value(value)
            .map_err(|e| TrackError::corrupted(&self.path, format!("unexpected shape: {}", e)))?;

        Ok(Some(self.migrate(record)))
    }

    fn load_locked(&self) -> Result<TrackingRecord> {
        match self.inspect() {
            Ok(Some(record)) => {
                trace!("Loaded tracking record from {:?}", self.path);
                Ok(record)
            }
            Ok(None) => {
                debug!("No tracking record at {:?}, creating defaults", self.path);
                let mut record = TrackingRecord::default();
                self.save_locked(&mut record)?;
                Ok(record)
            }
            Err(err) if err.is_corruption() => {
                warn!("Corrupted tracking record: {}", err);
                fs::rename(&self.path, &self.backup_path)?;
                warn!("Backed up corrupted tracking record to {:?}", self.backup_path);

                let mut record = TrackingRecord::default();
                self.save_locked(&mut record)?;
                Ok(record)
            }
            Err(err) => Err(err),
        }
    }

    fn save_locked(&self, record: &mut TrackingRecord) -> Result<()> {
        let now = utils::now();
        record.last_updated = Some(match record.last_updated {
            Some(previous) if previous > now => previous,
            _ => now,
        });

        let mut json = serde_json::to_string_pretty(record)?;
        json.push('\n');
        utils::atomic_write(&self.path, json.as_bytes())?;

        trace!("Saved tracking record to {:?}", self.path);
        Ok(())
    }

    /// One-time backfill applied to every record read from disk
    fn migrate(&self, mut record: TrackingRecord) -> TrackingRecord {
        if record.schema_version != SCHEMA_VERSION {
            debug!(
                "Migrating tracking record from schema {:?} to {}",
                record.schema_version, SCHEMA_VERSION
            );
            record.schema_version = SCHEMA_VERSION.to_string();
        }

        if !record.stats_consistent(&self.docs_prefix) {
            debug!("Recomputing derived tracking stats");
            record.recompute_stats(&self.docs_prefix);
        }

        for (name, history) in record.doc_versions.iter_mut() {
            let dropped = history.enforce_cap();
            if dropped > 0 {
                debug!("Trimmed {} old history entries of {}", dropped, name);
            }
        }

        record
    }
}
