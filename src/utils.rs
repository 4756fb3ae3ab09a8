//! Utility functions for scrapetrack
//!
//! This module provides the helpers shared across the library:
//!
//! ### Content Hashing
//! - [`hash_content`]: full SHA-256 digest used for every stored comparison
//! - [`display_hash`]: truncated digest for human-facing output only
//!
//! ### File Operations
//! - [`atomic_write`]: write-to-temp-then-rename so readers never observe a
//!   partially written file
//!
//! ### Timestamps
//! - [`parse_timestamp`]: lenient parsing of the date formats scraped feeds use
//! - [`is_newer_than`]: lookback window checks
//!
//! ## Example Usage
//!
//! ```rust
//! use scrapetrack::utils::{hash_content, display_hash};
//!
//! let hash = hash_content("# Getting started");
//! assert_eq!(hash.len(), 64);
//! assert_eq!(display_hash(&hash).len(), 12);
//! ```

use crate::error::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Number of hex characters shown by [`display_hash`]
pub const DISPLAY_HASH_LEN: usize = 12;

/// Hash text content using SHA-256
///
/// Hashes the UTF-8 bytes of `content` and returns the digest as a
/// 64-character lowercase hexadecimal string. The function is pure and
/// deterministic across runs and processes.
///
/// # Example
///
/// ```rust
/// use scrapetrack::utils::hash_content;
///
/// let a = hash_content("v1");
/// let b = hash_content("v1");
/// assert_eq!(a, b);
/// assert_ne!(a, hash_content("v2"));
/// ```
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shorten a digest for display
///
/// Never compare the result for equality; stored hashes are always full length.
pub fn display_hash(hash: &str) -> &str {
    hash.get(..DISPLAY_HASH_LEN).unwrap_or(hash)
}

/// Atomic file write (write to temp file then rename)
///
/// Writes `content` to a `.tmp` sibling of `path` and renames it over the
/// target. The parent directory is created if needed. A reader either sees
/// the previous file or the complete new one.
///
/// # Errors
///
/// - [`TrackError::Io`](crate::TrackError::Io) if the directory cannot be
///   created, the temporary file cannot be written, or the rename fails
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content)?;

    if let Err(err) = fs::rename(&temp_path, path) {
        fs::remove_file(&temp_path).ok();
        return Err(err.into());
    }

    trace!("Atomically wrote {} bytes to {:?}", content.len(), path);
    Ok(())
}

/// Sibling path used while writing `path`
///
/// The `.tmp` suffix is appended, so the result never equals `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Current time in UTC
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a timestamp as produced by feeds and by this crate
///
/// Accepts RFC 3339 (with `Z` or an offset), RFC 2822 as used by RSS
/// `pubDate`, a naive `YYYY-MM-DDTHH:MM:SS` (treated as UTC) and a bare
/// `YYYY-MM-DD` date (midnight UTC). Returns `None` for anything else,
/// including the empty string.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

/// Check whether a timestamp string falls within the last `days` days
///
/// Unparseable or empty timestamps are never considered recent.
pub fn is_newer_than(value: &str, days: u32) -> bool {
    match parse_timestamp(value) {
        Some(ts) => now() - ts < Duration::days(i64::from(days)),
        None => false,
    }
}

/// Truncate text to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
