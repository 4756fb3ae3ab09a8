//! Error types for the scrapetrack library
//!
//! This module defines all error types that can occur while tracking scraped
//! content. Errors are split into two families:
//!
//! - **Fatal I/O errors**: the tracking record cannot be read or written at
//!   the OS level. These always propagate to the caller.
//! - **Corruption**: the record exists but is not a well-formed tracking
//!   record. The store recovers from these on its own (backup + reset), so
//!   callers only see them when inspecting a file explicitly.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the scrapetrack library
pub type Result<T> = std::result::Result<T, TrackError>;

/// Main error type for all scrapetrack operations
#[derive(Debug, Error)]
pub enum TrackError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tracking record on disk is not a valid record
    #[error("Corrupted tracking record at {path:?}: {reason}")]
    Corrupted {
        /// Path of the offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Caller supplied content the core cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A document has no version history
    #[error("No version history for document: {0}")]
    UnknownDocument(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// UTF-8 conversion error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackError {
    /// Create a corruption error for the given file
    pub fn corrupted(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TrackError::Corrupted {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error with a custom message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TrackError::InvalidInput(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        TrackError::Internal(msg.into())
    }

    /// Check if this error indicates a malformed tracking record
    pub fn is_corruption(&self) -> bool {
        matches!(self, TrackError::Corrupted { .. })
    }

    /// Check if this error came from the operating system
    pub fn is_io(&self) -> bool {
        matches!(self, TrackError::Io(_) | TrackError::WalkDir(_))
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            TrackError::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                format!("{}. Check permissions on the data directory.", self)
            }
            TrackError::Corrupted { path, .. } => {
                format!(
                    "Tracking record {:?} is corrupted. It will be backed up and reset on next load.",
                    path
                )
            }
            TrackError::UnknownDocument(name) => {
                format!("No history for '{}'. Use 'status' to see tracked documents.", name)
            }
            _ => self.to_string(),
        }
    }
}
