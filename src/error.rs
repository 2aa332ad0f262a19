//! Centralized error types for subjscan.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the subjscan library.
///
/// Errors fall into two tiers: structural failures (an unreadable source
/// root, a broken database) abort the run, while record-level failures (one
/// corrupt message, one undecodable corpus file) are logged and skipped by
/// the pipeline. [`ScanError::is_record_level`] tells the tiers apart.
#[derive(Error, Debug)]
pub enum ScanError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configured source path does not exist or is not a directory.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// Invalid or inconsistent configuration, reported at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory walk failed below a source root.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A single message or message file could not be read or parsed.
    #[error("Unreadable message in '{path}': {reason}")]
    Message { path: PathBuf, reason: String },

    /// A corpus file's bytes are not valid under the configured encoding.
    #[error("'{path}' does not decode as {encoding}")]
    Decode { path: PathBuf, encoding: String },

    /// The external mail index could not be opened or queried.
    #[error("Mail index error: {0}")]
    Index(String),

    /// SQLite error from the persistence layer.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Convenience alias for `Result<T, ScanError>`.
pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the pipeline may log this error and continue with the next
    /// record. Everything else terminates the run.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::Message { .. } | Self::Decode { .. })
    }
}
