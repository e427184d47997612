//! Error types for shardview
//!
//! End-of-data is not an error: iterators return `None` and cursors report
//! no current entry. `NotFound` is reserved for "this item does not exist".

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Shardview error types
#[derive(Error, Debug)]
pub enum Error {
    /// Key, index or array boundary does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an argument outside the supported domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation exists in the interface but is not implemented for this input
    #[error("Not implemented: {0}")]
    Unsupported(String),

    /// A shard's sorted store could not be opened
    #[error("Backend unavailable at {path}: {reason}")]
    BackendUnavailable {
        /// Shard directory that failed to open
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Write attempted through a read-only view
    #[error("Read-only: {0}")]
    ReadOnly(String),

    /// Dense materialization did not produce an array
    #[error("Not an array: {0}")]
    NotAnArray(String),

    /// Value does not match the declared element type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared or required type
        expected: String,
        /// Type actually present
        found: String,
    },

    /// Malformed encoded path or key
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Value (de)serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means "the item does not exist"
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn key_not_found(key: &[u8]) -> Self {
        Self::NotFound(format!("key {}", hex(key)))
    }
}

/// Lowercase hex rendering for keys in messages and logs
pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
