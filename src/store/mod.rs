//! Sorted store boundary
//!
//! Everything above this module sees a shard as an ordered byte-key map
//! with positioned cursors. `Segment` is the concrete store: an immutable
//! sorted table loaded from Parquet part files.
//!
//! ## Cursor protocol
//!
//! ```text
//! new cursor ── seek_* ──> positioned ── next() ──> positioned | exhausted
//!                              │
//!                          current() = Some((key, value))
//! ```
//!
//! A fresh cursor is unpositioned (`current() == None`) until one of the
//! `seek_*` methods is called.

mod prepare;
mod segment;

pub use prepare::{CompactingPreparer, NoopPreparer, ReadPreparer};
pub use segment::{part_files, Segment, SegmentCursor, COMPACTED_PART, PART_EXTENSION};

use crate::Result;

/// Positioned, forward-moving view over a sorted store
pub trait Cursor: Send {
    /// Position at the smallest key
    ///
    /// # Errors
    /// Backend read failures
    fn seek_to_first(&mut self) -> Result<()>;

    /// Position at the largest key
    ///
    /// # Errors
    /// Backend read failures
    fn seek_to_last(&mut self) -> Result<()>;

    /// Position at the smallest key `>= key`
    ///
    /// # Errors
    /// Backend read failures
    fn seek(&mut self, key: &[u8]) -> Result<()>;

    /// Position at the largest key `<= key`
    ///
    /// # Errors
    /// Backend read failures
    fn seek_for_prev(&mut self, key: &[u8]) -> Result<()>;

    /// Entry at the current position, `None` when unpositioned or exhausted
    fn current(&self) -> Option<(&[u8], &[u8])>;

    /// Move to the next larger key
    ///
    /// # Errors
    /// Backend read failures
    fn next(&mut self) -> Result<()>;
}

/// Read-only ordered key-value store
pub trait SortedStore: Send + Sync {
    /// Value stored under `key`
    ///
    /// # Errors
    /// `Error::NotFound` if the key is absent
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// New unpositioned cursor
    ///
    /// # Errors
    /// Backend failures while assembling the cursor
    fn cursor(&self) -> Result<Box<dyn Cursor>>;
}
