//! One-time read preparation of shard directories
//!
//! Runs before a shard is first opened. Must be idempotent: the shard
//! cache calls it at most once per path, but a restarted process will
//! call it again on an already-prepared directory.

use super::segment::{part_files, Segment, COMPACTED_PART};
use crate::Result;
use std::path::Path;
use tracing::debug;

/// Hook invoked before a shard directory is opened for reading
pub trait ReadPreparer: Send + Sync {
    /// Tune `path` for read-only access
    ///
    /// # Errors
    /// Failures while rewriting the shard directory
    fn optimize_for_read(&self, path: &Path) -> Result<()>;
}

/// Leaves shard directories untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPreparer;

impl ReadPreparer for NoopPreparer {
    fn optimize_for_read(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Merges multi-part shards into a single `segment.parquet` part.
/// Shards with at most one part are left as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompactingPreparer;

impl ReadPreparer for CompactingPreparer {
    fn optimize_for_read(&self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Ok(());
        }
        let parts = part_files(path)?;
        if parts.len() <= 1 {
            return Ok(());
        }

        debug!(path = %path.display(), parts = parts.len(), "compacting shard parts");
        let merged = Segment::open(path)?;

        let tmp_name = format!("{COMPACTED_PART}.tmp");
        let tmp = merged.write(path, &tmp_name)?;
        for part in &parts {
            std::fs::remove_file(part)?;
        }
        std::fs::rename(tmp, path.join(COMPACTED_PART))?;
        Ok(())
    }
}
