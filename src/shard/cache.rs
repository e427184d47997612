//! Memoized shard handles
//!
//! One sorted-store handle per shard memo key (the shard's domain prefix
//! for chunks). Handles are shared by every union view and cursor that
//! references the shard and are dropped only when evicted.
//!
//! Shards that another process keeps writing (the index) are opened through
//! `get_or_refresh`, which reuses the handle until the shard's part files
//! change on disk.

use crate::store::{part_files, ReadPreparer, Segment, SortedStore};
use crate::Result;
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use tracing::debug;

/// Opens the sorted store rooted at a shard directory
pub trait ShardOpener: Send + Sync {
    /// Open `path` read-only
    ///
    /// # Errors
    /// `Error::BackendUnavailable` when the shard cannot be opened
    fn open(&self, path: &Path) -> Result<Arc<dyn SortedStore>>;
}

/// Opens shard directories as Parquet-backed `Segment`s
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentOpener;

impl ShardOpener for SegmentOpener {
    fn open(&self, path: &Path) -> Result<Arc<dyn SortedStore>> {
        Ok(Arc::new(Segment::open(path)?))
    }
}

/// Name, size and modification time of every part file of a shard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartStamp(Vec<(PathBuf, u64, Option<SystemTime>)>);

impl PartStamp {
    /// Stamp the parts currently under `dir`
    ///
    /// # Errors
    /// IO failures, including a missing `dir`
    pub fn read(dir: &Path) -> Result<Self> {
        let mut parts = Vec::new();
        for path in part_files(dir)? {
            let meta = std::fs::metadata(&path)?;
            parts.push((path, meta.len(), meta.modified().ok()));
        }
        Ok(Self(parts))
    }

    /// Number of part files
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the shard has no part files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct Cached {
    handle: Arc<dyn SortedStore>,
    /// `None` for handles that are never refreshed
    stamp: Option<PartStamp>,
}

/// Process-wide shard handle cache
pub struct ShardCache {
    opener: Arc<dyn ShardOpener>,
    preparer: Arc<dyn ReadPreparer>,
    handles: DashMap<Vec<u8>, Cached>,
    prepared: Mutex<FxHashSet<PathBuf>>,
}

impl ShardCache {
    /// Create an empty cache
    #[must_use]
    pub fn new(opener: Arc<dyn ShardOpener>, preparer: Arc<dyn ReadPreparer>) -> Self {
        Self {
            opener,
            preparer,
            handles: DashMap::new(),
            prepared: Mutex::new(FxHashSet::default()),
        }
    }

    /// Cached handle for `memo`, opening `path` on first use
    ///
    /// # Errors
    /// Preparation or open failures; nothing is cached on failure
    pub fn get_or_open(&self, memo: &[u8], path: &Path) -> Result<Arc<dyn SortedStore>> {
        if let Some(handle) = self.handles.get(memo).map(|c| Arc::clone(&c.handle)) {
            return Ok(handle);
        }
        self.prepare_once(path)?;
        let handle = self.open(path)?;
        let entry = self.handles.entry(memo.to_vec()).or_insert(Cached {
            handle,
            stamp: None,
        });
        Ok(Arc::clone(&entry.handle))
    }

    /// Cached handle for `memo` while `path`'s part files are unchanged,
    /// otherwise a freshly opened one that replaces it
    ///
    /// # Errors
    /// Preparation, stamping or open failures; the stale entry is evicted
    /// on failure
    pub fn get_or_refresh(&self, memo: &[u8], path: &Path) -> Result<Arc<dyn SortedStore>> {
        let refreshed = self.refresh(memo, path);
        if refreshed.is_err() {
            self.handles.remove(memo);
        }
        refreshed
    }

    fn refresh(&self, memo: &[u8], path: &Path) -> Result<Arc<dyn SortedStore>> {
        self.prepare_once(path)?;
        let stamp = PartStamp::read(path)?;
        let current = self
            .handles
            .get(memo)
            .filter(|c| c.stamp.as_ref() == Some(&stamp))
            .map(|c| Arc::clone(&c.handle));
        if let Some(handle) = current {
            return Ok(handle);
        }

        let handle = self.open(path)?;
        self.handles.insert(
            memo.to_vec(),
            Cached {
                handle: Arc::clone(&handle),
                stamp: Some(stamp),
            },
        );
        Ok(handle)
    }

    /// Evict handles under `scope` whose memo key is not in `live`
    pub fn retain_live(&self, scope: &[u8], live: &FxHashSet<Vec<u8>>) {
        self.handles
            .retain(|memo, _| !memo.starts_with(scope) || live.contains(memo));
    }

    /// Whether a handle is cached under `memo`
    #[must_use]
    pub fn contains(&self, memo: &[u8]) -> bool {
        self.handles.contains_key(memo)
    }

    /// Number of cached handles
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handle is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn open(&self, path: &Path) -> Result<Arc<dyn SortedStore>> {
        debug!(path = %path.display(), "opening shard");
        self.opener.open(path)
    }

    fn prepare_once(&self, path: &Path) -> Result<()> {
        let mut prepared = self.prepared.lock().unwrap_or_else(PoisonError::into_inner);
        if prepared.contains(path) {
            return Ok(());
        }
        self.preparer.optimize_for_read(path)?;
        prepared.insert(path.to_path_buf());
        Ok(())
    }
}

impl std::fmt::Debug for ShardCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardCache")
            .field("handles", &self.handles.len())
            .finish_non_exhaustive()
    }
}
