//! Union store: many shards presented as one ordered key space
//!
//! **Read-only design**: shards are sealed (chunks) or written by another
//! process (index). The union never writes; it only decides which shard
//! answers for which key.
//!
//! ## Shard selection
//!
//! - index present: load the index plus the chunks named under `progress/`
//! - index missing or unreadable: load every chunk under `chunks/`
//!
//! The index owns the empty (default) domain and shadows chunks on equal
//! keys. Chunk domains are pairwise disjoint.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shardview::union::UnionStore;
//!
//! let store = UnionStore::builder("/data/repo", "meta").build()?;
//! for item in store.items()? {
//!     let (key, value) = item?;
//!     println!("{} bytes -> {} bytes", key.len(), value.len());
//! }
//! # Ok::<(), shardview::Error>(())
//! ```

mod iter;
mod merge;
mod view;

pub use iter::{Items, Keys, Values};
pub use merge::UnionCursor;
pub use view::PrefixView;

use crate::clock::{Clock, SystemClock};
use crate::encoding::encode_names;
use crate::shard::{
    chunk_domain, chunks_scope, DirLister, FsLister, ListingCache, SegmentOpener, Shard,
    ShardCache, ShardKind, ShardOpener, ShardSet, CHUNKS_DIR, INDEX_DIR, PROGRESS_DIR,
};
use crate::store::{CompactingPreparer, Cursor, NoopPreparer, ReadPreparer, SortedStore};
use crate::{Error, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time-to-live of directory listings and union views
pub const DEFAULT_TTL: Duration = Duration::from_millis(100);

/// Union store tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnionOptions {
    /// How long a directory listing is reused
    #[serde(with = "duration_ms")]
    pub listing_ttl: Duration,
    /// How long a resolved shard set is reused before re-resolving
    #[serde(with = "duration_ms")]
    pub view_ttl: Duration,
    /// Run the read preparer on each shard before first open
    pub prepare_for_read: bool,
}

impl Default for UnionOptions {
    fn default() -> Self {
        Self {
            listing_ttl: DEFAULT_TTL,
            view_ttl: DEFAULT_TTL,
            prepare_for_read: true,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

struct CachedView {
    built_at: Instant,
    shards: Arc<ShardSet>,
}

/// Read-only union of one container's shards
pub struct UnionStore {
    root: PathBuf,
    name: String,
    options: UnionOptions,
    clock: Arc<dyn Clock>,
    listing: Arc<ListingCache>,
    handles: Arc<ShardCache>,
    view: RwLock<Option<CachedView>>,
}

impl UnionStore {
    /// Start building a union over `<root>/<name>`
    #[must_use]
    pub fn builder(root: impl Into<PathBuf>, name: impl Into<String>) -> UnionStoreBuilder {
        UnionStoreBuilder::new(root.into(), name.into())
    }

    /// Container name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container directory (`<root>/<name>`)
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &UnionOptions {
        &self.options
    }

    /// Current shard set, re-resolved once the view TTL has expired
    ///
    /// # Errors
    /// Listing failures or a chunk shard that fails to open
    pub fn shards(&self) -> Result<Arc<ShardSet>> {
        let now = self.clock.now();
        {
            let cached = self.view.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(view) = cached.as_ref() {
                if now.duration_since(view.built_at) < self.options.view_ttl {
                    return Ok(Arc::clone(&view.shards));
                }
            }
        }

        let fresh = Arc::new(self.resolve()?);
        let mut cached = self.view.write().unwrap_or_else(PoisonError::into_inner);
        let changed = cached
            .as_ref()
            .map_or(true, |prev| !prev.shards.same_shards(&fresh));
        if changed {
            debug!(
                container = %self.name,
                shards = ?fresh.names(),
                "union view rebuilt"
            );
        }
        *cached = Some(CachedView {
            built_at: now,
            shards: Arc::clone(&fresh),
        });
        Ok(fresh)
    }

    /// Drop the cached shard set so the next access re-resolves it
    pub fn invalidate(&self) {
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// New unpositioned merge cursor over the current shard set
    ///
    /// # Errors
    /// Failures resolving the shard set or creating shard cursors
    pub fn union_cursor(&self) -> Result<UnionCursor> {
        UnionCursor::new(self.shards()?)
    }

    /// All entries in key order
    ///
    /// # Errors
    /// Failures resolving the shard set or positioning cursors
    pub fn items(&self) -> Result<Items> {
        let mut items = Items::new(Box::new(self.union_cursor()?));
        items.seek_to_first()?;
        Ok(items)
    }

    /// All keys in order
    ///
    /// # Errors
    /// Failures resolving the shard set or positioning cursors
    pub fn keys(&self) -> Result<Keys> {
        let mut keys = Keys::new(Box::new(self.union_cursor()?));
        keys.items_mut().seek_to_first()?;
        Ok(keys)
    }

    /// All values in key order
    ///
    /// # Errors
    /// Failures resolving the shard set or positioning cursors
    pub fn values(&self) -> Result<Values> {
        let mut values = Values::new(Box::new(self.union_cursor()?));
        values.items_mut().seek_to_first()?;
        Ok(values)
    }

    /// Entries with key `>= from`, in key order
    ///
    /// # Errors
    /// Failures resolving the shard set or positioning cursors
    pub fn items_from(&self, from: &[u8]) -> Result<Items> {
        let mut items = Items::new(Box::new(self.union_cursor()?));
        items.seek(from)?;
        Ok(items)
    }

    /// Container view below `prefix`.
    ///
    /// When `prefix` is exactly a loaded chunk's domain the view reads that
    /// shard directly; otherwise it reads through the union.
    ///
    /// # Errors
    /// Failures resolving the shard set
    pub fn view(self: &Arc<Self>, prefix: &[u8]) -> Result<PrefixView> {
        let shards = self.shards()?;
        let store: Arc<dyn SortedStore> = match shards.by_domain(prefix) {
            Some(shard) if !prefix.is_empty() => Arc::clone(shard.handle()),
            _ => Arc::clone(self) as Arc<dyn SortedStore>,
        };
        Ok(PrefixView::new(store, prefix))
    }

    fn resolve(&self) -> Result<ShardSet> {
        let index_path = self.root.join(INDEX_DIR);
        let index_memo = encode_names(&[&self.name, INDEX_DIR]);
        let index = match self.handles.get_or_refresh(&index_memo, &index_path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(path = %index_path.display(), error = %e, "no index detected");
                None
            }
        };

        let selector = if index.is_some() { PROGRESS_DIR } else { CHUNKS_DIR };
        let names = self.listing.list(&self.root.join(selector))?;

        let mut shards = Vec::with_capacity(names.len() + 1);
        let mut live = FxHashSet::default();
        for (rank, shard_name) in names.iter().enumerate() {
            let domain = chunk_domain(&self.name, shard_name);
            let path = self.root.join(CHUNKS_DIR).join(shard_name);
            let handle = self.handles.get_or_open(&domain, &path)?;
            live.insert(domain.clone());
            shards.push(Shard::new(
                shard_name.as_str(),
                ShardKind::Chunk,
                domain,
                rank + 1,
                handle,
            ));
        }
        self.handles.retain_live(&chunks_scope(&self.name), &live);

        if let Some(handle) = index {
            shards.push(Shard::new(INDEX_DIR, ShardKind::Index, Vec::new(), 0, handle));
        }
        Ok(ShardSet::new(shards))
    }
}

impl SortedStore for UnionStore {
    /// Index first, then the chunk owning `key`'s domain.
    ///
    /// This deliberately differs from resolver order (chunks before the
    /// index) so that a key shadowed during iteration reads the same value
    /// here.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let shards = self.shards()?;

        if let Some(index) = shards.index() {
            match index.handle().get(key) {
                Err(e) if e.is_not_found() => {}
                found => return found,
            }
        }
        let owner = shards
            .chunks()
            .find(|shard| key.starts_with(shard.domain()))
            .map(|shard| Arc::clone(shard.handle()));
        owner.map_or_else(|| Err(Error::key_not_found(key)), |handle| handle.get(key))
    }

    fn cursor(&self) -> Result<Box<dyn Cursor>> {
        Ok(Box::new(self.union_cursor()?))
    }
}

impl std::fmt::Debug for UnionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionStore")
            .field("root", &self.root)
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for `UnionStore`
pub struct UnionStoreBuilder {
    root: PathBuf,
    name: String,
    options: UnionOptions,
    clock: Option<Arc<dyn Clock>>,
    lister: Option<Arc<dyn DirLister>>,
    opener: Option<Arc<dyn ShardOpener>>,
    preparer: Option<Arc<dyn ReadPreparer>>,
    listing: Option<Arc<ListingCache>>,
    handles: Option<Arc<ShardCache>>,
}

impl UnionStoreBuilder {
    fn new(root: PathBuf, name: String) -> Self {
        Self {
            root,
            name,
            options: UnionOptions::default(),
            clock: None,
            lister: None,
            opener: None,
            preparer: None,
            listing: None,
            handles: None,
        }
    }

    /// Set options
    #[must_use]
    pub fn options(mut self, options: UnionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the time source for TTL expiry
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the directory lister (ignored when a listing cache is supplied)
    #[must_use]
    pub fn lister(mut self, lister: Arc<dyn DirLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    /// Set the shard opener (ignored when a shard cache is supplied)
    #[must_use]
    pub fn opener(mut self, opener: Arc<dyn ShardOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Set the read preparer (ignored when a shard cache is supplied)
    #[must_use]
    pub fn preparer(mut self, preparer: Arc<dyn ReadPreparer>) -> Self {
        self.preparer = Some(preparer);
        self
    }

    /// Share an existing listing cache
    #[must_use]
    pub fn listing_cache(mut self, listing: Arc<ListingCache>) -> Self {
        self.listing = Some(listing);
        self
    }

    /// Share an existing shard handle cache
    #[must_use]
    pub fn shard_cache(mut self, handles: Arc<ShardCache>) -> Self {
        self.handles = Some(handles);
        self
    }

    /// Build the union store
    ///
    /// # Errors
    /// `Error::InvalidArgument` if the container name is empty
    pub fn build(self) -> Result<UnionStore> {
        if self.name.is_empty() {
            return Err(Error::InvalidArgument(
                "container name must not be empty".to_string(),
            ));
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let options = self.options;

        let listing = self.listing.unwrap_or_else(|| {
            let lister = self.lister.unwrap_or_else(|| Arc::new(FsLister));
            Arc::new(ListingCache::new(lister, Arc::clone(&clock), options.listing_ttl))
        });
        let handles = self.handles.unwrap_or_else(|| {
            let opener = self.opener.unwrap_or_else(|| Arc::new(SegmentOpener));
            let preparer = self.preparer.unwrap_or_else(|| -> Arc<dyn ReadPreparer> {
                if options.prepare_for_read {
                    Arc::new(CompactingPreparer)
                } else {
                    Arc::new(NoopPreparer)
                }
            });
            Arc::new(ShardCache::new(opener, preparer))
        });

        Ok(UnionStore {
            root: self.root.join(&self.name),
            name: self.name,
            options,
            clock,
            listing,
            handles,
            view: RwLock::new(None),
        })
    }
}

impl std::fmt::Debug for UnionStoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionStoreBuilder")
            .field("root", &self.root)
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
