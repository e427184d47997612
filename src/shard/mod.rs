//! Shards and their on-disk layout
//!
//! ```text
//! <root>/<container>/
//!     index/            optional, append-only, overlaps every chunk domain
//!     chunks/<name>/    sealed shards, pairwise disjoint domains
//!     progress/<name>   chunk names still in progress while an index exists
//! ```

mod cache;
mod listing;

pub use cache::{PartStamp, SegmentOpener, ShardCache, ShardOpener};
pub use listing::{DirLister, FsLister, ListingCache};

use crate::encoding::encode_names;
use crate::store::SortedStore;
use std::fmt;
use std::sync::Arc;

/// Directory holding the index shard
pub const INDEX_DIR: &str = "index";
/// Directory holding sealed chunk shards
pub const CHUNKS_DIR: &str = "chunks";
/// Directory listing in-progress chunk names
pub const PROGRESS_DIR: &str = "progress";

/// Role of a shard in the union
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardKind {
    /// Default domain, shadows chunks on duplicate keys
    Index,
    /// Sealed, domain-scoped segment
    Chunk,
}

/// Key domain owned by chunk `shard` of `container`
#[must_use]
pub fn chunk_domain(container: &str, shard: &str) -> Vec<u8> {
    encode_names(&[container, CHUNKS_DIR, shard])
}

/// Prefix shared by every chunk domain of `container`
#[must_use]
pub fn chunks_scope(container: &str) -> Vec<u8> {
    encode_names(&[container, CHUNKS_DIR])
}

/// One opened shard of a union view
#[derive(Clone)]
pub struct Shard {
    name: String,
    kind: ShardKind,
    domain: Arc<[u8]>,
    priority: usize,
    handle: Arc<dyn SortedStore>,
}

impl Shard {
    /// Assemble a shard record
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: ShardKind,
        domain: impl Into<Arc<[u8]>>,
        priority: usize,
        handle: Arc<dyn SortedStore>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            domain: domain.into(),
            priority,
            handle,
        }
    }

    /// Shard name (directory name under `chunks/`, or `index`)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shard role
    #[must_use]
    pub const fn kind(&self) -> ShardKind {
        self.kind
    }

    /// Declared domain prefix; empty for the index
    #[must_use]
    pub fn domain(&self) -> &[u8] {
        &self.domain
    }

    /// Shared handle to the domain prefix
    #[must_use]
    pub fn domain_arc(&self) -> Arc<[u8]> {
        Arc::clone(&self.domain)
    }

    /// Merge rank; lower wins same-key ties
    #[must_use]
    pub const fn priority(&self) -> usize {
        self.priority
    }

    /// Opened sorted store
    #[must_use]
    pub fn handle(&self) -> &Arc<dyn SortedStore> {
        &self.handle
    }
}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("domain", &crate::error::hex(&self.domain))
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// The shards of one union view, in resolver order (chunks, then index)
#[derive(Debug, Clone, Default)]
pub struct ShardSet {
    shards: Vec<Shard>,
}

impl ShardSet {
    /// Build from shards in resolver order
    #[must_use]
    pub fn new(shards: Vec<Shard>) -> Self {
        Self { shards }
    }

    /// All shards in resolver order
    pub fn iter(&self) -> impl Iterator<Item = &Shard> {
        self.shards.iter()
    }

    /// Chunk shards in resolver order
    pub fn chunks(&self) -> impl Iterator<Item = &Shard> {
        self.shards.iter().filter(|s| s.kind == ShardKind::Chunk)
    }

    /// The index shard, if one was loaded
    #[must_use]
    pub fn index(&self) -> Option<&Shard> {
        self.shards.iter().find(|s| s.kind == ShardKind::Index)
    }

    /// Chunk shard whose domain is exactly `domain`
    #[must_use]
    pub fn by_domain(&self, domain: &[u8]) -> Option<&Shard> {
        self.chunks().find(|s| s.domain() == domain)
    }

    /// Number of shards
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Whether no shard is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Shard names in resolver order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.shards.iter().map(Shard::name).collect()
    }

    /// Whether two sets hold the same shards with the same domains and handles
    #[must_use]
    pub fn same_shards(&self, other: &Self) -> bool {
        self.shards.len() == other.shards.len()
            && self.shards.iter().zip(&other.shards).all(|(a, b)| {
                a.name == b.name && a.domain == b.domain && Arc::ptr_eq(&a.handle, &b.handle)
            })
    }
}
