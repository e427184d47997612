//! Shadow-aware k-way merge over shard cursors
//!
//! Every shard contributes one candidate (its cursor's current key) to a
//! min-heap ordered by `(key, priority)`. The heap top is the union's
//! current entry. Advancing pops it, moves that shard forward, then drains
//! every other candidate sitting on the same key: those are shadowed
//! duplicates from lower-precedence shards.
//!
//! ```text
//!   index  (p0): 2:y2  3:w
//!   chunk a(p1): 1:x   2:y        ──merge──>  1:x  2:y2  3:w  5:z
//!   chunk b(p2): 5:z
//! ```

use crate::error::hex;
use crate::shard::ShardSet;
use crate::store::Cursor;
use crate::Result;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Heap record: a shard's current key and its merge rank
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    key: Vec<u8>,
    priority: usize,
    slot: usize,
}

/// Whether `candidate` is hidden by an entry just emitted under `emitted`
///
/// Only exact key matches are shadowed. A candidate with a different key is
/// never consumed, so keys crossing from one domain into another are always
/// emitted by their own shard.
fn is_shadowed(emitted: &[u8], candidate: &Candidate) -> bool {
    candidate.key == emitted
}

struct Source {
    cursor: Box<dyn Cursor>,
    priority: usize,
    domain: Arc<[u8]>,
}

/// Cursor presenting a shard set as one ordered store
pub struct UnionCursor {
    sources: Vec<Source>,
    heap: BinaryHeap<Reverse<Candidate>>,
    _shards: Arc<ShardSet>,
}

impl UnionCursor {
    /// Create an unpositioned cursor over every shard in `shards`
    ///
    /// # Errors
    /// Failures creating a shard cursor
    pub fn new(shards: Arc<ShardSet>) -> Result<Self> {
        let sources = shards
            .iter()
            .map(|shard| {
                Ok(Source {
                    cursor: shard.handle().cursor()?,
                    priority: shard.priority(),
                    domain: shard.domain_arc(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sources,
            heap: BinaryHeap::new(),
            _shards: shards,
        })
    }

    /// Domain of the shard that owns the current entry
    #[must_use]
    pub fn current_domain(&self) -> Option<&[u8]> {
        self.heap
            .peek()
            .map(|Reverse(top)| &*self.sources[top.slot].domain)
    }

    /// Rebuild the heap from each shard's position; returns the largest key seen
    fn rebuild_heap(&mut self) -> Option<Vec<u8>> {
        self.heap.clear();
        let mut max_key: Option<Vec<u8>> = None;

        for (slot, source) in self.sources.iter().enumerate() {
            let Some((key, _)) = source.cursor.current() else {
                continue;
            };
            if max_key.as_deref().map_or(true, |max| key > max) {
                max_key = Some(key.to_vec());
            }
            self.heap.push(Reverse(Candidate {
                key: key.to_vec(),
                priority: source.priority,
                slot,
            }));
        }
        max_key
    }

    fn for_each_source<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut dyn Cursor) -> Result<()>,
    {
        for source in &mut self.sources {
            f(source.cursor.as_mut())?;
        }
        Ok(())
    }

    /// Move shard `slot` forward and re-enter it into the heap if it has data
    fn advance_source(&mut self, slot: usize) -> Result<()> {
        let source = &mut self.sources[slot];
        source.cursor.next()?;
        if let Some((key, _)) = source.cursor.current() {
            self.heap.push(Reverse(Candidate {
                key: key.to_vec(),
                priority: source.priority,
                slot,
            }));
        }
        Ok(())
    }

    /// Consume every candidate shadowed by the entry emitted under `emitted`
    fn drain_shadowed(&mut self, emitted: &[u8]) -> Result<()> {
        loop {
            let slot = match self.heap.peek() {
                Some(Reverse(top)) if is_shadowed(emitted, top) => top.slot,
                _ => return Ok(()),
            };
            self.heap.pop();
            trace!(
                key = %hex(emitted),
                domain = %hex(&self.sources[slot].domain),
                "dropping shadowed entry"
            );
            self.advance_source(slot)?;
        }
    }
}

impl Cursor for UnionCursor {
    fn seek_to_first(&mut self) -> Result<()> {
        self.for_each_source(|c| c.seek_to_first())?;
        self.rebuild_heap();
        Ok(())
    }

    fn seek_to_last(&mut self) -> Result<()> {
        self.for_each_source(|c| c.seek_to_last())?;
        match self.rebuild_heap() {
            Some(max_key) => self.seek(&max_key),
            None => Ok(()),
        }
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.for_each_source(|c| c.seek(key))?;
        self.rebuild_heap();
        Ok(())
    }

    fn seek_for_prev(&mut self, key: &[u8]) -> Result<()> {
        self.for_each_source(|c| c.seek_for_prev(key))?;
        match self.rebuild_heap() {
            Some(max_key) => self.seek(&max_key),
            None => Ok(()),
        }
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        let Reverse(top) = self.heap.peek()?;
        self.sources[top.slot].cursor.current()
    }

    fn next(&mut self) -> Result<()> {
        let Some(Reverse(emitted)) = self.heap.pop() else {
            return Ok(());
        };
        self.advance_source(emitted.slot)?;
        self.drain_shadowed(&emitted.key)
    }
}

impl fmt::Debug for UnionCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionCursor")
            .field("shards", &self.sources.len())
            .field("live", &self.heap.len())
            .finish_non_exhaustive()
    }
}
