//! # shardview: sharded sorted-store union and sparse array views
//!
//! A container's data is split across sorted key-value shards: sealed
//! *chunks*, each owning a disjoint key domain, and an optional *index*
//! shard that overlaps every domain and holds the latest state. `shardview`
//! presents them as one ordered key space and layers integer-indexed
//! sparse arrays on top.
//!
//! ## Design Principles
//!
//! - **Read-only**: shards are opened once, shared, never written
//! - **Shadowing**: on equal keys the index wins over any chunk
//! - **Pull-based**: every iterator advances only when asked
//! - **Graceful degradation**: an unreadable index falls back to all chunks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use shardview::run::RunView;
//! use shardview::union::UnionStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(UnionStore::builder("data/repo", "meta").build()?);
//! let run = RunView::open(&store, "3f9a2c")?;
//!
//! let loss = run.metric("loss");
//! println!("{} steps, last = {:?}", loss.len()?, loss.last()?);
//! for (step, value) in loss.items_in_range(0, 10_000, Some(50))? {
//!     println!("{step}: {value}");
//! }
//! # Ok::<(), shardview::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod array;
pub mod clock;
pub mod encoding;
pub mod error;
pub mod run;
pub mod shard;
pub mod store;
pub mod tree;
pub mod union;
pub mod value;

pub use error::{Error, Result};
