//! Tree views: integer-keyed subtrees
//!
//! A `TreeView` is the node of a hierarchical store whose children are
//! addressed by non-negative integers. Iteration is always in ascending
//! index order.
//!
//! - `MemoryTree`: writable, in-memory
//! - `KeyTree`: read-only, decoded from an encoded-path container

mod keyed;
mod memory;

pub use keyed::{encode_array_marker, encode_entry, KeyTree, ARRAY_MARKER};
pub use memory::MemoryTree;

use crate::value::Value;
use crate::Result;

/// Lazy `(index, value)` sequence in ascending index order
pub type ItemIter<'a> = Box<dyn Iterator<Item = Result<(u64, Value)>> + 'a>;

/// Lazy index sequence in ascending order
pub type IndexIter<'a> = Box<dyn Iterator<Item = Result<u64>> + 'a>;

/// Integer-indexed subtree
pub trait TreeView {
    /// Occupied indices
    ///
    /// # Errors
    /// Backend read failures
    fn keys(&self) -> Result<IndexIter<'_>> {
        Ok(Box::new(self.items()?.map(|item| item.map(|(idx, _)| idx))))
    }

    /// Occupied `(index, value)` pairs
    ///
    /// # Errors
    /// Backend read failures
    fn items(&self) -> Result<ItemIter<'_>>;

    /// Pairs with index `>= start`
    ///
    /// # Errors
    /// Backend read failures
    fn items_from(&self, start: u64) -> Result<ItemIter<'_>> {
        Ok(Box::new(self.items()?.skip_while(
            move |item| matches!(item, Ok((idx, _)) if *idx < start),
        )))
    }

    /// Value at `idx`
    ///
    /// # Errors
    /// `Error::NotFound` if `idx` is not occupied
    fn get(&self, idx: u64) -> Result<Value>;

    /// Store `value` at `idx`
    ///
    /// # Errors
    /// `Error::ReadOnly` for read-only trees
    fn set(&mut self, idx: u64, value: Value) -> Result<()>;

    /// Smallest occupied index
    ///
    /// # Errors
    /// `Error::NotFound` if the tree is empty
    fn first(&self) -> Result<u64>;

    /// Largest occupied index
    ///
    /// # Errors
    /// `Error::NotFound` if the tree is empty
    fn last(&self) -> Result<u64>;

    /// Mark the subtree as array-typed
    ///
    /// # Errors
    /// `Error::ReadOnly` for read-only trees
    fn make_array(&mut self) -> Result<()>;

    /// Dense materialization: `Value::List` with gaps filled by
    /// `Value::None` for array-typed trees, `Value::Map` otherwise
    ///
    /// # Errors
    /// Backend read failures
    fn dense(&self) -> Result<Value>;
}
