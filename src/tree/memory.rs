//! In-memory tree

use super::{IndexIter, ItemIter, TreeView};
use crate::error::Error;
use crate::value::Value;
use crate::Result;
use std::collections::BTreeMap;

/// Writable tree held in a `BTreeMap`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTree {
    entries: BTreeMap<u64, Value>,
    is_array: bool,
}

impl MemoryTree {
    /// Empty, untyped tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty array-typed tree
    #[must_use]
    pub fn array() -> Self {
        Self {
            entries: BTreeMap::new(),
            is_array: true,
        }
    }

    /// Whether `make_array` has been applied
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.is_array
    }

    /// Number of occupied indices
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no index is occupied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Into<Value>> FromIterator<(u64, V)> for MemoryTree {
    fn from_iter<I: IntoIterator<Item = (u64, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(idx, v)| (idx, v.into())).collect(),
            is_array: true,
        }
    }
}

impl TreeView for MemoryTree {
    fn keys(&self) -> Result<IndexIter<'_>> {
        Ok(Box::new(self.entries.keys().map(|&idx| Ok(idx))))
    }

    fn items(&self) -> Result<ItemIter<'_>> {
        Ok(Box::new(
            self.entries.iter().map(|(&idx, v)| Ok((idx, v.clone()))),
        ))
    }

    fn items_from(&self, start: u64) -> Result<ItemIter<'_>> {
        Ok(Box::new(
            self.entries
                .range(start..)
                .map(|(&idx, v)| Ok((idx, v.clone()))),
        ))
    }

    fn get(&self, idx: u64) -> Result<Value> {
        self.entries
            .get(&idx)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("index {idx}")))
    }

    fn set(&mut self, idx: u64, value: Value) -> Result<()> {
        self.entries.insert(idx, value);
        Ok(())
    }

    fn first(&self) -> Result<u64> {
        self.entries
            .keys()
            .next()
            .copied()
            .ok_or_else(|| Error::NotFound("empty tree".to_string()))
    }

    fn last(&self) -> Result<u64> {
        self.entries
            .keys()
            .next_back()
            .copied()
            .ok_or_else(|| Error::NotFound("empty tree".to_string()))
    }

    fn make_array(&mut self) -> Result<()> {
        self.is_array = true;
        Ok(())
    }

    fn dense(&self) -> Result<Value> {
        if !self.is_array {
            return Ok(Value::Map(
                self.entries
                    .iter()
                    .map(|(idx, v)| (idx.to_string(), v.clone()))
                    .collect(),
            ));
        }
        let mut list = Vec::new();
        for (&idx, v) in &self.entries {
            let idx = usize::try_from(idx)
                .map_err(|_| Error::InvalidArgument(format!("index {idx} exceeds address space")))?;
            if list.len() < idx {
                list.resize(idx, Value::None);
            }
            list.push(v.clone());
        }
        Ok(Value::List(list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_last() {
        let tree: MemoryTree = [(2, 20), (0, 10), (5, 30)]
            .into_iter()
            .map(|(i, v): (u64, i64)| (i, v))
            .collect();
        assert_eq!(tree.first().unwrap(), 0);
        assert_eq!(tree.last().unwrap(), 5);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_empty_tree_not_found() {
        let tree = MemoryTree::new();
        assert!(tree.first().unwrap_err().is_not_found());
        assert!(tree.last().unwrap_err().is_not_found());
        assert!(tree.get(0).unwrap_err().is_not_found());
    }

    #[test]
    fn test_items_from_uses_range() {
        let tree: MemoryTree = (0..10u64).map(|i| (i, i64::try_from(i).unwrap())).collect();
        let keys: Vec<u64> = tree.items_from(7).unwrap().map(|r| r.unwrap().0).collect();
        assert_eq!(keys, vec![7, 8, 9]);
    }

    #[test]
    fn test_dense_fills_gaps() {
        let mut tree = MemoryTree::array();
        tree.set(0, Value::Int(1)).unwrap();
        tree.set(3, Value::Int(4)).unwrap();
        assert_eq!(
            tree.dense().unwrap(),
            Value::List(vec![Value::Int(1), Value::None, Value::None, Value::Int(4)])
        );
    }

    #[test]
    fn test_dense_untyped_is_map() {
        let mut tree = MemoryTree::new();
        tree.set(1, Value::from("a")).unwrap();
        assert!(!tree.is_array());
        match tree.dense().unwrap() {
            Value::Map(map) => assert_eq!(map["1"], Value::from("a")),
            other => panic!("expected map, got {other}"),
        }
        tree.make_array().unwrap();
        assert!(matches!(tree.dense().unwrap(), Value::List(_)));
    }
}
