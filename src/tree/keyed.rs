//! Read-only tree decoded from a key-value container
//!
//! Layout below the tree's prefix:
//!
//! ```text
//! <prefix>                    ARRAY_MARKER (present once the tree is array-typed)
//! <prefix> <index i>          JSON-encoded Value
//! <prefix> <name n> ...       named subtrees (skipped by index iteration)
//! ```

use super::{ItemIter, TreeView};
use crate::encoding::{decode_component, encode_component, encode_path, subtree_end, PathComponent};
use crate::error::Error;
use crate::store::{Cursor, SortedStore};
use crate::union::{Items, PrefixView};
use crate::value::Value;
use crate::Result;
use std::collections::BTreeMap;

/// Value stored at a subtree root to mark it array-typed
pub const ARRAY_MARKER: &[u8] = b"\x00array";

/// Tree over the entries of a `PrefixView`
#[derive(Debug, Clone)]
pub struct KeyTree {
    view: PrefixView,
}

impl KeyTree {
    /// Tree rooted at `view`'s prefix
    #[must_use]
    pub const fn new(view: PrefixView) -> Self {
        Self { view }
    }

    /// Named child subtree
    #[must_use]
    pub fn subtree(&self, name: &str) -> Self {
        let mut suffix = Vec::new();
        encode_component(&PathComponent::from(name), &mut suffix);
        Self::new(self.view.subview(&suffix))
    }

    /// Underlying container view
    #[must_use]
    pub const fn view(&self) -> &PrefixView {
        &self.view
    }

    /// Whether the subtree root carries the array marker
    ///
    /// # Errors
    /// Backend read failures other than a missing marker
    pub fn is_array(&self) -> Result<bool> {
        match self.view.get(&[]) {
            Ok(marker) => Ok(marker == ARRAY_MARKER),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Names of named child subtrees, in key order
    ///
    /// # Errors
    /// Backend read failures or undecodable keys
    pub fn child_names(&self) -> Result<Vec<String>> {
        let mut cursor = self.view.cursor()?;
        cursor.seek_to_first()?;

        let mut names = Vec::new();
        while let Some((key, _)) = cursor.current() {
            if key.is_empty() {
                cursor.next()?;
                continue;
            }
            let (component, rest) = decode_component(key)?;
            let PathComponent::Name(name) = component else {
                // indices sort after every name
                break;
            };
            let child_end = subtree_end(&key[..key.len() - rest.len()]);
            names.push(name);
            cursor.seek(&child_end)?;
        }
        Ok(names)
    }
}

fn index_items(cursor: Box<dyn Cursor>) -> ItemIter<'static> {
    Box::new(Items::new(cursor).filter_map(|item| match item {
        Err(e) => Some(Err(e)),
        Ok((key, value)) => {
            decode_index_key(&key).map(|idx| decode_value(&value).map(|v| (idx, v)))
        }
    }))
}

/// Index of a key that is exactly one index component
fn decode_index_key(key: &[u8]) -> Option<u64> {
    match decode_component(key) {
        Ok((PathComponent::Index(idx), [])) => Some(idx),
        _ => None,
    }
}

fn decode_value(bytes: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(bytes)?)
}

fn index_key(idx: u64) -> Vec<u8> {
    encode_path(&[PathComponent::Index(idx)])
}

fn read_only(op: &str) -> Error {
    Error::ReadOnly(format!("{op} on a container-backed tree"))
}

impl TreeView for KeyTree {
    fn items(&self) -> Result<ItemIter<'_>> {
        let mut cursor = self.view.cursor()?;
        cursor.seek(&index_key(0))?;
        Ok(index_items(cursor))
    }

    fn items_from(&self, start: u64) -> Result<ItemIter<'_>> {
        let mut cursor = self.view.cursor()?;
        cursor.seek(&index_key(start))?;
        Ok(index_items(cursor))
    }

    fn get(&self, idx: u64) -> Result<Value> {
        match self.view.get(&index_key(idx)) {
            Ok(bytes) => decode_value(&bytes),
            Err(e) if e.is_not_found() => Err(Error::NotFound(format!("index {idx}"))),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, _idx: u64, _value: Value) -> Result<()> {
        Err(read_only("set"))
    }

    fn first(&self) -> Result<u64> {
        match self.items()?.next() {
            Some(item) => item.map(|(idx, _)| idx),
            None => Err(Error::NotFound("empty tree".to_string())),
        }
    }

    fn last(&self) -> Result<u64> {
        let mut cursor = self.view.cursor()?;
        let mut target = index_key(u64::MAX);
        loop {
            cursor.seek_for_prev(&target)?;
            let Some((key, _)) = cursor.current() else {
                return Err(Error::NotFound("empty tree".to_string()));
            };
            match decode_component(key) {
                Ok((PathComponent::Index(idx), [])) => return Ok(idx),
                // landed inside a nested subtree of `idx`; retry at the bare index
                Ok((PathComponent::Index(idx), _)) => target = index_key(idx),
                _ => return Err(Error::NotFound("empty tree".to_string())),
            }
        }
    }

    fn make_array(&mut self) -> Result<()> {
        Err(read_only("make_array"))
    }

    fn dense(&self) -> Result<Value> {
        let items = self.items()?;
        if !self.is_array()? {
            let mut map = BTreeMap::new();
            for item in items {
                let (idx, value) = item?;
                map.insert(idx.to_string(), value);
            }
            return Ok(Value::Map(map));
        }

        let mut list = Vec::new();
        for item in items {
            let (idx, value) = item?;
            let idx = usize::try_from(idx)
                .map_err(|_| Error::InvalidArgument(format!("index {idx} exceeds address space")))?;
            if list.len() < idx {
                list.resize(idx, Value::None);
            }
            list.push(value);
        }
        Ok(Value::List(list))
    }
}

/// Key and encoded value for `value` at index `idx` below `path`
///
/// # Errors
/// `Error::Serde` if the value cannot be encoded
pub fn encode_entry(path: &[PathComponent], idx: u64, value: &Value) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut key = encode_path(path);
    encode_component(&PathComponent::Index(idx), &mut key);
    Ok((key, serde_json::to_vec(value)?))
}

/// Key and value marking the subtree at `path` array-typed
#[must_use]
pub fn encode_array_marker(path: &[PathComponent]) -> (Vec<u8>, Vec<u8>) {
    (encode_path(path), ARRAY_MARKER.to_vec())
}
