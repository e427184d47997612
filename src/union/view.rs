//! Prefix-scoped container views
//!
//! A `PrefixView` exposes the keys under an encoded path prefix with the
//! prefix stripped. Prefixes are expected to be encoded paths, so every
//! key below them continues with a component tag smaller than
//! `encoding::SUBTREE_END`.

use crate::encoding::subtree_end;
use crate::store::{Cursor, SortedStore};
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Read-only view of the keys under `prefix`
#[derive(Clone)]
pub struct PrefixView {
    store: Arc<dyn SortedStore>,
    prefix: Vec<u8>,
}

impl PrefixView {
    /// View `store` below `prefix`
    #[must_use]
    pub fn new(store: Arc<dyn SortedStore>, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Narrower view below `prefix + suffix`, over the same store
    #[must_use]
    pub fn subview(&self, suffix: &[u8]) -> Self {
        let mut prefix = self.prefix.clone();
        prefix.extend_from_slice(suffix);
        Self {
            store: Arc::clone(&self.store),
            prefix,
        }
    }

    /// Full prefix of this view
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SortedStore> {
        &self.store
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

impl SortedStore for PrefixView {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.store.get(&self.full_key(key))
    }

    fn cursor(&self) -> Result<Box<dyn Cursor>> {
        Ok(Box::new(PrefixCursor {
            inner: self.store.cursor()?,
            prefix: self.prefix.clone(),
        }))
    }
}

impl fmt::Debug for PrefixView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixView")
            .field("prefix", &crate::error::hex(&self.prefix))
            .finish_non_exhaustive()
    }
}

struct PrefixCursor {
    inner: Box<dyn Cursor>,
    prefix: Vec<u8>,
}

impl PrefixCursor {
    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = self.prefix.clone();
        full.extend_from_slice(key);
        full
    }
}

impl Cursor for PrefixCursor {
    fn seek_to_first(&mut self) -> Result<()> {
        let prefix = self.prefix.clone();
        self.inner.seek(&prefix)
    }

    fn seek_to_last(&mut self) -> Result<()> {
        if self.prefix.is_empty() {
            return self.inner.seek_to_last();
        }
        self.inner.seek_for_prev(&subtree_end(&self.prefix))
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        let full = self.full_key(key);
        self.inner.seek(&full)
    }

    fn seek_for_prev(&mut self, key: &[u8]) -> Result<()> {
        let full = self.full_key(key);
        self.inner.seek_for_prev(&full)
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        let (key, value) = self.inner.current()?;
        key.strip_prefix(self.prefix.as_slice()).map(|suffix| (suffix, value))
    }

    fn next(&mut self) -> Result<()> {
        if self.current().is_some() {
            self.inner.next()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_names;
    use crate::store::Segment;

    fn store() -> Arc<dyn SortedStore> {
        Arc::new(Segment::from_entries(vec![
            (encode_names(&["aaa"]), b"before".to_vec()),
            (encode_names(&["run", "a"]), b"1".to_vec()),
            (encode_names(&["run", "b"]), b"2".to_vec()),
            (encode_names(&["zzz", "c"]), b"after".to_vec()),
        ]))
    }

    fn drain(cursor: &mut dyn Cursor) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some((_, v)) = cursor.current() {
            out.push(v.to_vec());
            cursor.next().unwrap();
        }
        out
    }

    #[test]
    fn test_cursor_stays_within_prefix() {
        let view = PrefixView::new(store(), encode_names(&["run"]));
        let mut cursor = view.cursor().unwrap();
        cursor.seek_to_first().unwrap();
        assert_eq!(drain(cursor.as_mut()), vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[test]
    fn test_keys_are_stripped() {
        let view = PrefixView::new(store(), encode_names(&["run"]));
        let mut cursor = view.cursor().unwrap();
        cursor.seek_to_first().unwrap();
        assert_eq!(cursor.current().unwrap().0, encode_names(&["a"]).as_slice());
        assert_eq!(view.get(&encode_names(&["b"])).unwrap(), b"2");
    }

    #[test]
    fn test_seek_to_last_within_prefix() {
        let view = PrefixView::new(store(), encode_names(&["run"]));
        let mut cursor = view.cursor().unwrap();
        cursor.seek_to_last().unwrap();
        assert_eq!(cursor.current().unwrap().1, b"2");
    }

    #[test]
    fn test_seek_for_prev_before_prefix_is_exhausted() {
        let view = PrefixView::new(store(), encode_names(&["run"]));
        let mut cursor = view.cursor().unwrap();
        cursor.seek_for_prev(b"").unwrap();
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_empty_view() {
        let view = PrefixView::new(store(), encode_names(&["nothing"]));
        let mut cursor = view.cursor().unwrap();
        cursor.seek_to_first().unwrap();
        assert!(cursor.current().is_none());
        cursor.seek_to_last().unwrap();
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_subview_narrows() {
        let view = PrefixView::new(store(), encode_names(&["run"]));
        let sub = view.subview(&encode_names(&["b"]));
        let mut cursor = sub.cursor().unwrap();
        cursor.seek_to_first().unwrap();
        assert_eq!(cursor.current().unwrap(), (&b""[..], &b"2"[..]));
    }
}
