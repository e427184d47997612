//! Iterator adapters over any positioned cursor
//!
//! `Items` yields owned `(key, value)` pairs; `Keys` and `Values` project
//! one side of the same merge.

use crate::store::Cursor;
use crate::{Error, Result};

/// Owned `(key, value)` pairs from a cursor's current position onward
pub struct Items {
    cursor: Box<dyn Cursor>,
    failed: Option<Error>,
    finished: bool,
}

impl Items {
    /// Wrap a cursor; iteration starts at its current position
    #[must_use]
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self {
            cursor,
            failed: None,
            finished: false,
        }
    }

    /// Entry the next call to `next` will return, without advancing
    #[must_use]
    pub fn peek(&self) -> Option<(&[u8], &[u8])> {
        if self.finished || self.failed.is_some() {
            return None;
        }
        self.cursor.current()
    }

    /// Reposition at the smallest key
    ///
    /// # Errors
    /// Backend read failures
    pub fn seek_to_first(&mut self) -> Result<()> {
        self.reset();
        self.cursor.seek_to_first()
    }

    /// Reposition at the largest key
    ///
    /// # Errors
    /// Backend read failures
    pub fn seek_to_last(&mut self) -> Result<()> {
        self.reset();
        self.cursor.seek_to_last()
    }

    /// Reposition at the smallest key `>= key`
    ///
    /// # Errors
    /// Backend read failures
    pub fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.reset();
        self.cursor.seek(key)
    }

    /// Reposition at the largest key `<= key`
    ///
    /// # Errors
    /// Backend read failures
    pub fn seek_for_prev(&mut self, key: &[u8]) -> Result<()> {
        self.reset();
        self.cursor.seek_for_prev(key)
    }

    fn reset(&mut self) {
        self.failed = None;
        self.finished = false;
    }
}

impl Iterator for Items {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.failed.take() {
            self.finished = true;
            return Some(Err(err));
        }
        if self.finished {
            return None;
        }

        let Some(item) = self.cursor.current().map(|(k, v)| (k.to_vec(), v.to_vec())) else {
            self.finished = true;
            return None;
        };
        if let Err(err) = self.cursor.next() {
            self.failed = Some(err);
        }
        Some(Ok(item))
    }
}

impl std::fmt::Debug for Items {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Items")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Keys from a cursor's current position onward
#[derive(Debug)]
pub struct Keys(Items);

impl Keys {
    /// Wrap a cursor
    #[must_use]
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self(Items::new(cursor))
    }

    /// Key the next call to `next` will return
    #[must_use]
    pub fn peek(&self) -> Option<&[u8]> {
        self.0.peek().map(|(k, _)| k)
    }

    /// Underlying items iterator, for repositioning
    pub fn items_mut(&mut self) -> &mut Items {
        &mut self.0
    }
}

impl Iterator for Keys {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.map(|(k, _)| k))
    }
}

/// Values from a cursor's current position onward
#[derive(Debug)]
pub struct Values(Items);

impl Values {
    /// Wrap a cursor
    #[must_use]
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self(Items::new(cursor))
    }

    /// Value the next call to `next` will return
    #[must_use]
    pub fn peek(&self) -> Option<&[u8]> {
        self.0.peek().map(|(_, v)| v)
    }

    /// Underlying items iterator, for repositioning
    pub fn items_mut(&mut self) -> &mut Items {
        &mut self.0
    }
}

impl Iterator for Values {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.map(|(_, v)| v))
    }
}
