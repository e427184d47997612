//! Sorted segment backed by Parquet part files
//!
//! A shard directory holds one or more `*.parquet` parts with schema
//! `(key: Binary, value: Binary)`. Opening a segment reads every part into
//! one sorted in-memory table; when parts disagree on a key, the part whose
//! file name sorts last wins.

use super::{Cursor, SortedStore};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, BinaryArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extension of segment parts
pub const PART_EXTENSION: &str = "parquet";

/// Part name produced by compaction
pub const COMPACTED_PART: &str = "segment.parquet";

type Entries = Arc<Vec<(Vec<u8>, Vec<u8>)>>;

/// Immutable sorted key-value table
#[derive(Debug, Clone, Default)]
pub struct Segment {
    entries: Entries,
}

impl Segment {
    /// Build a segment from unsorted pairs; later duplicates win
    #[must_use]
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let sorted: BTreeMap<Vec<u8>, Vec<u8>> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(sorted.into_iter().collect()),
        }
    }

    /// Load every part file under `dir`
    ///
    /// # Errors
    /// `Error::BackendUnavailable` if `dir` is missing or a part is unreadable
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let unavailable = |reason: String| Error::BackendUnavailable {
            path: dir.to_path_buf(),
            reason,
        };

        if !dir.is_dir() {
            return Err(unavailable("shard directory does not exist".to_string()));
        }

        let mut merged = BTreeMap::new();
        for part in part_files(dir)? {
            read_part(&part, &mut merged)
                .map_err(|e| unavailable(format!("failed to read {}: {e}", part.display())))?;
        }

        Ok(Self {
            entries: Arc::new(merged.into_iter().collect()),
        })
    }

    /// Write this segment as a part file named `part_name` under `dir`
    ///
    /// Creates `dir` if needed. Used by sealing tools and fixtures; the
    /// union view never writes.
    ///
    /// # Errors
    /// IO or Parquet failures
    pub fn write<P: AsRef<Path>>(&self, dir: P, part_name: &str) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(part_name);

        let schema = Arc::new(Schema::new(vec![
            Field::new("key", DataType::Binary, false),
            Field::new("value", DataType::Binary, false),
        ]));
        let keys = BinaryArray::from_iter_values(self.entries.iter().map(|(k, _)| k));
        let values = BinaryArray::from_iter_values(self.entries.iter().map(|(_, v)| v));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(keys) as ArrayRef, Arc::new(values) as ArrayRef],
        )?;

        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(path)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the segment holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl SortedStore for Segment {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.entries
            .binary_search_by(|(k, _)| k.as_slice().cmp(key))
            .map(|i| self.entries[i].1.clone())
            .map_err(|_| Error::key_not_found(key))
    }

    fn cursor(&self) -> Result<Box<dyn Cursor>> {
        Ok(Box::new(SegmentCursor {
            entries: Arc::clone(&self.entries),
            pos: None,
        }))
    }
}

/// Cursor over a `Segment`
#[derive(Debug)]
pub struct SegmentCursor {
    entries: Entries,
    pos: Option<usize>,
}

impl SegmentCursor {
    fn position(&mut self, idx: usize) {
        self.pos = (idx < self.entries.len()).then_some(idx);
    }
}

impl Cursor for SegmentCursor {
    fn seek_to_first(&mut self) -> Result<()> {
        self.position(0);
        Ok(())
    }

    fn seek_to_last(&mut self) -> Result<()> {
        self.pos = self.entries.len().checked_sub(1);
        Ok(())
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        let idx = self.entries.partition_point(|(k, _)| k.as_slice() < key);
        self.position(idx);
        Ok(())
    }

    fn seek_for_prev(&mut self, key: &[u8]) -> Result<()> {
        let idx = self.entries.partition_point(|(k, _)| k.as_slice() <= key);
        self.pos = idx.checked_sub(1);
        Ok(())
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.pos
            .map(|i| (self.entries[i].0.as_slice(), self.entries[i].1.as_slice()))
    }

    fn next(&mut self) -> Result<()> {
        if let Some(i) = self.pos {
            self.position(i + 1);
        }
        Ok(())
    }
}

/// Part files under `dir`, sorted by file name
///
/// # Errors
/// IO failures while listing `dir`
pub fn part_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut parts: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().is_some_and(|ext| ext == PART_EXTENSION)
        })
        .collect();
    parts.sort();
    Ok(parts)
}

fn read_part(path: &Path, into: &mut BTreeMap<Vec<u8>, Vec<u8>>) -> Result<()> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    for batch in reader {
        let batch = batch?;
        let keys = binary_column(&batch, "key")?;
        let values = binary_column(&batch, "value")?;
        for row in 0..batch.num_rows() {
            into.insert(keys.value(row).to_vec(), values.value(row).to_vec());
        }
    }
    Ok(())
}

fn binary_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a BinaryArray> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<BinaryArray>())
        .ok_or_else(|| Error::Encoding(format!("segment part has no binary column {name:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Segment {
        Segment::from_entries(vec![
            (b"b".to_vec(), b"2".to_vec()),
            (b"a".to_vec(), b"1".to_vec()),
            (b"d".to_vec(), b"4".to_vec()),
        ])
    }

    fn collect(cursor: &mut dyn Cursor) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        while let Some((k, _)) = cursor.current() {
            keys.push(k.to_vec());
            cursor.next().unwrap();
        }
        keys
    }

    #[test]
    fn test_from_entries_sorts_and_dedups() {
        let seg = Segment::from_entries(vec![
            (b"k".to_vec(), b"old".to_vec()),
            (b"a".to_vec(), b"x".to_vec()),
            (b"k".to_vec(), b"new".to_vec()),
        ]);
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.get(b"k").unwrap(), b"new");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        assert!(sample().get(b"c").unwrap_err().is_not_found());
    }

    #[test]
    fn test_fresh_cursor_is_unpositioned() {
        let cursor = sample().cursor().unwrap();
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_seek_variants() {
        let seg = sample();
        let mut cursor = seg.cursor().unwrap();

        cursor.seek(b"c").unwrap();
        assert_eq!(cursor.current().unwrap().0, b"d");

        cursor.seek_for_prev(b"c").unwrap();
        assert_eq!(cursor.current().unwrap().0, b"b");

        cursor.seek_for_prev(b"0").unwrap();
        assert!(cursor.current().is_none());

        cursor.seek(b"e").unwrap();
        assert!(cursor.current().is_none());

        cursor.seek_to_last().unwrap();
        assert_eq!(cursor.current().unwrap().0, b"d");

        cursor.seek_to_first().unwrap();
        assert_eq!(collect(cursor.as_mut()), vec![b"a".to_vec(), b"b".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn test_empty_segment_cursor() {
        let seg = Segment::default();
        let mut cursor = seg.cursor().unwrap();
        cursor.seek_to_first().unwrap();
        assert!(cursor.current().is_none());
        cursor.seek_to_last().unwrap();
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_write_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let shard = dir.path().join("shard");
        sample().write(&shard, "000.parquet").unwrap();

        let loaded = Segment::open(&shard).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get(b"d").unwrap(), b"4");
    }

    #[test]
    fn test_later_part_wins() {
        let dir = tempfile::tempdir().unwrap();
        Segment::from_entries(vec![(b"k".to_vec(), b"old".to_vec())])
            .write(dir.path(), "000.parquet")
            .unwrap();
        Segment::from_entries(vec![(b"k".to_vec(), b"new".to_vec())])
            .write(dir.path(), "001.parquet")
            .unwrap();

        let loaded = Segment::open(dir.path()).unwrap();
        assert_eq!(loaded.get(b"k").unwrap(), b"new");
    }

    #[test]
    fn test_open_missing_dir_is_backend_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = Segment::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable { .. }));
    }

    #[test]
    fn test_open_ignores_non_part_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LOCK"), b"").unwrap();
        sample().write(dir.path(), "000.parquet").unwrap();
        assert_eq!(Segment::open(dir.path()).unwrap().len(), 3);
    }
}
