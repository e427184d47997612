//! Sparse array view over a tree
//!
//! `TreeArrayView` presents an integer-keyed subtree as an array whose
//! indices need not be contiguous. Iteration follows the tree's ascending
//! index order; the logical length is `last index + 1`.
//!
//! ## Slicing
//!
//! - `SliceBy::Index`: positional, counts items in iteration order
//! - `SliceBy::Step`: by index value, `start <= i < stop` and
//!   `(i - start) % step == 0`; the first in-range item is always emitted

use crate::tree::{IndexIter, ItemIter, TreeView};
use crate::value::{ElementType, NumericArray, Value};
use crate::{Error, Result};

/// Lazy value sequence in ascending index order
pub type ValueIter<'a> = Box<dyn Iterator<Item = Result<Value>> + 'a>;

/// Half-open range with a stride; `stop == None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// First position/index (inclusive)
    pub start: i64,
    /// End position/index (exclusive)
    pub stop: Option<i64>,
    /// Stride
    pub step: i64,
}

impl Slice {
    /// `start..stop` with stride 1
    #[must_use]
    pub const fn new(start: i64, stop: i64) -> Self {
        Self {
            start,
            stop: Some(stop),
            step: 1,
        }
    }

    /// `start..` with stride 1
    #[must_use]
    pub const fn starting_at(start: i64) -> Self {
        Self {
            start,
            stop: None,
            step: 1,
        }
    }

    /// Same range with stride `step`
    #[must_use]
    pub const fn step(self, step: i64) -> Self {
        Self { step, ..self }
    }

    /// Validated `(start, stop, step)`; `None` when the range is empty
    fn bounds(self) -> Result<Option<(u64, Option<u64>, u64)>> {
        if self.start < 0 || self.step < 0 || self.stop.is_some_and(|stop| stop < 0) {
            return Err(Error::InvalidArgument(
                "negative index slices are not supported".to_string(),
            ));
        }
        if self.step == 0 {
            return Err(Error::InvalidArgument("slice step cannot be zero".to_string()));
        }
        if self.stop.is_some_and(|stop| stop <= self.start) {
            return Ok(None);
        }
        Ok(Some((
            self.start.unsigned_abs(),
            self.stop.map(i64::unsigned_abs),
            self.step.unsigned_abs(),
        )))
    }
}

impl Default for Slice {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

/// How a `Slice` is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SliceBy {
    /// By ordinal position in iteration order
    Index,
    /// By index value
    #[default]
    Step,
}

/// Argument of `get_item` / `set_item`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscript {
    /// Single index
    Index(u64),
    /// Range
    Slice(Slice),
}

impl From<u64> for Subscript {
    fn from(idx: u64) -> Self {
        Self::Index(idx)
    }
}

impl From<Slice> for Subscript {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}

/// Array-like view over a `TreeView`
#[derive(Debug, Clone)]
pub struct TreeArrayView<T> {
    tree: T,
    dtype: Option<ElementType>,
}

impl<T: TreeView> TreeArrayView<T> {
    /// View `tree`; `dtype` constrains numeric materialization
    #[must_use]
    pub const fn new(tree: T, dtype: Option<ElementType>) -> Self {
        Self { tree, dtype }
    }

    /// Backing tree
    #[must_use]
    pub const fn tree(&self) -> &T {
        &self.tree
    }

    /// Declared element type
    #[must_use]
    pub const fn dtype(&self) -> Option<ElementType> {
        self.dtype
    }

    /// Unwrap the backing tree
    #[must_use]
    pub fn into_inner(self) -> T {
        self.tree
    }

    /// Mark the backing subtree array-typed
    ///
    /// # Errors
    /// `Error::ReadOnly` for read-only trees
    pub fn allocate(mut self) -> Result<Self> {
        self.tree.make_array()?;
        Ok(self)
    }

    /// Occupied indices
    ///
    /// # Errors
    /// Backend read failures
    pub fn keys(&self) -> Result<IndexIter<'_>> {
        self.tree.keys()
    }

    /// Alias of `keys`
    ///
    /// # Errors
    /// Backend read failures
    pub fn indices(&self) -> Result<IndexIter<'_>> {
        self.keys()
    }

    /// Values in index order
    ///
    /// # Errors
    /// Backend read failures
    pub fn values(&self) -> Result<ValueIter<'_>> {
        Ok(Box::new(self.tree.items()?.map(|item| item.map(|(_, v)| v))))
    }

    /// `(index, value)` pairs in index order
    ///
    /// # Errors
    /// Backend read failures
    pub fn items(&self) -> Result<ItemIter<'_>> {
        self.tree.items()
    }

    /// Pairs selected by `slice`
    ///
    /// # Errors
    /// `Error::InvalidArgument` for negative bounds or a zero step
    pub fn items_slice(&self, slice: Slice, by: SliceBy) -> Result<ItemIter<'_>> {
        let Some((start, stop, step)) = slice.bounds()? else {
            return Ok(Box::new(std::iter::empty()));
        };

        match by {
            SliceBy::Index => {
                let skip = to_usize(start);
                let take = stop.map_or(usize::MAX, |stop| to_usize(stop - start));
                Ok(Box::new(
                    self.tree
                        .items()?
                        .skip(skip)
                        .take(take)
                        .step_by(to_usize(step)),
                ))
            }
            SliceBy::Step => Ok(Box::new(StepFilter {
                inner: self.tree.items_from(start)?,
                start,
                stop,
                step,
                started: false,
                done: false,
            })),
        }
    }

    /// Values selected by `slice`
    ///
    /// # Errors
    /// `Error::InvalidArgument` for negative bounds or a zero step
    pub fn values_slice(&self, slice: Slice, by: SliceBy) -> Result<ValueIter<'_>> {
        Ok(Box::new(
            self.items_slice(slice, by)?.map(|item| item.map(|(_, v)| v)),
        ))
    }

    /// Pairs with `start <= index < stop`, decimated to at most `count`
    /// evenly strided samples
    ///
    /// Negative or empty ranges yield nothing. `count` of `None` or `0`
    /// returns every pair in range.
    ///
    /// # Errors
    /// Backend read failures
    pub fn items_in_range(
        &self,
        start: i64,
        stop: i64,
        count: Option<usize>,
    ) -> Result<Vec<(u64, Value)>> {
        if stop <= start || start < 0 || stop < 0 {
            return Ok(Vec::new());
        }
        let (start, stop) = (start.unsigned_abs(), stop.unsigned_abs());

        let mut in_range = Vec::new();
        for item in self.tree.items_from(start)? {
            let (idx, value) = item?;
            if idx >= stop {
                break;
            }
            in_range.push((idx, value));
        }

        let Some(count) = count.filter(|&c| c > 0) else {
            return Ok(in_range);
        };
        let stride = (in_range.len() / count).max(1);
        Ok(in_range.into_iter().step_by(stride).take(count).collect())
    }

    /// Values with `start <= index < stop`, decimated like `items_in_range`
    ///
    /// # Errors
    /// Backend read failures
    pub fn values_in_range(&self, start: i64, stop: i64, count: Option<usize>) -> Result<Vec<Value>> {
        Ok(self
            .items_in_range(start, stop, count)?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    /// Logical length: `last_idx() + 1`, or 0 when empty
    ///
    /// # Errors
    /// Backend read failures
    pub fn len(&self) -> Result<u64> {
        match self.last_idx() {
            Ok(idx) => Ok(idx.saturating_add(1)),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Whether no index is occupied
    ///
    /// # Errors
    /// Backend read failures
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Value at an index subscript
    ///
    /// # Errors
    /// `Error::Unsupported` for slice subscripts, `Error::NotFound` for
    /// unoccupied indices
    pub fn get_item(&self, subscript: impl Into<Subscript>) -> Result<Value> {
        match subscript.into() {
            Subscript::Index(idx) => self.tree.get(idx),
            Subscript::Slice(_) => Err(Error::Unsupported(
                "slice subscripts; use items_slice or items_in_range".to_string(),
            )),
        }
    }

    /// Write through to the backing tree
    ///
    /// # Errors
    /// `Error::InvalidArgument` for slice subscripts, `Error::ReadOnly` for
    /// read-only trees
    pub fn set_item(&mut self, subscript: impl Into<Subscript>, value: Value) -> Result<()> {
        match subscript.into() {
            Subscript::Index(idx) => self.tree.set(idx, value),
            Subscript::Slice(_) => Err(Error::InvalidArgument(
                "array assignment requires an integer index".to_string(),
            )),
        }
    }

    /// Value at `idx`
    ///
    /// # Errors
    /// `Error::NotFound` for unoccupied indices
    pub fn get(&self, idx: u64) -> Result<Value> {
        self.tree.get(idx)
    }

    /// Store `value` at `idx`
    ///
    /// # Errors
    /// `Error::ReadOnly` for read-only trees
    pub fn set(&mut self, idx: u64, value: impl Into<Value>) -> Result<()> {
        self.tree.set(idx, value.into())
    }

    /// Indices and values as parallel vectors
    ///
    /// # Errors
    /// Backend read failures
    pub fn sparse_list(&self) -> Result<(Vec<u64>, Vec<Value>)> {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for item in self.items()? {
            let (idx, value) = item?;
            indices.push(idx);
            values.push(value);
        }
        Ok((indices, values))
    }

    /// All occupied indices
    ///
    /// # Errors
    /// Backend read failures
    pub fn indices_list(&self) -> Result<Vec<u64>> {
        self.indices()?.collect()
    }

    /// All values in index order
    ///
    /// # Errors
    /// Backend read failures
    pub fn values_list(&self) -> Result<Vec<Value>> {
        self.values()?.collect()
    }

    /// Indices and values as numeric buffers
    ///
    /// # Errors
    /// `Error::TypeMismatch` if a value does not fit the element type
    pub fn sparse_numeric(&self) -> Result<(Vec<u64>, NumericArray)> {
        let (indices, values) = self.sparse_list()?;
        Ok((indices, self.to_numeric(values)?))
    }

    /// Occupied indices as a buffer
    ///
    /// # Errors
    /// Backend read failures
    pub fn indices_numeric(&self) -> Result<Vec<u64>> {
        self.indices_list()
    }

    /// Values as a numeric buffer
    ///
    /// # Errors
    /// `Error::TypeMismatch` if a value does not fit the element type
    pub fn values_numeric(&self) -> Result<NumericArray> {
        self.to_numeric(self.values_list()?)
    }

    /// Dense materialization of the backing tree
    ///
    /// # Errors
    /// `Error::NotAnArray` if the tree is not array-typed
    pub fn tolist(&self) -> Result<Vec<Value>> {
        match self.tree.dense()? {
            Value::List(values) => Ok(values),
            other => Err(Error::NotAnArray(format!(
                "dense read returned {}",
                other.type_name()
            ))),
        }
    }

    /// Smallest index and its value
    ///
    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn first(&self) -> Result<(u64, Value)> {
        let idx = self.min_idx()?;
        Ok((idx, self.get(idx)?))
    }

    /// Smallest occupied index
    ///
    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn first_idx(&self) -> Result<u64> {
        self.min_idx()
    }

    /// Value at the smallest occupied index
    ///
    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn first_value(&self) -> Result<Value> {
        self.get(self.min_idx()?)
    }

    /// Largest index and its value
    ///
    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn last(&self) -> Result<(u64, Value)> {
        let idx = self.max_idx()?;
        Ok((idx, self.get(idx)?))
    }

    /// Largest occupied index
    ///
    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn last_idx(&self) -> Result<u64> {
        self.max_idx()
    }

    /// Value at the largest occupied index
    ///
    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn last_value(&self) -> Result<Value> {
        self.get(self.max_idx()?)
    }

    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn min_idx(&self) -> Result<u64> {
        self.tree.first()
    }

    /// # Errors
    /// `Error::NotFound` if the array is empty
    pub fn max_idx(&self) -> Result<u64> {
        self.tree.last()
    }

    fn to_numeric(&self, values: Vec<Value>) -> Result<NumericArray> {
        let dtype = self.dtype.unwrap_or_else(|| {
            if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Int(_))) {
                ElementType::Int
            } else {
                ElementType::Float
            }
        });
        let mismatch = |v: &Value| Error::TypeMismatch {
            expected: dtype.as_str().to_string(),
            found: v.type_name().to_string(),
        };

        match dtype {
            ElementType::Int => values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Ok(*i),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<_>>()
                .map(NumericArray::Int),
            ElementType::Float => values
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| mismatch(v)))
                .collect::<Result<_>>()
                .map(NumericArray::Float),
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Index-value filter behind `SliceBy::Step`; `inner` starts at `start`
struct StepFilter<'a> {
    inner: ItemIter<'a>,
    start: u64,
    stop: Option<u64>,
    step: u64,
    started: bool,
    done: bool,
}

impl Iterator for StepFilter<'_> {
    type Item = Result<(u64, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let (idx, value) = match self.inner.next()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };
            if idx < self.start {
                continue;
            }
            if self.stop.is_some_and(|stop| idx >= stop) {
                self.done = true;
                return None;
            }
            if !self.started || (idx - self.start) % self.step == 0 {
                self.started = true;
                return Some(Ok((idx, value)));
            }
        }
    }
}
