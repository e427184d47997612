//! Sparse array view tests over in-memory and container-backed trees

use shardview::array::{Slice, SliceBy, TreeArrayView};
use shardview::encoding::{encode_path, PathComponent};
use shardview::store::{Segment, SortedStore};
use shardview::tree::{encode_array_marker, encode_entry, KeyTree, MemoryTree, TreeView};
use shardview::union::PrefixView;
use shardview::value::{ElementType, NumericArray, Value};
use shardview::Error;
use std::sync::Arc;

fn sparse_memory() -> TreeArrayView<MemoryTree> {
    let mut arr = TreeArrayView::new(MemoryTree::new(), None).allocate().unwrap();
    arr.set(0, 10i64).unwrap();
    arr.set(2, 20i64).unwrap();
    arr.set(5, 30i64).unwrap();
    arr
}

fn sparse_keyed() -> TreeArrayView<KeyTree> {
    let path = vec![PathComponent::from("run"), PathComponent::from("loss")];
    let mut rows = vec![encode_array_marker(&path)];
    for (idx, v) in [(0u64, 10i64), (2, 20), (5, 30)] {
        rows.push(encode_entry(&path, idx, &Value::Int(v)).unwrap());
    }
    let store: Arc<dyn SortedStore> = Arc::new(Segment::from_entries(rows));
    TreeArrayView::new(
        KeyTree::new(PrefixView::new(store, encode_path(&path))),
        None,
    )
}

fn check_scenario<T: TreeView>(arr: &TreeArrayView<T>) {
    assert_eq!(arr.len().unwrap(), 6);
    assert_eq!(arr.first().unwrap(), (0, Value::Int(10)));
    assert_eq!(arr.last().unwrap(), (5, Value::Int(30)));
    assert_eq!(arr.first_idx().unwrap(), 0);
    assert_eq!(arr.last_value().unwrap(), Value::Int(30));

    let sampled = arr.items_in_range(0, 6, Some(2)).unwrap();
    assert_eq!(sampled.len(), 2);
    assert!(sampled.windows(2).all(|w| w[0].0 < w[1].0));

    assert_eq!(arr.indices_list().unwrap(), vec![0, 2, 5]);
    assert_eq!(
        arr.values_list().unwrap(),
        vec![Value::Int(10), Value::Int(20), Value::Int(30)]
    );
    assert_eq!(
        arr.tolist().unwrap(),
        vec![
            Value::Int(10),
            Value::None,
            Value::Int(20),
            Value::None,
            Value::None,
            Value::Int(30),
        ]
    );
}

#[test]
fn test_sparse_scenario_in_memory() {
    check_scenario(&sparse_memory());
}

#[test]
fn test_sparse_scenario_container_backed() {
    check_scenario(&sparse_keyed());
}

#[test]
fn test_round_trip_write_then_read() {
    let mut arr = sparse_memory();
    arr.set(5, Value::Float(3.5)).unwrap();
    assert_eq!(arr.get(5).unwrap(), Value::Float(3.5));
    assert_eq!(arr.len().unwrap(), 6);

    arr.set(11, Value::from("tail")).unwrap();
    assert_eq!(arr.len().unwrap(), 12);
    assert_eq!(arr.last_idx().unwrap(), 11);
}

#[test]
fn test_container_backed_is_read_only() {
    let mut arr = sparse_keyed();
    assert!(matches!(arr.set(1, 1i64), Err(Error::ReadOnly(_))));
    assert!(matches!(arr.allocate(), Err(Error::ReadOnly(_))));
}

#[test]
fn test_slicing_modes_differ_on_sparse_data() {
    let arr = sparse_keyed();

    let by_index: Vec<u64> = arr
        .items_slice(Slice::new(0, 2), SliceBy::Index)
        .unwrap()
        .map(|r| r.unwrap().0)
        .collect();
    assert_eq!(by_index, vec![0, 2]);

    let by_step: Vec<u64> = arr
        .items_slice(Slice::new(0, 2), SliceBy::Step)
        .unwrap()
        .map(|r| r.unwrap().0)
        .collect();
    assert_eq!(by_step, vec![0]);

    let values: Vec<Value> = arr
        .values_slice(Slice::starting_at(2), SliceBy::default())
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(values, vec![Value::Int(20), Value::Int(30)]);
}

#[test]
fn test_float_dtype_widens_ints() {
    let arr = TreeArrayView::new(sparse_keyed().into_inner(), Some(ElementType::Float));
    let (idx, values) = arr.sparse_numeric().unwrap();
    assert_eq!(idx, vec![0, 2, 5]);
    assert_eq!(values, NumericArray::Float(vec![10.0, 20.0, 30.0]));
    assert_eq!(arr.indices_numeric().unwrap(), vec![0, 2, 5]);
}

#[test]
fn test_empty_container_array() {
    let store: Arc<dyn SortedStore> = Arc::new(Segment::default());
    let arr = TreeArrayView::new(KeyTree::new(PrefixView::new(store, b"".to_vec())), None);

    assert_eq!(arr.len().unwrap(), 0);
    assert!(arr.is_empty().unwrap());
    assert!(arr.first().unwrap_err().is_not_found());
    assert!(arr.values_list().unwrap().is_empty());
    assert!(matches!(arr.tolist(), Err(Error::NotAnArray(_))));
}
