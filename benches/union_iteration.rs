//! Union store benchmarks
//!
//! - Full union scans over in-memory shards, with and without an index
//! - Point seeks through the merge cursor
//! - Segment loading from Parquet parts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shardview::encoding::{encode_path, PathComponent};
use shardview::shard::{chunk_domain, Shard, ShardKind, ShardSet};
use shardview::store::{Cursor, Segment};
use shardview::union::{Items, UnionCursor};
use std::sync::Arc;

fn key(shard: usize, idx: u64) -> Vec<u8> {
    encode_path(&[
        PathComponent::from("meta"),
        PathComponent::from("chunks"),
        PathComponent::from(format!("s{shard}")),
        PathComponent::Index(idx),
    ])
}

/// `shards` chunks of `rows` entries each; the index overlaps every 10th row
fn shard_set(shards: usize, rows: u64, with_index: bool) -> Arc<ShardSet> {
    let mut set = Vec::new();
    for s in 0..shards {
        let segment = Segment::from_entries((0..rows).map(|i| (key(s, i), i.to_be_bytes().to_vec())));
        set.push(Shard::new(
            format!("s{s}"),
            ShardKind::Chunk,
            chunk_domain("meta", &format!("s{s}")),
            s + 1,
            Arc::new(segment),
        ));
    }
    if with_index {
        let overlay = Segment::from_entries(
            (0..shards).flat_map(|s| (0..rows).step_by(10).map(move |i| (key(s, i), b"idx".to_vec()))),
        );
        set.push(Shard::new("index", ShardKind::Index, Vec::new(), 0, Arc::new(overlay)));
    }
    Arc::new(ShardSet::new(set))
}

/// Benchmark full scans
fn bench_union_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_scan");

    for shards in [1, 8, 32] {
        for with_index in [false, true] {
            let set = shard_set(shards, 1_000, with_index);
            let label = format!("{shards}_shards{}", if with_index { "_index" } else { "" });

            group.bench_function(BenchmarkId::from_parameter(label), |b| {
                b.iter(|| {
                    let mut items = Items::new(Box::new(UnionCursor::new(Arc::clone(&set)).unwrap()));
                    items.seek_to_first().unwrap();
                    black_box(items.count());
                });
            });
        }
    }

    group.finish();
}

/// Benchmark point seeks
fn bench_union_seek(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_seek");
    let set = shard_set(16, 1_000, true);
    let mut cursor = UnionCursor::new(set).unwrap();

    group.bench_function("seek", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 7) % 1_000;
            cursor.seek(&key(usize::try_from(i % 16).unwrap(), i)).unwrap();
            black_box(cursor.current().map(|(k, _)| k.len()));
        });
    });

    group.bench_function("seek_for_prev", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 7) % 1_000;
            cursor
                .seek_for_prev(&key(usize::try_from(i % 16).unwrap(), i))
                .unwrap();
            black_box(cursor.current().map(|(k, _)| k.len()));
        });
    });

    group.finish();
}

/// Benchmark Parquet segment loading
fn bench_segment_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_open");

    for rows in [1_000u64, 10_000, 100_000] {
        let dir = tempfile::tempdir().unwrap();
        Segment::from_entries((0..rows).map(|i| (key(0, i), i.to_be_bytes().to_vec())))
            .write(dir.path(), "000.parquet")
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                let segment = Segment::open(dir.path()).unwrap();
                black_box(segment.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_union_scan, bench_union_seek, bench_segment_open);
criterion_main!(benches);
