//! Metric Slices Demo
//!
//! Writes a sealed run with a sparse `loss` sequence and reads it back as
//! an array: length, bounds, both slicing modes and range decimation.
//!
//! Run with: cargo run --example metric_slices

use shardview::array::{Slice, SliceBy};
use shardview::run::{metric_path, RunView};
use shardview::store::Segment;
use shardview::tree::{encode_array_marker, encode_entry};
use shardview::union::UnionStore;
use shardview::value::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CONTAINER: &str = "meta";
const RUN: &str = "3f9a2c";

#[allow(clippy::cast_precision_loss)]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== shardview metric slices ===\n");

    // -------------------------------------------------------------------------
    // 1. Seal a run: loss logged every 25 steps, with a gap
    // -------------------------------------------------------------------------
    let root = tempfile::tempdir()?;
    let path = metric_path(CONTAINER, RUN, "loss");
    let mut rows = vec![encode_array_marker(&path)];
    for step in (0..2_000u64).step_by(25).filter(|s| !(800..1_200).contains(s)) {
        let loss = 2.0 / (1.0 + step as f64 / 100.0);
        rows.push(encode_entry(&path, step, &Value::Float(loss))?);
    }
    Segment::from_entries(rows).write(
        root.path().join(CONTAINER).join("chunks").join(RUN),
        "000.parquet",
    )?;
    println!("1. Sealed run {RUN}");

    // -------------------------------------------------------------------------
    // 2. Open it through the union store
    // -------------------------------------------------------------------------
    let store = Arc::new(UnionStore::builder(root.path(), CONTAINER).build()?);
    let run = RunView::open(&store, RUN)?;
    let loss = run.metric("loss");

    println!("\n2. Metrics: {:?}", run.metric_names()?);
    println!("   len()   = {}", loss.len()?);
    println!("   first() = {:?}", loss.first()?);
    println!("   last()  = {:?}", loss.last()?);

    // -------------------------------------------------------------------------
    // 3. Slicing
    // -------------------------------------------------------------------------
    println!("\n3. Slices");
    let positional: Vec<u64> = loss
        .items_slice(Slice::new(0, 5), SliceBy::Index)?
        .map(|item| item.map(|(step, _)| step))
        .collect::<shardview::Result<_>>()?;
    println!("   first 5 items by position: {positional:?}");

    let by_step: Vec<u64> = loss
        .items_slice(Slice::new(700, 1_400).step(100), SliceBy::Step)?
        .map(|item| item.map(|(step, _)| step))
        .collect::<shardview::Result<_>>()?;
    println!("   steps 700..1400 every 100: {by_step:?}");

    // -------------------------------------------------------------------------
    // 4. Decimated range for plotting
    // -------------------------------------------------------------------------
    println!("\n4. 8 samples over the whole run");
    for (step, value) in loss.items_in_range(0, 2_000, Some(8))? {
        println!("   step {step:>5}: {value}");
    }

    println!("\nDone.");
    Ok(())
}
