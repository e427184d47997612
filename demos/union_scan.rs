//! Union Scan Demo
//!
//! Builds a container with two sealed chunks and an index shard, then
//! scans the union and shows which shard answers each key.
//!
//! Run with: `RUST_LOG=shardview=debug cargo run --example union_scan`

use shardview::encoding::{decode_component, encode_path, PathComponent};
use shardview::store::{Cursor, Segment, SortedStore};
use shardview::union::UnionStore;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const CONTAINER: &str = "meta";

fn key(shard: &str, idx: u64) -> Vec<u8> {
    encode_path(&[
        PathComponent::from(CONTAINER),
        PathComponent::from("chunks"),
        PathComponent::from(shard),
        PathComponent::Index(idx),
    ])
}

fn write_shard(dir: &Path, rows: &[(Vec<u8>, &str)]) -> anyhow::Result<()> {
    Segment::from_entries(rows.iter().map(|(k, v)| (k.clone(), v.as_bytes().to_vec())))
        .write(dir, "000.parquet")?;
    Ok(())
}

/// Render an encoded key as `a/b/#3`
fn render(mut key: &[u8]) -> String {
    let mut parts = Vec::new();
    while !key.is_empty() {
        match decode_component(key) {
            Ok((PathComponent::Name(name), rest)) => {
                parts.push(name);
                key = rest;
            }
            Ok((PathComponent::Index(idx), rest)) => {
                parts.push(format!("#{idx}"));
                key = rest;
            }
            Err(_) => break,
        }
    }
    parts.join("/")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== shardview union scan ===\n");

    let root = tempfile::tempdir()?;
    let base = root.path().join(CONTAINER);

    // -------------------------------------------------------------------------
    // 1. Lay out shards
    // -------------------------------------------------------------------------
    println!("1. Writing shards...");
    write_shard(&base.join("chunks").join("a"), &[(key("a", 1), "x"), (key("a", 2), "y")])?;
    write_shard(&base.join("chunks").join("b"), &[(key("b", 5), "z")])?;
    write_shard(&base.join("index"), &[(key("a", 2), "y2"), (key("a", 3), "w")])?;
    std::fs::create_dir_all(base.join("progress"))?;
    for name in ["a", "b"] {
        std::fs::write(base.join("progress").join(name), b"")?;
    }
    println!("   chunks/a = {{1: x, 2: y}}");
    println!("   chunks/b = {{5: z}}");
    println!("   index    = {{2: y2, 3: w}}");

    // -------------------------------------------------------------------------
    // 2. Scan the union
    // -------------------------------------------------------------------------
    println!("\n2. Scanning union...");
    let store = UnionStore::builder(root.path(), CONTAINER).build()?;
    println!("   Shards: {:?}", store.shards()?.names());

    let mut cursor = store.union_cursor()?;
    cursor.seek_to_first()?;
    while let Some((k, v)) = cursor.current() {
        let owner = match cursor.current_domain() {
            Some([]) => "index".to_string(),
            Some(domain) => render(domain),
            None => "-".to_string(),
        };
        println!(
            "   {:<24} = {:<4} (from {owner})",
            render(k),
            String::from_utf8_lossy(v)
        );
        cursor.next()?;
    }

    // -------------------------------------------------------------------------
    // 3. Point reads and seeks
    // -------------------------------------------------------------------------
    println!("\n3. Point reads...");
    for (shard, idx) in [("a", 2), ("a", 1), ("b", 9)] {
        match store.get(&key(shard, idx)) {
            Ok(v) => println!("   get {shard}/#{idx} = {}", String::from_utf8_lossy(&v)),
            Err(e) => println!("   get {shard}/#{idx} -> {e}"),
        }
    }

    cursor.seek_for_prev(&key("a", 99))?;
    if let Some((k, _)) = cursor.current() {
        println!("   seek_for_prev(a/#99) -> {}", render(k));
    }

    println!("\nDone.");
    Ok(())
}
