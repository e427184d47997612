//! Directory listings with a short time-to-live
//!
//! Union views are rebuilt often under repeated queries; the listing cache
//! bounds the number of `read_dir` calls to one per path per TTL window.

use crate::clock::Clock;
use crate::Result;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lists entry names of a directory
pub trait DirLister: Send + Sync {
    /// Names under `path`, sorted; empty if `path` does not exist
    ///
    /// # Errors
    /// IO failures other than a missing directory
    fn list(&self, path: &Path) -> Result<Vec<String>>;
}

/// Filesystem-backed lister
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLister;

impl DirLister for FsLister {
    fn list(&self, path: &Path) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Shared TTL cache of directory listings, keyed by path
pub struct ListingCache {
    lister: Arc<dyn DirLister>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: DashMap<PathBuf, (Instant, Arc<[String]>)>,
}

impl ListingCache {
    /// Create a cache over `lister`
    #[must_use]
    pub fn new(lister: Arc<dyn DirLister>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            lister,
            clock,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Listing of `path`, served from cache while fresh
    ///
    /// # Errors
    /// Propagates lister failures
    pub fn list(&self, path: &Path) -> Result<Arc<[String]>> {
        let now = self.clock.now();
        let fresh = self
            .entries
            .get(path)
            .filter(|entry| now.duration_since(entry.0) < self.ttl)
            .map(|entry| Arc::clone(&entry.1));
        if let Some(names) = fresh {
            return Ok(names);
        }

        let names: Arc<[String]> = self.lister.list(path)?.into();
        self.entries
            .insert(path.to_path_buf(), (now, Arc::clone(&names)));
        Ok(names)
    }

    /// Drop every cached listing
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Configured time-to-live
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingCache")
            .field("ttl", &self.ttl)
            .field("paths", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLister {
        calls: AtomicUsize,
    }

    impl DirLister for CountingLister {
        fn list(&self, _path: &Path) -> Result<Vec<String>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![format!("shard-{n}")])
        }
    }

    #[test]
    fn test_fs_lister_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let names = FsLister.list(&dir.path().join("missing")).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_fs_lister_sorts_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c", "a", "b"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        assert_eq!(FsLister.list(dir.path()).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cache_serves_within_ttl_and_refreshes_after() {
        let lister = Arc::new(CountingLister {
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new());
        let cache = ListingCache::new(lister.clone(), clock.clone(), Duration::from_millis(100));
        let path = Path::new("/runs/meta/chunks");

        assert_eq!(&*cache.list(path).unwrap(), &["shard-0".to_string()]);
        clock.advance(Duration::from_millis(99));
        assert_eq!(&*cache.list(path).unwrap(), &["shard-0".to_string()]);
        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_millis(1));
        assert_eq!(&*cache.list(path).unwrap(), &["shard-1".to_string()]);
        assert_eq!(lister.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_is_keyed_by_path() {
        let lister = Arc::new(CountingLister {
            calls: AtomicUsize::new(0),
        });
        let cache = ListingCache::new(
            lister.clone(),
            Arc::new(ManualClock::new()),
            Duration::from_millis(100),
        );

        cache.list(Path::new("/a")).unwrap();
        cache.list(Path::new("/b")).unwrap();
        cache.list(Path::new("/a")).unwrap();
        assert_eq!(lister.calls.load(Ordering::SeqCst), 2);

        cache.clear();
        cache.list(Path::new("/a")).unwrap();
        assert_eq!(lister.calls.load(Ordering::SeqCst), 3);
    }
}
