use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use crate::error::WisdomError;
use crate::sources::{parse_sources, Source};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub type SourceMap = BTreeMap<String, Source>;

#[derive(Debug, Clone)]
struct CacheEntry {
    modified: Option<SystemTime>,
    loaded_at: Instant,
    sources: Arc<SourceMap>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Parsed `sources.json` files keyed by path.
///
/// An entry is served while it is younger than the TTL and the file's
/// modification time is unchanged; otherwise the file is read again.
/// A file that fails to parse is reported once and then cached as an
/// empty map until it changes.
#[derive(Debug)]
pub struct SourceCache {
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    stats: Mutex<CacheStats>,
}

impl SourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn load(&self, path: &Path) -> Result<Arc<SourceMap>, WisdomError> {
        let io_err = |source| WisdomError::Io {
            path: path.to_path_buf(),
            source,
        };
        let metadata = match fs::metadata(path) {
            Ok(v) => v,
            Err(err) => {
                self.entries.lock().remove(path);
                return Err(io_err(err));
            }
        };
        let modified = metadata.modified().ok();

        if let Some(entry) = self.entries.lock().get(path) {
            if entry.modified == modified && entry.loaded_at.elapsed() < self.ttl {
                self.stats.lock().hits += 1;
                return Ok(Arc::clone(&entry.sources));
            }
        }
        self.stats.lock().misses += 1;

        let raw = fs::read_to_string(path).map_err(io_err)?;
        let (sources, failure) = match parse_sources(&raw) {
            Ok((sources, rejected)) => {
                for err in rejected {
                    tracing::warn!(path = %path.display(), "skipping source: {err}");
                }
                (sources, None)
            }
            Err(err) => (SourceMap::new(), Some(err)),
        };
        let sources = Arc::new(sources);
        self.entries.lock().insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                loaded_at: Instant::now(),
                sources: Arc::clone(&sources),
            },
        );
        match failure {
            None => Ok(sources),
            Some(source) => Err(WisdomError::Parse {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;

    const ONE_SOURCE: &str = r#"{"version":"1.0","sources":{"team":{"name":"Team","icon":"👥","quotes":{"middle_aeons":[{"quote":"Reviews make us better.","source":"Team","encouragement":"Keep reviewing."}]}}}}"#;
    const TWO_SOURCES: &str = r#"{"version":"1.0","sources":{"team":{"name":"Team","icon":"👥","quotes":{"middle_aeons":[{"quote":"Reviews make us better.","source":"Team","encouragement":"Keep reviewing."}]}},"ops":{"name":"Ops","quotes":{"chaos":[{"quote":"Page me.","source":"Ops","encouragement":"Sleep later."}]}}}}"#;

    #[test]
    fn unchanged_file_is_served_from_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sources.json");
        fs::write(&path, ONE_SOURCE).expect("write sources");

        let cache = SourceCache::new(Duration::from_secs(60));
        let first = cache.load(&path).expect("first load");
        let second = cache.load(&path).expect("second load");
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn modified_file_is_read_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sources.json");
        fs::write(&path, ONE_SOURCE).expect("write sources");

        let cache = SourceCache::new(Duration::from_secs(60));
        assert_eq!(cache.load(&path).expect("first load").len(), 1);

        fs::write(&path, TWO_SOURCES).expect("rewrite sources");
        let later = SystemTime::now() + Duration::from_secs(120);
        File::options()
            .write(true)
            .open(&path)
            .and_then(|f| f.set_modified(later))
            .expect("bump mtime");

        assert_eq!(cache.load(&path).expect("second load").len(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn zero_ttl_always_reads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sources.json");
        fs::write(&path, ONE_SOURCE).expect("write sources");

        let cache = SourceCache::new(Duration::ZERO);
        let _ = cache.load(&path).expect("first load");
        let _ = cache.load(&path).expect("second load");
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn missing_and_malformed_files_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SourceCache::default();
        let missing = cache.load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(WisdomError::Io { .. })));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").expect("write bad");
        assert!(matches!(cache.load(&bad), Err(WisdomError::Parse { .. })));
    }

    #[test]
    fn malformed_file_is_reported_once_until_it_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sources.json");
        fs::write(&path, "{not json").expect("write bad");

        let cache = SourceCache::new(Duration::from_secs(60));
        assert!(matches!(cache.load(&path), Err(WisdomError::Parse { .. })));
        assert!(cache.load(&path).expect("cached failure").is_empty());
        assert!(cache.load(&path).expect("cached failure").is_empty());
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });

        fs::write(&path, ONE_SOURCE).expect("fix sources");
        let later = SystemTime::now() + Duration::from_secs(120);
        File::options()
            .write(true)
            .open(&path)
            .and_then(|f| f.set_modified(later))
            .expect("bump mtime");
        assert_eq!(cache.load(&path).expect("fixed").len(), 1);
    }
}
