//! The static asset cache.
//!
//! Cache-first, time-boxed caching of a fixed set of application assets so
//! the app still loads offline. Entries live on disk under a versioned
//! cache name; activating a new version evicts every older one. Nothing in
//! here is allowed to block capture or store operations; callers treat
//! every call as best-effort.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{info, warn};

use crate::error::CacheError;

/// Current cache version. Bump this to invalidate everything on activation.
pub const DEFAULT_CACHE_NAME: &str = "whereismy-v1";

/// Cached copies older than this are considered stale and refetched.
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(60);

/// The fixed set of assets worth prefetching for offline load.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/app.js",
    "/styles.css",
    "/manifest.json",
];

/// Stand-in for the network. Implementations fetch an asset by its path.
pub trait AssetFetcher {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, CacheError>;
}

/// Disk-backed, versioned asset cache over an [`AssetFetcher`].
pub struct AssetCache<F> {
    name: String,
    root: PathBuf,
    dir: PathBuf,
    fetcher: F,
    max_age: Duration,
}

impl<F: AssetFetcher> AssetCache<F> {
    /// Cache under the platform cache directory,
    /// `~/.cache/whereismy/<name>` on Linux.
    pub fn new(fetcher: F) -> Result<Self, CacheError> {
        let mut root = dirs::cache_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| CacheError::FetchFailed("no cache directory available".into()))?;
        root.push("whereismy");
        Self::with_root(DEFAULT_CACHE_NAME, root, fetcher)
    }

    /// Cache under `root/name`. The directory is created up front.
    pub fn with_root(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        fetcher: F,
    ) -> Result<Self, CacheError> {
        let name = name.into();
        let root = root.into();
        let dir = root.join(&name);
        fs::create_dir_all(&dir)?;

        Ok(Self {
            name,
            root,
            dir,
            fetcher,
            max_age: CACHE_MAX_AGE,
        })
    }

    /// Override the freshness window. Mostly for tests.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Prefetch every listed static asset. Opportunistic: individual
    /// failures are logged and skipped. Returns how many were cached.
    pub fn install(&self) -> usize {
        let mut cached = 0;
        for path in STATIC_ASSETS {
            match self.fetcher.fetch(path) {
                Ok(bytes) => match fs::write(self.entry_path(path), &bytes) {
                    Ok(()) => cached += 1,
                    Err(e) => warn!("could not cache {}: {}", path, e),
                },
                Err(e) => warn!("could not prefetch {}: {}", path, e),
            }
        }
        info!("cache {} installed, {} assets", self.name, cached);
        cached
    }

    /// Serve an asset, cache-first.
    ///
    /// A cached copy younger than the max age is served without fetching.
    /// Otherwise the asset is fetched and the cache refreshed; when the
    /// fetch fails but any cached copy exists, the stale copy is served so
    /// the application still loads offline.
    pub fn get(&self, path: &str) -> Result<Vec<u8>, CacheError> {
        let file = self.entry_path(path);

        if let Some(age) = entry_age(&file) {
            if age < self.max_age {
                return Ok(fs::read(&file)?);
            }
        }

        match self.fetcher.fetch(path) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&file, &bytes) {
                    warn!("could not cache {}: {}", path, e);
                }
                Ok(bytes)
            }
            Err(err) => {
                if file.exists() {
                    warn!("fetch failed for {}, serving stale copy: {}", path, err);
                    Ok(fs::read(&file)?)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Evict sibling caches left behind by previous versions. Returns how
    /// many were deleted.
    pub fn activate(&self) -> Result<usize, CacheError> {
        let mut evicted = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if entry.file_name().to_string_lossy() != self.name {
                info!("deleting old cache {}", entry.file_name().to_string_lossy());
                fs::remove_dir_all(entry.path())?;
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    /// Flatten an asset path into a file name inside the cache directory.
    fn entry_path(&self, path: &str) -> PathBuf {
        let trimmed = path.trim_start_matches('/');
        let name: String = if trimmed.is_empty() {
            "index".to_string()
        } else {
            trimmed
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect()
        };
        self.dir.join(name)
    }
}

fn entry_age(file: &Path) -> Option<Duration> {
    let modified = fs::metadata(file).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeFetcher {
        offline: AtomicBool,
        fetches: AtomicUsize,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                offline: AtomicBool::new(false),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl AssetFetcher for FakeFetcher {
        fn fetch(&self, path: &str) -> Result<Vec<u8>, CacheError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(CacheError::FetchFailed("network unreachable".into()));
            }
            Ok(format!("content of {}", path).into_bytes())
        }
    }

    fn temp_root(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("whereismy-cache-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&path);
        path
    }

    #[test]
    fn test_fresh_hit_skips_fetcher() {
        let root = temp_root("fresh");
        let cache = AssetCache::with_root("whereismy-v1", &root, FakeFetcher::new()).unwrap();

        let first = cache.get("/app.js").unwrap();
        let second = cache.get("/app.js").unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.fetcher.fetch_count(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_stale_entry_refetches() {
        let root = temp_root("stale");
        let cache = AssetCache::with_root("whereismy-v1", &root, FakeFetcher::new())
            .unwrap()
            .with_max_age(Duration::ZERO);

        cache.get("/app.js").unwrap();
        cache.get("/app.js").unwrap();
        assert_eq!(cache.fetcher.fetch_count(), 2);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_failed_fetch_falls_back_to_stale_copy() {
        let root = temp_root("offline");
        let cache = AssetCache::with_root("whereismy-v1", &root, FakeFetcher::new())
            .unwrap()
            .with_max_age(Duration::ZERO);

        let cached = cache.get("/index.html").unwrap();
        cache.fetcher.offline.store(true, Ordering::SeqCst);

        let served = cache.get("/index.html").unwrap();
        assert_eq!(served, cached);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_miss_with_failed_fetch_is_an_error() {
        let root = temp_root("miss");
        let cache = AssetCache::with_root("whereismy-v1", &root, FakeFetcher::new()).unwrap();
        cache.fetcher.offline.store(true, Ordering::SeqCst);

        let result = cache.get("/styles.css");
        assert!(matches!(result, Err(CacheError::FetchFailed(_))));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_install_prefetches_everything() {
        let root = temp_root("install");
        let cache = AssetCache::with_root("whereismy-v1", &root, FakeFetcher::new()).unwrap();

        assert_eq!(cache.install(), STATIC_ASSETS.len());

        // Everything should now be served from cache, even offline.
        cache.fetcher.offline.store(true, Ordering::SeqCst);
        for path in STATIC_ASSETS {
            cache.get(path).unwrap();
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_activate_evicts_old_versions() {
        let root = temp_root("activate");
        fs::create_dir_all(root.join("whereismy-v0")).unwrap();
        fs::write(root.join("whereismy-v0").join("app.js"), b"old").unwrap();

        let cache = AssetCache::with_root("whereismy-v1", &root, FakeFetcher::new()).unwrap();
        let evicted = cache.activate().unwrap();

        assert_eq!(evicted, 1);
        assert!(!root.join("whereismy-v0").exists());
        assert!(root.join("whereismy-v1").exists());

        let _ = fs::remove_dir_all(&root);
    }
}
