//! Lazy resolution cache keyed by file paths.
//!
//! # Design
//! - The filesystem is the index: an entry exists iff its file exists.
//! - In lazy mode an existing entry is returned without calling `fetch`; otherwise
//!   `fetch` runs and its result is persisted (whole-file replace) before it is returned.
//! - No locking. Concurrent cold resolutions of one key may both fetch; the last
//!   rename wins and no reader sees a partial file.

use std::fs;
use std::path::{Path, PathBuf};

use medley_fsops::write_atomic;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};

/// Fetch-or-reuse policy over path-keyed cache entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolutionCache {
    lazy: bool,
}

impl ResolutionCache {
    /// Build a cache with a fixed reuse policy.
    #[must_use]
    pub const fn new(lazy: bool) -> Self {
        Self { lazy }
    }

    /// Whether existing entries are reused.
    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Resolve a structured entry stored as JSON at `key`.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged, or a persistence/deserialisation error.
    /// Nothing is written when `fetch` fails.
    pub fn resolve<T, F>(&self, key: &Path, fetch: F) -> MetadataResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> MetadataResult<T>,
    {
        if self.lazy && key.is_file() {
            debug!(key = %key.display(), "metadata cache hit");
            let raw = fs::read(key).map_err(|source| MetadataError::io("cache.read", key, source))?;
            return serde_json::from_slice(&raw)
                .map_err(|source| MetadataError::json("cache.decode", key, source));
        }

        debug!(key = %key.display(), lazy = self.lazy, "metadata cache miss");
        let value = fetch()?;
        let encoded = serde_json::to_vec_pretty(&value)
            .map_err(|source| MetadataError::json("cache.encode", key, source))?;
        persist(key, &encoded)?;
        Ok(value)
    }

    /// Resolve a raw binary entry at `key`, returning its path.
    ///
    /// In lazy mode an existing file short-circuits without being read.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged, or a persistence error.
    pub fn resolve_bytes<F>(&self, key: &Path, fetch: F) -> MetadataResult<PathBuf>
    where
        F: FnOnce() -> MetadataResult<Vec<u8>>,
    {
        if self.lazy && key.is_file() {
            debug!(key = %key.display(), "binary cache hit");
            return Ok(key.to_path_buf());
        }

        debug!(key = %key.display(), lazy = self.lazy, "binary cache miss");
        let bytes = fetch()?;
        persist(key, &bytes)?;
        Ok(key.to_path_buf())
    }
}

fn persist(key: &Path, bytes: &[u8]) -> MetadataResult<()> {
    write_atomic(key, bytes).map_err(|source| MetadataError::Persist {
        path: key.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn lazy_resolution_fetches_at_most_once() -> Result<()> {
        let temp = TempDir::new()?;
        let key = temp.path().join("movies/tt1.json");
        let cache = ResolutionCache::new(true);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok::<_, MetadataError>(vec!["a".to_string(), "b".to_string()])
        };

        let first: Vec<String> = cache.resolve(&key, fetch)?;
        let bytes_after_first = fs::read(&key)?;
        let second: Vec<String> = cache.resolve(&key, fetch)?;

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(fs::read(&key)?, bytes_after_first);
        Ok(())
    }

    #[test]
    fn eager_resolution_always_fetches_and_overwrites() -> Result<()> {
        let temp = TempDir::new()?;
        let key = temp.path().join("value.json");
        let cache = ResolutionCache::new(false);

        let first: u32 = cache.resolve(&key, || Ok(1))?;
        let second: u32 = cache.resolve(&key, || Ok(2))?;

        assert_eq!((first, second), (1, 2));
        assert_eq!(fs::read_to_string(&key)?, "2");
        Ok(())
    }

    #[test]
    fn fetch_failure_leaves_no_entry() -> Result<()> {
        let temp = TempDir::new()?;
        let key = temp.path().join("movies/tt9.json");
        let cache = ResolutionCache::new(true);

        let result: MetadataResult<u32> = cache.resolve(&key, || {
            Err(MetadataError::fetch("movie", "tt9", "offline".into()))
        });

        assert!(matches!(result, Err(MetadataError::Fetch { .. })));
        assert!(!key.exists());
        Ok(())
    }

    #[test]
    fn corrupt_entry_surfaces_decode_error() -> Result<()> {
        let temp = TempDir::new()?;
        let key = temp.path().join("bad.json");
        fs::write(&key, b"{")?;
        let cache = ResolutionCache::new(true);

        let result: MetadataResult<u32> = cache.resolve(&key, || Ok(5));
        assert!(matches!(
            result,
            Err(MetadataError::Json {
                operation: "cache.decode",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn binary_hit_skips_fetch() -> Result<()> {
        let temp = TempDir::new()?;
        let key = temp.path().join("imgs/tt1.jpg");
        let cache = ResolutionCache::new(true);

        let path = cache.resolve_bytes(&key, || Ok(vec![1, 2, 3, 4]))?;
        assert_eq!(fs::read(&path)?, vec![1, 2, 3, 4]);

        let again = cache.resolve_bytes(&key, || {
            Err(MetadataError::fetch("image", "p.jpg", "must not be called".into()))
        })?;
        assert_eq!(again, key);
        Ok(())
    }
}
