//! Time-bounded cache for the scored dataset.
//!
//! The front-end reads the scored dataset on every view but the file only
//! changes when the pipeline reruns. [`DatasetCache`] holds the last load
//! for a time-to-live and can be invalidated explicitly after a rerun. It
//! is `Sync`, so one instance can be shared behind an `Arc` or a static.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

use crate::{DataError, ScoredRecord, read_scored};

/// Default time-to-live of a cached dataset.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct Entry<T> {
    loaded_at: Instant,
    value: Arc<T>,
}

/// Caches one loaded value for a fixed time-to-live.
#[derive(Debug)]
pub struct DatasetCache<T> {
    ttl: Duration,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T> Default for DatasetCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T> DatasetCache<T> {
    /// Create an empty cache whose entries expire after `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Time-to-live of cached entries.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value, loading it with `load` when absent or stale.
    ///
    /// # Errors
    /// Propagates the error returned by `load`; the previous entry, if any,
    /// is kept so a later call can retry.
    pub fn get_or_load<F, E>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.get_or_load_at(Instant::now(), load)
    }

    /// [`DatasetCache::get_or_load`] with an explicit clock reading.
    ///
    /// # Errors
    /// Propagates the error returned by `load`.
    pub fn get_or_load_at<F, E>(&self, now: Instant, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut entry = self.lock();
        if let Some(cached) = entry.as_ref() {
            if now.saturating_duration_since(cached.loaded_at) < self.ttl {
                return Ok(Arc::clone(&cached.value));
            }
            debug!("cached dataset expired");
        }
        let value = Arc::new(load()?);
        *entry = Some(Entry {
            loaded_at: now,
            value: Arc::clone(&value),
        });
        Ok(value)
    }

    /// Drop the cached entry so the next read reloads.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    /// Whether an entry is cached and still fresh at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|cached| now.saturating_duration_since(cached.loaded_at) < self.ttl)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Entry<T>>> {
        // The guarded state is replaced wholesale, so a poisoned lock is still consistent.
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`DatasetCache`] bound to a scored dataset on disk.
#[derive(Debug)]
pub struct ScoredDatasetCache {
    path: Utf8PathBuf,
    cache: DatasetCache<Vec<ScoredRecord>>,
}

impl ScoredDatasetCache {
    /// Cache the dataset at `path` for `ttl`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            cache: DatasetCache::new(ttl),
        }
    }

    /// Dataset location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The scored dataset, read from disk at most once per time-to-live.
    ///
    /// # Errors
    /// Returns [`read_scored`] errors.
    pub fn records(&self) -> Result<Arc<Vec<ScoredRecord>>, DataError> {
        self.cache.get_or_load(|| read_scored(&self.path))
    }

    /// Force the next [`ScoredDatasetCache::records`] call to reread the file.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
