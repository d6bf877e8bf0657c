//! EntriesCache: the entry point consumers load entries through.

use crate::config::CacheConfig;
use crate::entry::EntryRef;
use crate::error::CacheError;
use crate::key::EntryKey;
use crate::loader::Loader;
use crate::registry::{Registry, Resolved};
use crate::retention::RetentionQueue;
use crate::search::KeySource;
use crate::stats::CacheStats;
use std::sync::Arc;
use tracing::{info, warn};

/// Identity cache over a backing loader.
///
/// Guarantees one live instance per [`EntryKey`]: every consumer asking for
/// the same key while it is loaded gets an [`EntryRef`] to the same entry.
/// The most recently loaded entries (up to the retention capacity) are kept
/// alive by the cache itself so they survive short gaps with no consumer.
///
/// Construct one with [`init`](Self::init), share it (typically behind an
/// `Arc`), and end it with [`shutdown`](Self::shutdown).
pub struct EntriesCache<T, L> {
    retention: RetentionQueue<T>,
    registry: Arc<Registry<T>>,
    loader: L,
}

impl<T, L> EntriesCache<T, L>
where
    L: Loader<T>,
{
    pub fn init(loader: L, config: CacheConfig) -> Self {
        info!(
            retention_capacity = config.retention_capacity,
            "entries cache initialized"
        );
        Self {
            retention: RetentionQueue::new(config.retention_capacity),
            registry: Registry::new(),
            loader,
        }
    }

    /// Return the entry for `key`, loading it if no instance is live.
    ///
    /// `None` when the loader has no such record or fails; failures are
    /// logged and never retried here. Use [`try_get`](Self::try_get) to
    /// tell the two apart.
    pub fn get(&self, key: impl Into<EntryKey>) -> Option<EntryRef<T>> {
        self.try_get(key).ok().flatten()
    }

    /// Like [`get`](Self::get), but reports loader failures.
    pub fn try_get(
        &self,
        key: impl Into<EntryKey>,
    ) -> Result<Option<EntryRef<T>>, CacheError> {
        let key = key.into();
        let resolved = self
            .registry
            .resolve(key, |k| self.loader.load(k))
            .map_err(|source| {
                warn!(%key, error = %source, "failed to load entry");
                CacheError::Load { key, source }
            })?;
        match resolved {
            Resolved::Hit(entry) => Ok(Some(entry)),
            Resolved::Loaded(entry) => {
                // Registry lock is already released here.
                let evicted = self.retention.push(entry.clone());
                self.registry.counters.evicted(evicted);
                Ok(Some(entry))
            }
            Resolved::NotFound => Ok(None),
        }
    }

    /// Resolve every key `source` yields for `filter`, in order. Keys that
    /// are missing or fail to load are skipped.
    pub fn get_matching<S>(
        &self,
        source: &S,
        filter: &str,
    ) -> Result<Vec<EntryRef<T>>, S::Error>
    where
        S: KeySource + ?Sized,
    {
        let keys = source.matching_keys(filter)?;
        Ok(keys.into_iter().filter_map(|key| self.get(key)).collect())
    }
}

impl<T, L> EntriesCache<T, L> {
    /// Return the live entry for `key` if there is one, without loading.
    pub fn peek(&self, key: impl Into<EntryKey>) -> Option<EntryRef<T>> {
        self.registry.lookup(key.into())
    }

    /// True if an instance for `key` is currently live.
    pub fn contains(&self, key: impl Into<EntryKey>) -> bool {
        self.registry.contains(key.into())
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.retention.capacity()
    }

    /// Change the retention capacity. Takes effect on the next load; entries
    /// already retained beyond the new capacity stay until then.
    pub fn set_capacity(&self, capacity: usize) {
        self.retention.set_capacity(capacity);
    }

    /// Number of entries the cache itself is currently keeping alive.
    pub fn retained(&self) -> usize {
        self.retention.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.registry.counters.snapshot()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Release all retained entries and tear the cache down.
    ///
    /// Entries still referenced elsewhere stay readable; they are destroyed
    /// when their last `EntryRef` is dropped.
    pub fn shutdown(self) -> CacheStats {
        let released = self.retention.clear();
        let stats = self.stats();
        info!(
            released,
            still_live = self.registry.len(),
            hits = stats.hits,
            misses = stats.misses,
            loads = stats.loads,
            evictions = stats.evictions,
            "entries cache shut down"
        );
        stats
    }
}
