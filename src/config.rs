//! Cache configuration.

/// Retention capacity used when none is configured.
pub const DEFAULT_RETENTION_CAPACITY: usize = 50;

/// Settings for [`EntriesCache::init`](crate::EntriesCache::init).
///
/// `retention_capacity` is only the starting value; it can be changed at
/// any time through [`EntriesCache::set_capacity`](crate::EntriesCache::set_capacity).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CacheConfig {
    /// How many recently loaded entries the cache keeps alive on its own.
    pub retention_capacity: usize,
}

impl CacheConfig {
    pub fn with_retention_capacity(mut self, capacity: usize) -> Self {
        self.retention_capacity = capacity;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retention_capacity: DEFAULT_RETENTION_CAPACITY,
        }
    }
}
