//! Error types surfaced by loaders, the slot index and the cache facade.

use crate::key::EntryKey;
use thiserror::Error;

/// Failure reported by a [`Loader`](crate::Loader) while materializing an entry.
///
/// A missing record is not an error; loaders report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The backing storage could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The persisted record exists but could not be decoded.
    #[error("record {key} is corrupt: {reason}")]
    Corrupt {
        /// Key of the unreadable record.
        key: EntryKey,
        /// What was wrong with it.
        reason: String,
    },

    /// Any other loader-specific failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by [`EntriesCache::try_get`](crate::EntriesCache::try_get).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The loader failed for this key. Nothing was registered; the next
    /// lookup for the key calls the loader again.
    #[error("failed to load entry {key}")]
    Load {
        key: EntryKey,
        #[source]
        source: LoadError,
    },
}

/// Insertion into the slot index failed.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum InsertError {
    #[error("key is already present")]
    DuplicateKey,
}
