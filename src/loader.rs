//! The backing loader seam.

use crate::error::LoadError;
use crate::key::EntryKey;

/// Materializes entries from persistent storage.
///
/// Called at most once per cache miss, with the registry lock held and never
/// with the retention lock held. Must not call back into the cache that owns
/// it. Return `Ok(None)` when no record exists for `key`.
pub trait Loader<T> {
    fn load(&self, key: EntryKey) -> Result<Option<T>, LoadError>;
}

impl<T, F> Loader<T> for F
where
    F: Fn(EntryKey) -> Result<Option<T>, LoadError>,
{
    fn load(&self, key: EntryKey) -> Result<Option<T>, LoadError> {
        self(key)
    }
}
