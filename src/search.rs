//! Filter collaborator seam.

use crate::key::EntryKey;

/// Turns caller-supplied filter text into an ordered list of keys.
///
/// The filter grammar and how keys are found belong to the implementor; the
/// cache only resolves the keys it is given.
pub trait KeySource {
    type Error;

    fn matching_keys(&self, filter: &str) -> Result<Vec<EntryKey>, Self::Error>;
}
