//! Identifying keys for cached entries.

use core::fmt;

/// Identity of a persisted record: its entry type and its id within that type.
///
/// Unique per logical entry across the process; ordering is by type, then id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EntryKey {
    pub entry_type: i32,
    pub id: i32,
}

impl EntryKey {
    pub const fn new(entry_type: i32, id: i32) -> Self {
        Self { entry_type, id }
    }
}

impl From<(i32, i32)> for EntryKey {
    fn from((entry_type, id): (i32, i32)) -> Self {
        Self::new(entry_type, id)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entry_type, self.id)
    }
}
