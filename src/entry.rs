//! `EntryRef`: the shared handle to a cached entry.
//!
//! Each loaded entry lives in one `Arc<EntryCell<T>>`. Every `EntryRef` and
//! every retention slot holds a strong count; the registry holds only a
//! `Weak`. When the last strong count is released, `EntryCell::drop` first
//! unlinks the registry mapping under the registry lock and only then lets
//! the value be destroyed, so a fresh lookup can never reach an entry whose
//! destruction has begun.

use crate::key::EntryKey;
use crate::registry::Registry;
use crate::slot_index::Slot;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use std::sync::{Arc, Weak};

pub(crate) struct EntryCell<T> {
    pub(crate) key: EntryKey,
    /// Registry slot this entry was registered under. A newer entry for the
    /// same key always gets a different slot generation.
    pub(crate) slot: Slot,
    pub(crate) registry: Weak<Registry<T>>,
    pub(crate) value: T,
}

impl<T> Drop for EntryCell<T> {
    fn drop(&mut self) {
        // Unlink before `value` is dropped. After shutdown there is no
        // registry left to update.
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.key, self.slot);
        }
    }
}

/// A counted reference to a live cached entry.
///
/// Cloning increments the entry's count; dropping decrements it. Dropping
/// the last reference (including the cache's own retention slot) removes
/// the entry from the registry and destroys it. Two `EntryRef`s are equal
/// iff they point at the same entry instance.
pub struct EntryRef<T> {
    cell: Arc<EntryCell<T>>,
}

impl<T> EntryRef<T> {
    pub(crate) fn from_cell(cell: Arc<EntryCell<T>>) -> Self {
        Self { cell }
    }

    /// The identifying key this entry was loaded for.
    pub fn key(&self) -> EntryKey {
        self.cell.key
    }

    /// Number of owners currently keeping this entry alive: outstanding
    /// `EntryRef`s plus the retention slot, if any.
    pub fn holders(this: &Self) -> usize {
        Arc::strong_count(&this.cell)
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.cell, &other.cell)
    }

    #[cfg(test)]
    pub(crate) fn cell_slot(&self) -> Slot {
        self.cell.slot
    }
}

impl<T> Clone for EntryRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Deref for EntryRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.cell.value
    }
}

impl<T> PartialEq for EntryRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for EntryRef<T> {}

impl<T> Hash for EntryRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.cell) as usize).hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for EntryRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("key", &self.cell.key)
            .field("value", &self.cell.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Registry, Resolved};
    use std::collections::hash_map::DefaultHasher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DropCounter<'a>(&'a AtomicUsize);

    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn load_one<T>(registry: &Arc<Registry<T>>, key: EntryKey, value: T) -> EntryRef<T> {
        match registry.resolve(key, |_| Ok(Some(value))) {
            Ok(Resolved::Loaded(entry)) => entry,
            _ => panic!("expected a fresh load"),
        }
    }

    /// The value is destroyed exactly when the last clone is dropped, and
    /// never earlier.
    #[test]
    fn last_clone_destroys_value() {
        let drops = AtomicUsize::new(0);
        let registry = Registry::new();
        let a = load_one(&registry, EntryKey::new(1, 1), DropCounter(&drops));
        let b = a.clone();
        let c = b.clone();
        assert_eq!(EntryRef::holders(&a), 3);

        drop(a);
        drop(c);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert!(registry.contains(EntryKey::new(1, 1)));

        drop(b);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(!registry.contains(EntryKey::new(1, 1)));
        assert_eq!(registry.len(), 0);
    }

    /// Equality and hashing follow instance identity, not value equality.
    #[test]
    fn equality_is_identity() {
        let registry = Registry::new();
        let a = load_one(&registry, EntryKey::new(1, 1), 5);
        let a2 = a.clone();
        let b = load_one(&registry, EntryKey::new(1, 2), 5);

        assert_eq!(a, a2);
        assert_ne!(a, b, "same value, different entries");
        assert_eq!(*a, *b);

        let hash = |r: &EntryRef<i32>| {
            let mut h = DefaultHasher::new();
            r.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&a2));
    }

    /// Handles that outlive their registry still read and drop cleanly.
    #[test]
    fn handle_outlives_registry() {
        let drops = AtomicUsize::new(0);
        let registry = Registry::new();
        let a = load_one(&registry, EntryKey::new(3, 3), DropCounter(&drops));
        drop(registry);
        assert_eq!(a.key(), EntryKey::new(3, 3));
        drop(a);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
