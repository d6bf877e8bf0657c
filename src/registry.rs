//! Registry: the non-owning key -> entry map and its creation/removal paths.
//!
//! Invariants
//! - At most one mapping per key; a mapping whose `Weak` still upgrades is
//!   the single live entry for that key.
//! - Lookup, load-and-register, and unlink all run under the one registry
//!   lock, so creation for a key is serialized and a lookup never observes a
//!   mapping whose entry is being destroyed.
//! - A mapping is only removed through the slot it was registered under. An
//!   entry that dies after a newer entry took its key finds its slot stale
//!   and leaves the newer mapping alone.
//! - No entry value is dropped while the lock is held.

use crate::entry::{EntryCell, EntryRef};
use crate::error::{InsertError, LoadError};
use crate::key::EntryKey;
use crate::reentrancy::{DebugReentrancy, ReentrancyGuard};
use crate::slot_index::{Slot, SlotIndex};
use crate::stats::Counters;
use core::ops::{Deref, DerefMut};
use parking_lot::{Mutex, MutexGuard};
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace};

type Index<T> = SlotIndex<EntryKey, Weak<EntryCell<T>>>;

pub(crate) struct Registry<T> {
    index: Mutex<Index<T>>,
    reentrancy: DebugReentrancy,
    pub(crate) counters: Counters,
}

/// Outcome of a registry lookup that may load.
pub(crate) enum Resolved<T> {
    /// The key was already live.
    Hit(EntryRef<T>),
    /// The loader produced a new entry, now registered.
    Loaded(EntryRef<T>),
    /// The loader has no record for the key.
    NotFound,
}

// Field order matters: the holder mark is cleared before the mutex unlocks.
struct Locked<'a, T> {
    _holder: ReentrancyGuard<'a>,
    index: MutexGuard<'a, Index<T>>,
}

impl<T> Deref for Locked<'_, T> {
    type Target = Index<T>;
    fn deref(&self) -> &Index<T> {
        &self.index
    }
}

impl<T> DerefMut for Locked<'_, T> {
    fn deref_mut(&mut self) -> &mut Index<T> {
        &mut self.index
    }
}

#[cold]
fn duplicate_registration(key: EntryKey) -> ! {
    error!(%key, "entry registered twice; registry lock discipline was broken");
    panic!("entry {key} is already registered");
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            index: Mutex::new(SlotIndex::new()),
            reentrancy: DebugReentrancy::new(),
            counters: Counters::default(),
        })
    }

    fn lock(&self) -> Locked<'_, T> {
        self.reentrancy.check();
        let index = self.index.lock();
        Locked {
            _holder: self.reentrancy.enter(),
            index,
        }
    }

    /// Return the live entry for `key`. A mapping whose entry can no longer
    /// be upgraded is mid-deletion; it is dropped here and treated as absent.
    fn live(index: &mut Locked<'_, T>, key: EntryKey) -> Option<EntryRef<T>> {
        let slot = index.find(&key)?;
        let upgraded = index.get(slot).and_then(Weak::upgrade);
        match upgraded {
            Some(cell) => Some(EntryRef::from_cell(cell)),
            None => {
                trace!(%key, "dropping mapping of an entry pending deletion");
                index.remove(slot);
                None
            }
        }
    }

    /// Look up `key` without loading.
    pub(crate) fn lookup(&self, key: EntryKey) -> Option<EntryRef<T>> {
        let mut index = self.lock();
        Self::live(&mut index, key)
    }

    /// Look up `key`, calling `load` on a miss. The lock is held across the
    /// load so concurrent misses for one key produce a single entry.
    pub(crate) fn resolve<F>(
        self: &Arc<Self>,
        key: EntryKey,
        load: F,
    ) -> Result<Resolved<T>, LoadError>
    where
        F: FnOnce(EntryKey) -> Result<Option<T>, LoadError>,
    {
        let mut index = self.lock();
        if let Some(entry) = Self::live(&mut index, key) {
            self.counters.hit();
            trace!(%key, "registry hit");
            return Ok(Resolved::Hit(entry));
        }

        self.counters.miss();
        let value = match load(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                self.counters.not_found();
                debug!(%key, "no record for entry");
                return Ok(Resolved::NotFound);
            }
            Err(e) => {
                self.counters.load_failed();
                return Err(e);
            }
        };

        let registry = Arc::downgrade(self);
        let cell = Arc::new_cyclic(|weak| {
            let slot = match index.insert(key, weak.clone()) {
                Ok(slot) => slot,
                Err(InsertError::DuplicateKey) => duplicate_registration(key),
            };
            EntryCell {
                key,
                slot,
                registry,
                value,
            }
        });
        drop(index);

        self.counters.loaded();
        debug!(%key, "entry loaded");
        Ok(Resolved::Loaded(EntryRef::from_cell(cell)))
    }

    /// Unlink a dying entry. Runs from `EntryCell::drop` once its last owner
    /// is gone; the entry's value is destroyed after this returns.
    pub(crate) fn unregister(&self, key: EntryKey, slot: Slot) {
        let removed = {
            let mut index = self.lock();
            index.remove(slot)
        };
        self.counters.deleted();
        match removed {
            Some(_) => debug!(%key, "entry unregistered"),
            None => debug!(%key, "entry mapping already replaced"),
        }
    }

    /// True if `key` maps to an entry that is still alive.
    pub(crate) fn contains(&self, key: EntryKey) -> bool {
        let index = self.lock();
        let alive = index
            .find(&key)
            .and_then(|slot| index.get(slot))
            .map(|weak| weak.strong_count() > 0)
            .unwrap_or(false);
        alive
    }

    /// Number of registered mappings, including any whose entry is in the
    /// middle of being deleted.
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
