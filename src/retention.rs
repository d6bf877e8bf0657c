//! Retention queue: bounded FIFO of owning handles to recently loaded entries.
//!
//! Holding an `EntryRef` here keeps an entry alive after every consumer has
//! dropped theirs. Entries are pushed once, when they are loaded; hits do
//! not reorder the queue. Lowering the capacity takes effect on the next
//! push. Evicted handles are dropped only after the queue lock is released,
//! since dropping the last owner takes the registry lock.

use crate::entry::EntryRef;
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::trace;

pub(crate) struct RetentionQueue<T> {
    slots: Mutex<VecDeque<EntryRef<T>>>,
    capacity: AtomicUsize,
}

impl<T> RetentionQueue<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(VecDeque::new()),
            capacity: AtomicUsize::new(capacity),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    pub(crate) fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity, Ordering::Relaxed);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Append `entry` and trim the oldest slots down to the current capacity.
    /// Returns how many slots were evicted.
    pub(crate) fn push(&self, entry: EntryRef<T>) -> usize {
        let capacity = self.capacity();
        let evicted: Vec<EntryRef<T>> = {
            let mut slots = self.slots.lock();
            slots.push_back(entry);
            let excess = slots.len().saturating_sub(capacity);
            slots.drain(..excess).collect()
        };
        let n = evicted.len();
        if n > 0 {
            trace!(evicted = n, capacity, "retention queue trimmed");
        }
        n
    }

    /// Release every slot. Returns how many were held.
    pub(crate) fn clear(&self) -> usize {
        let released = core::mem::take(&mut *self.slots.lock());
        released.len()
    }

    #[cfg(test)]
    fn keys(&self) -> Vec<crate::EntryKey> {
        self.slots.lock().iter().map(EntryRef::key).collect()
    }
}
