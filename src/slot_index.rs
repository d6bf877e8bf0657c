//! SlotIndex: key-deduplicating storage addressed by generational slots.
//!
//! Values live in a `SlotMap`; a `HashTable` indexes them by key hash. The
//! slot returned on insert stays valid until that exact value is removed, and
//! a slot from an earlier generation never resolves to a later value stored
//! under the same key.

use crate::error::InsertError;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable, generational address of one stored value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Slot(DefaultKey);

#[derive(Debug)]
struct Stored<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub struct SlotIndex<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Stored<K, V>>,
}

impl<K, V> SlotIndex<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for SlotIndex<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> SlotIndex<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Slot>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| s.key.borrow() == q)
                    .unwrap_or(false)
            })
            .map(|&k| Slot(k))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// True while the value stored at `slot` has not been removed.
    pub fn contains_slot(&self, slot: Slot) -> bool {
        self.slots.contains_key(slot.0)
    }

    pub fn get(&self, slot: Slot) -> Option<&V> {
        self.slots.get(slot.0).map(|s| &s.value)
    }

    pub fn key(&self, slot: Slot) -> Option<&K> {
        self.slots.get(slot.0).map(|s| &s.key)
    }

    /// Store `value` under `key`. Fails without touching the index if the
    /// key is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<Slot, InsertError> {
        let hash = self.hasher.hash_one(&key);
        match self.index.entry(
            hash,
            |&k| self.slots.get(k).map(|s| s.key == key).unwrap_or(false),
            |&k| self.slots.get(k).map(|s| s.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(Stored { key, value, hash });
                let _ = v.insert(k);
                Ok(Slot(k))
            }
        }
    }

    /// Remove the value at `slot`. Returns `None` for a stale slot, leaving
    /// any newer value under the same key in place.
    pub fn remove(&mut self, slot: Slot) -> Option<(K, V)> {
        let k = slot.0;
        let stored = self.slots.remove(k)?;
        if let Ok(occupied) = self.index.find_entry(stored.hash, |&kk| kk == k) {
            let _ = occupied.remove();
        }
        Some((stored.key, stored.value))
    }

    /// Remove every value, yielding them in unspecified order.
    pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
        self.index.clear();
        self.slots.drain().map(|(_, s)| (s.key, s.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Invariant: duplicate keys are rejected and the stored value is kept.
    #[test]
    fn duplicate_insert_rejected() {
        let mut m: SlotIndex<u32, &str> = SlotIndex::new();
        let slot = m.insert(7, "first").unwrap();
        assert_eq!(m.insert(7, "second"), Err(InsertError::DuplicateKey));
        assert_eq!(m.get(slot), Some(&"first"));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: a slot from a removed value never resolves, even after the
    /// same key is stored again and the physical slot is reused.
    #[test]
    fn stale_slot_does_not_alias_reinserted_key() {
        let mut m: SlotIndex<u32, i32> = SlotIndex::new();
        let old = m.insert(1, 10).unwrap();
        assert_eq!(m.remove(old), Some((1, 10)));
        let new = m.insert(1, 20).unwrap();

        assert_ne!(old, new, "slots must differ across generations");
        assert!(!m.contains_slot(old));
        assert!(m.get(old).is_none());
        assert_eq!(m.remove(old), None, "stale removal is a no-op");
        assert_eq!(m.find(&1), Some(new));
        assert_eq!(m.get(new), Some(&20));
    }

    #[test]
    fn find_and_key_agree() {
        let mut m: SlotIndex<String, i32> = SlotIndex::new();
        let a = m.insert("a".to_string(), 1).unwrap();
        let b = m.insert("b".to_string(), 2).unwrap();
        assert_eq!(m.find("a"), Some(a));
        assert_eq!(m.find("b"), Some(b));
        assert_eq!(m.find("c"), None);
        assert_eq!(m.key(a).map(String::as_str), Some("a"));
        assert!(m.contains_key("b"));
    }

    /// Lookups still resolve the right value when every key collides.
    #[test]
    fn collision_handling_with_const_hasher() {
        #[derive(Clone, Default)]
        struct ConstBuildHasher;
        struct ConstHasher;
        impl BuildHasher for ConstBuildHasher {
            type Hasher = ConstHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ConstHasher
            }
        }
        impl core::hash::Hasher for ConstHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                0
            }
        }

        let mut m: SlotIndex<u32, i32, ConstBuildHasher> =
            SlotIndex::with_hasher(ConstBuildHasher);
        let a = m.insert(1, 10).unwrap();
        let b = m.insert(2, 20).unwrap();
        assert_ne!(a, b);
        assert_eq!(m.find(&1).and_then(|s| m.get(s)), Some(&10));
        assert_eq!(m.find(&2).and_then(|s| m.get(s)), Some(&20));

        m.remove(a);
        assert_eq!(m.find(&1), None);
        assert_eq!(m.find(&2), Some(b));
    }

    #[test]
    fn drain_empties_index_and_slots() {
        let mut m: SlotIndex<u32, i32> = SlotIndex::new();
        for k in 0..4 {
            m.insert(k, k as i32).unwrap();
        }
        let mut drained: Vec<_> = m.drain().collect();
        drained.sort();
        assert_eq!(drained, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert!(m.is_empty());
        assert_eq!(m.find(&2), None);
        assert!(m.insert(2, 5).is_ok());
    }

    // Property: state-machine equivalence against std::collections::HashMap.
    // - insert succeeds iff the model lacks the key.
    // - remove(slot) yields the model's value and invalidates the slot.
    // - find/len agree with the model after every step.
    proptest! {
        #[test]
        fn prop_matches_hashmap_model(ops in proptest::collection::vec((0u8..3, 0u32..6, any::<i32>()), 1..80)) {
            let mut sut: SlotIndex<u32, i32> = SlotIndex::new();
            let mut model: HashMap<u32, (Slot, i32)> = HashMap::new();
            let mut dead: Vec<Slot> = Vec::new();

            for (op, k, v) in ops {
                match op {
                    0 => match sut.insert(k, v) {
                        Ok(slot) => {
                            prop_assert!(!model.contains_key(&k));
                            model.insert(k, (slot, v));
                        }
                        Err(InsertError::DuplicateKey) => prop_assert!(model.contains_key(&k)),
                    },
                    1 => {
                        if let Some((slot, value)) = model.remove(&k) {
                            prop_assert_eq!(sut.remove(slot), Some((k, value)));
                            dead.push(slot);
                        }
                    }
                    2 => {
                        let expected = model.get(&k).map(|(slot, _)| *slot);
                        prop_assert_eq!(sut.find(&k), expected);
                    }
                    _ => unreachable!(),
                }
                prop_assert_eq!(sut.len(), model.len());
                for slot in &dead {
                    prop_assert!(!sut.contains_slot(*slot));
                }
            }
        }
    }
}
