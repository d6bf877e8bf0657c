//! entries-cache: an identity cache for expensively loaded records.
//!
//! Consumers across an application ask for records by [`EntryKey`]. The
//! cache guarantees they all observe the same instance while it is loaded,
//! never holds two instances for one key, and keeps recently loaded
//! instances alive to avoid reloading them.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the lifetime rules small enough to check by reading, with
//!   each structure owning exactly one concern.
//! - Layers:
//!   - SlotIndex<K, V>: structural key index returning generational slots
//!     (hashbrown `HashTable` over a slotmap `SlotMap`); duplicate inserts
//!     fail.
//!   - Registry<T>: `SlotIndex<EntryKey, Weak<EntryCell<T>>>` behind one
//!     mutex. Non-owning; used for deduplication only.
//!   - EntryRef<T>: an `Arc` to the entry cell. The cell's `Drop` unlinks
//!     the registry mapping before the value is destroyed.
//!   - RetentionQueue<T>: bounded FIFO of owning `EntryRef`s behind a second
//!     mutex; the only owner of "extra" lifetime.
//!   - EntriesCache<T, L>: composes the above with a [`Loader`].
//!
//! Lock discipline
//! - Registry lock: lookup, load-and-register on miss, and unlink on last
//!   release. Held across the loader call so concurrent misses for a key
//!   load it once.
//! - Retention lock: push, trim and clear. Evicted handles are dropped after
//!   it is released.
//! - The two locks are never held together, so the load path (registry then
//!   retention) cannot deadlock with the eviction path (retention, released,
//!   then registry).
//! - In debug builds a thread that re-enters the registry while holding its
//!   lock (a loader calling `get`, say) panics instead of deadlocking.
//!
//! Deletion races
//! - A lookup upgrades the registry's `Weak` under the lock. If the upgrade
//!   fails the entry's last owner is already gone: the stale mapping is
//!   dropped and the lookup is a miss.
//! - The dying entry later unlinks by its own slot. If a newer entry now
//!   holds the key, that slot is stale and the newer mapping is untouched.
//!
//! Retention policy
//! - Entries are retained when loaded, not when hit. This is a bounded
//!   "recently loaded" set, not an LRU of accesses.
//! - Shrinking the capacity does not evict immediately; the next push trims
//!   the queue down to the new capacity.
//!
//! Errors
//! - Missing records and loader failures both yield `None` from `get`; use
//!   `try_get` to see the [`CacheError`]. Nothing is retried and nothing is
//!   negatively cached.
//! - A duplicate registration means the lock discipline was broken; it logs
//!   and panics.

mod cache;
mod config;
mod entry;
mod error;
mod key;
mod loader;
mod reentrancy;
mod registry;
mod retention;
mod search;
pub mod slot_index;
mod stats;

// Public surface
pub use cache::EntriesCache;
pub use config::{CacheConfig, DEFAULT_RETENTION_CAPACITY};
pub use entry::EntryRef;
pub use error::{CacheError, InsertError, LoadError};
pub use key::EntryKey;
pub use loader::Loader;
pub use search::KeySource;
pub use stats::CacheStats;
