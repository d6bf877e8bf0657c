//! Debug-only reentrancy guard for a lock-protected critical section.
//!
//! Records which thread currently holds the section. A thread that tries to
//! enter again (for example a loader calling back into the cache while the
//! registry lock is held) panics with a clear message instead of deadlocking
//! on the non-reentrant mutex. In release builds this is a zero-cost no-op.

#[cfg(not(debug_assertions))]
use core::marker::PhantomData;
#[cfg(debug_assertions)]
use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(debug_assertions)]
fn current_thread_tag() -> usize {
    thread_local! {
        static TAG: u8 = const { 0 };
    }
    TAG.with(|t| t as *const u8 as usize)
}

/// Per-instance holder tracker. Call `check` before taking the lock and
/// keep the guard from `enter` alive for as long as the lock is held.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    holder: AtomicUsize,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            holder: AtomicUsize::new(0),
        }
    }

    /// Panics in debug builds if the calling thread is already inside.
    #[inline]
    pub fn check(&self) {
        #[cfg(debug_assertions)]
        {
            assert!(
                self.holder.load(Ordering::Acquire) != current_thread_tag(),
                "reentrancy detected: thread re-entered the entry registry while holding its lock"
            );
        }
    }

    /// Mark the calling thread as the holder. Only call with the lock held.
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            self.holder.store(current_thread_tag(), Ordering::Release);
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            // Only clear our own mark; another thread may already have
            // taken the lock and recorded itself.
            let _ = self.owner.holder.compare_exchange(
                current_thread_tag(),
                0,
                Ordering::AcqRel,
                Ordering::Relaxed,
            );
        }
    }
}
