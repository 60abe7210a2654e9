//! Wake-all wait queue for blocked readers.
//!
//! The producer runs in a context that must never block, so the ring itself
//! is lock-free; the mutex here only orders "about to sleep" against "about
//! to wake". Wakes are always broadcast: waiters may be parked on logically
//! different slots but the same physical event, and each re-checks its own
//! predicate after waking.

use parking_lot::{Condvar, Mutex};

pub(crate) struct WaitQueue {
    lock: Mutex<()>,
    cond: Condvar,
}

impl WaitQueue {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Blocks the caller until `ready()` holds.
    ///
    /// The predicate is evaluated under the queue lock, so a wake issued
    /// after the check but before the park cannot be missed.
    pub(crate) fn wait_until(&self, mut ready: impl FnMut() -> bool) {
        let mut guard = self.lock.lock();
        while !ready() {
            self.cond.wait(&mut guard);
        }
    }

    /// Wakes every parked waiter.
    pub(crate) fn wake_all(&self) {
        // Taking the lock serializes against waiters between their predicate
        // check and their park.
        let _guard = self.lock.lock();
        self.cond.notify_all();
    }
}
