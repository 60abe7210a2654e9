//! Single-producer, multi-consumer (SPMC) fan-out ring buffer.
//!
//! One writer publishes fixed-size samples that up to [`MAX_CONSUMERS`]
//! independent readers consume, each at its own pace through its own tail
//! cursor. The writer never blocks and never allocates after construction:
//! a reader that falls a full revolution behind has its oldest unread
//! entries silently dropped (the "lapped reader" correction) instead of
//! stalling the writer or growing the buffer.
//!
//! # Thread Safety
//! - [`FanoutWriter`] is the single producer; at most one exists per ring.
//! - [`FanoutReader`] owns one slot; `pop` takes `&mut self`, so the
//!   one-popper-per-slot rule is enforced by ownership.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::ring::{RingConfig, advance};
use crate::slots::{Exhausted, MAX_CONSUMERS, ReaderId, SlotTable};
use crate::waitq::WaitQueue;

/// The shared ring. Constructed once per capture device and handed to the
/// producer and to all readers by `Arc`; there is no dynamic resizing.
pub struct FanoutRing<T: Copy> {
    /// Backing slots. Written only by the producer; a reader only copies the
    /// slot its own tail currently points at.
    storage: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Producer cursor: one past the newest committed slot. Doubles as the
    /// readers' authoritative "anything newer than mine?" signal.
    head: AtomicUsize,
    /// One tail cursor per reader slot: the next slot that reader has not
    /// yet consumed. Advanced by its reader, or by the producer's
    /// lapped-reader correction.
    tails: [AtomicUsize; MAX_CONSUMERS],
    /// Count of correction events per slot (samples dropped for that reader).
    overruns: [AtomicU64; MAX_CONSUMERS],
    table: SlotTable,
    waitq: WaitQueue,
    writer_taken: AtomicBool,
    capacity: usize,
}

// SAFETY: all cross-thread access to `storage` goes through the cursor
// protocol below; every slot a reader copies has either been committed
// (published by the Release store of `head`) or the copy is discarded when
// the tail compare-and-set fails.
unsafe impl<T: Copy + Send> Send for FanoutRing<T> {}
unsafe impl<T: Copy + Send> Sync for FanoutRing<T> {}

impl<T: Copy> FanoutRing<T> {
    pub fn new(cfg: RingConfig) -> Arc<Self> {
        let storage = (0..cfg.capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Arc::new(Self {
            storage,
            head: AtomicUsize::new(0),
            tails: std::array::from_fn(|_| AtomicUsize::new(0)),
            overruns: std::array::from_fn(|_| AtomicU64::new(0)),
            table: SlotTable::new(),
            waitq: WaitQueue::new(),
            writer_taken: AtomicBool::new(false),
            capacity: cfg.capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes the producer handle.
    ///
    /// # Panics
    /// Panics on a second call: a fan-out ring has exactly one producer for
    /// its whole lifetime, and two live writers would race on the storage.
    pub fn writer(self: &Arc<Self>) -> FanoutWriter<T> {
        assert!(
            !self.writer_taken.swap(true, Ordering::AcqRel),
            "fan-out ring already has a producer"
        );
        FanoutWriter {
            ring: Arc::clone(self),
        }
    }

    /// Attaches a new reader, claiming one of the fixed slots.
    ///
    /// The reader starts at the current write position (tail-follow): it
    /// only sees samples published after attaching, never a previous
    /// occupant's stale backlog.
    pub fn attach(self: &Arc<Self>) -> Result<FanoutReader<T>, Exhausted> {
        let id = self.table.claim()?;
        let i = id.index();
        self.tails[i].store(self.head.load(Ordering::Acquire), Ordering::Release);
        self.overruns[i].store(0, Ordering::Relaxed);
        Ok(FanoutReader {
            ring: Arc::clone(self),
            id,
        })
    }

    /// Producer-side push. Single-writer, never blocks, never allocates.
    fn push(&self, value: T) {
        // Sole writer of `head`, so a Relaxed read of our own cursor is fine.
        let h = self.head.load(Ordering::Relaxed);
        let next = advance(h, 1, self.capacity);
        let next2 = advance(h, 2, self.capacity);

        // Lapped-reader correction: slot `next` is exactly the slot the
        // *following* push will overwrite. A reader camped there would soon
        // be copying bytes out from under that write, so park it one slot
        // further instead. The compare-and-set leaves alone any reader that
        // already advanced on its own.
        for i in 0..MAX_CONSUMERS {
            if self.tails[i]
                .compare_exchange(next, next2, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                self.overruns[i].fetch_add(1, Ordering::Relaxed);
            }
        }

        // SAFETY: we are the only writer, and no reader copies slot `h`
        // with a committed result: a reader only pops a slot its tail points
        // at after observing `head` past it, and any in-flight copy that
        // overlaps this write fails its tail compare-and-set and is
        // discarded (see `pop`).
        unsafe { (*self.storage[h].get()).write(value) };

        // Publish: the data write above must be visible before the new head.
        self.head.store(next, Ordering::Release);
    }

    /// True when reader `id` has consumed everything published so far.
    ///
    /// `head` is read before the tail, never the reverse: a stale head can
    /// only produce a false "empty" (the caller re-checks or blocks), while
    /// the opposite order could fabricate a false "non-empty" if the
    /// producer skips this reader in between, and that would let the reader
    /// pop past real data.
    fn is_empty(&self, id: ReaderId) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tails[id.index()].load(Ordering::Relaxed);
        head == tail
    }

    /// Consumer-side pop for slot `id`. Never blocks.
    fn pop(&self, id: ReaderId) -> Option<T> {
        if self.is_empty(id) {
            return None;
        }
        let tail = &self.tails[id.index()];
        loop {
            let t = tail.load(Ordering::Acquire);
            let t_next = advance(t, 1, self.capacity);

            // SAFETY: `t` is behind the committed head (checked above), so
            // the slot was initialized by a push. The copy may still tear if
            // the producer laps us right now; the compare-and-set below
            // detects exactly that case and the torn value is thrown away.
            let value = unsafe { (*self.storage[t].get()).assume_init_read() };

            match tail.compare_exchange(t, t_next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Some(value),
                // The producer's correction moved our tail past `t` while we
                // were copying. Returning the copy would hand out a stale or
                // half-overwritten sample, so retry at the new tail.
                Err(_) => continue,
            }
        }
    }

    fn overruns(&self, id: ReaderId) -> u64 {
        self.overruns[id.index()].load(Ordering::Relaxed)
    }

    fn detach(&self, id: ReaderId) {
        self.table.release(id);
    }
}

/// The producer side of a fan-out ring. One per ring.
///
/// `push` takes `&mut self` and the handle cannot be duplicated, so the
/// single-producer guarantee holds for all safe callers.
pub struct FanoutWriter<T: Copy> {
    ring: Arc<FanoutRing<T>>,
}

impl<T: Copy> FanoutWriter<T> {
    /// Publishes one sample. Never blocks, never allocates.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.ring.push(value);
    }

    /// Wakes every blocked reader so each re-checks its own emptiness
    /// predicate. Call once per event batch, not once per sample.
    pub fn wake_readers(&self) {
        self.ring.waitq.wake_all();
    }
}

/// One attached reader. Holds a claimed slot; dropping the handle releases
/// the slot for a future reader.
pub struct FanoutReader<T: Copy> {
    ring: Arc<FanoutRing<T>>,
    id: ReaderId,
}

impl<T: Copy> FanoutReader<T> {
    #[inline]
    pub fn id(&self) -> ReaderId {
        self.id
    }

    /// True when nothing newer than this reader's cursor has been published.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty(self.id)
    }

    /// Pops the oldest unread sample, or `None` when caught up.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        self.ring.pop(self.id)
    }

    /// Parks the caller until this reader's slot is non-empty.
    pub fn wait_nonempty(&self) {
        let ring = &self.ring;
        ring.waitq.wait_until(|| !ring.is_empty(self.id));
    }

    /// Number of times the producer had to skip this reader past unread
    /// data because it had fallen a full revolution behind.
    pub fn overruns(&self) -> u64 {
        self.ring.overruns(self.id)
    }
}

impl<T: Copy> Drop for FanoutReader<T> {
    fn drop(&mut self) {
        self.ring.detach(self.id);
    }
}
