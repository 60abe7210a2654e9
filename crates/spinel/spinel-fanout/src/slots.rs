//! Fixed-size consumer slot table.
//!
//! Each reader of the fan-out ring owns one slot identity for its lifetime.
//! A slot identity is the sole credential a reader needs to address its own
//! tail cursor, so claim/release ordering is what keeps a new occupant from
//! observing a previous occupant's in-flight state.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Maximum number of concurrently attached readers.
pub const MAX_CONSUMERS: usize = 4;

/// Identity of one claimed reader slot.
///
/// Only ever constructed by a successful [`SlotTable::claim`], so holding a
/// `ReaderId` proves the slot is bound to exactly one reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReaderId(u8);

impl ReaderId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ReaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reader-{}", self.0)
    }
}

/// Every reader slot is already bound to an open reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exhausted;

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("all reader slots are claimed")
    }
}

impl Error for Exhausted {}

/// Claimed/free flags for the fixed reader slot set.
///
/// Lock-free: concurrent claim attempts race on per-slot compare-and-set,
/// so two callers can never both win the same index.
pub(crate) struct SlotTable {
    claimed: [AtomicBool; MAX_CONSUMERS],
}

impl SlotTable {
    pub(crate) fn new() -> Self {
        Self {
            claimed: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    /// Claims the first free slot, or fails if every slot is in use.
    ///
    /// Acquire on the winning compare-and-set pairs with the Release store
    /// in [`release`](Self::release): a claimer that observes a slot free
    /// also observes everything its previous occupant did to the
    /// corresponding tail cursor.
    pub(crate) fn claim(&self) -> Result<ReaderId, Exhausted> {
        for (i, flag) in self.claimed.iter().enumerate() {
            if flag
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(ReaderId(i as u8));
            }
        }
        Err(Exhausted)
    }

    /// Returns a slot to the free pool.
    ///
    /// Release ordering publishes all of the departing reader's prior tail
    /// mutations before the flag flip becomes visible to future claimers.
    pub(crate) fn release(&self, id: ReaderId) {
        self.claimed[id.index()].store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_distinct_until_exhausted() {
        let table = SlotTable::new();
        let mut ids = Vec::new();
        for _ in 0..MAX_CONSUMERS {
            ids.push(table.claim().expect("slot should be free"));
        }
        ids.sort_by_key(|id| id.index());
        ids.dedup();
        assert_eq!(ids.len(), MAX_CONSUMERS, "claims must be pairwise distinct");
        assert_eq!(table.claim(), Err(Exhausted));
    }

    #[test]
    fn released_slot_can_be_reclaimed() {
        let table = SlotTable::new();
        let ids: Vec<_> = (0..MAX_CONSUMERS).map(|_| table.claim().unwrap()).collect();
        table.release(ids[1]);
        assert_eq!(table.claim(), Ok(ids[1]));
    }
}
