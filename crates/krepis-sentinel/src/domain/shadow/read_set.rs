//! Promoted Read-Slot Storage
//!
//! Once a location's read summary is promoted to shared mode, its read
//! history lives here: one counter slot per thread id, grown on demand.
//!
//! # Slot Protection
//!
//! - Slot `i` is written only by thread `i`, and only that thread reads
//!   slot `i` outside the shadow's exclusive guard — program order on a
//!   single thread rules out a self-race on the slot.
//! - A slot store holds the shared (read) guard of the `RwLock`; growth,
//!   seeding, clearing, and whole-vector snapshots hold the write guard
//!   or run under the shadow's exclusive guard.
//!
//! Callers pass a `revalidate` closure that re-checks, under the guard,
//! that the summary is still in shared mode; a concurrent write resets
//! the summary inside the write guard, so a stale fast-path store cannot
//! land after the reset.

use crate::domain::epoch::{Epoch, ThreadId, VectorClock};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-thread read counters for a promoted location
#[derive(Debug, Default)]
pub(crate) struct ReadSet {
    slots: RwLock<Vec<AtomicU64>>,
}

impl ReadSet {
    pub(crate) fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Store the calling thread's own counter.
    ///
    /// Takes the shared guard when the slot already exists, the write
    /// guard only to grow. Returns false when `revalidate` fails under
    /// the guard (the summary left shared mode) and nothing was stored.
    pub(crate) fn store_own(
        &self,
        tid: ThreadId,
        clock: u64,
        revalidate: impl Fn() -> bool,
    ) -> bool {
        {
            let slots = self.slots.read();
            if !revalidate() {
                return false;
            }
            if let Some(slot) = slots.get(tid.as_usize()) {
                slot.store(clock, Ordering::Release);
                return true;
            }
        }

        let mut slots = self.slots.write();
        if !revalidate() {
            return false;
        }
        Self::grow(&mut slots, tid.as_usize() + 1);
        slots[tid.as_usize()].store(clock, Ordering::Release);
        true
    }

    /// Seed the vector at promotion time from the prior single read epoch
    /// plus the incoming one. Runs under the shadow's exclusive guard.
    pub(crate) fn seed(&self, prior: Epoch, incoming: Epoch) {
        let mut slots = self.slots.write();
        let needed = prior.tid().as_usize().max(incoming.tid().as_usize()) + 1;
        Self::grow(&mut slots, needed);
        slots[prior.tid().as_usize()].store(prior.clock(), Ordering::Release);
        slots[incoming.tid().as_usize()].store(incoming.clock(), Ordering::Release);
    }

    /// Drop all slots, running `reset` while the write guard is held so
    /// the summary transition and the clear are indivisible for slot
    /// writers.
    pub(crate) fn clear_with(&self, reset: impl FnOnce()) {
        let mut slots = self.slots.write();
        reset();
        slots.clear();
    }

    /// Counter for one thread (zero if no slot)
    pub(crate) fn get(&self, tid: ThreadId) -> u64 {
        let slots = self.slots.read();
        slots
            .get(tid.as_usize())
            .map(|slot| slot.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Materialize the whole vector
    pub(crate) fn snapshot(&self) -> VectorClock {
        let slots = self.slots.read();
        let mut vc = VectorClock::with_threads(slots.len());
        for (i, slot) in slots.iter().enumerate() {
            vc.set(ThreadId(i), slot.load(Ordering::Acquire));
        }
        vc
    }

    fn grow(slots: &mut Vec<AtomicU64>, needed: usize) {
        while slots.len() < needed {
            slots.push(AtomicU64::new(0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_both_slots() {
        let set = ReadSet::new();
        set.seed(
            Epoch::new(ThreadId(2), 1),
            Epoch::new(ThreadId(3), 1),
        );

        assert_eq!(set.get(ThreadId(2)), 1);
        assert_eq!(set.get(ThreadId(3)), 1);
        assert_eq!(set.get(ThreadId(0)), 0);
        assert_eq!(set.get(ThreadId(1)), 0);
    }

    #[test]
    fn test_store_own_grows() {
        let set = ReadSet::new();
        assert!(set.store_own(ThreadId(5), 9, || true));
        assert_eq!(set.get(ThreadId(5)), 9);
    }

    #[test]
    fn test_store_own_respects_revalidation() {
        let set = ReadSet::new();
        assert!(!set.store_own(ThreadId(0), 1, || false));
        assert_eq!(set.get(ThreadId(0)), 0);
    }

    #[test]
    fn test_clear_runs_reset_under_guard() {
        let set = ReadSet::new();
        set.seed(Epoch::new(ThreadId(0), 1), Epoch::new(ThreadId(1), 2));

        let mut reset_ran = false;
        set.clear_with(|| reset_ran = true);

        assert!(reset_ran);
        assert_eq!(set.get(ThreadId(0)), 0);
        assert_eq!(set.get(ThreadId(1)), 0);
        assert!(set.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_matches_slots() {
        let set = ReadSet::new();
        set.seed(Epoch::new(ThreadId(1), 4), Epoch::new(ThreadId(2), 6));
        assert!(set.store_own(ThreadId(1), 5, || true));

        let vc = set.snapshot();
        assert_eq!(vc.get(ThreadId(0)), 0);
        assert_eq!(vc.get(ThreadId(1)), 5);
        assert_eq!(vc.get(ThreadId(2)), 6);
    }
}
