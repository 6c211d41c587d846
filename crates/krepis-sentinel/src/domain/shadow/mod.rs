//! Location Shadow State
//!
//! # Overview
//!
//! One [`LocationShadow`] exists per monitored memory location, parallel to
//! the program's real data. It keeps the compact summary the race detector
//! needs — "who last wrote this" and "who has read it since" — without
//! storing full access history, plus the adaptive delay state that widens
//! the timing window for exposing latent races.
//!
//! # Architecture
//!
//! ```text
//! LocationShadow
//! ├─ write_raw: AtomicU64          last-write epoch (ZERO if unwritten)
//! ├─ read_raw:  AtomicU64          read summary: ZERO | epoch | SHARED
//! ├─ reads:     ReadSet            per-thread slots, live once promoted
//! └─ meta:      Mutex<ShadowMeta>  the per-instance exclusive guard
//!     ├─ write_tag / read_tag      diagnostic source tags
//!     ├─ accessed_by_unguarded     non-delayed-class touch marker
//!     └─ delay: DelayController    perturbation envelope
//! ```
//!
//! # Lock Discipline
//!
//! - Every mutating operation serializes on `meta`, and composite reads
//!   (summary snapshots, `Display`) take it too, so no torn combination of
//!   write epoch and read summary is ever observed.
//! - `write_raw` and `read_raw` are written only while `meta` is held;
//!   lock-free loads are allowed, which is what the external detector's
//!   fast-path checks rely on.
//! - Exception, preserved deliberately: once `read_raw` is SHARED, the
//!   owning thread stores its own read slot while holding only the read
//!   set's shared guard — no exclusive lock. Replacing this with full
//!   locking would be correct but is a throughput regression on the
//!   hottest path of the detector. The slot protection rules live in the
//!   read-set module.
//!
//! # Transition Algorithm
//!
//! ```text
//! record_read(t, e):
//!   R == SHARED           →  slot[t] = e          (fast path, no guard)
//!   R == ZERO or R.tid==t →  R = e                (stay exclusive)
//!   R.tid != t            →  seed {R, e}; R = SHARED   (one-way promotion)
//!
//! record_write(e):
//!   W = e; R = ZERO; slots cleared
//! ```
//!
//! The promotion is permanent for the lifetime of the current write epoch:
//! only a new write resets the read history.

mod read_set;
mod types;

#[cfg(kani)]
mod proofs;

pub use types::{AccessKind, ReadSummary, SourceTag};

use crate::domain::epoch::{Epoch, ThreadId};
use crate::domain::perturb::{Delay, DelayConfig, DelayController, DelaySnapshot, ExponentStep};
use parking_lot::Mutex;
use read_set::ReadSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fields guarded by the per-instance exclusive lock
#[derive(Debug)]
struct ShadowMeta {
    write_tag: Option<SourceTag>,
    read_tag: Option<SourceTag>,
    accessed_by_unguarded: bool,
    delay: DelayController,
}

/// Per-location shadow state: race-tracking summary + perturbation control
///
/// Created lazily on the first observed access to a location and dropped
/// with the location's metadata when monitoring ends. All methods take
/// `&self`; the instance is shared (`Arc`) between every thread that
/// touches the location.
pub struct LocationShadow {
    /// Epoch of the most recent write; ZERO if never written
    write_raw: AtomicU64,
    /// Read summary epoch: ZERO, a single reader's epoch, or SHARED
    read_raw: AtomicU64,
    /// Per-thread read counters, populated once promoted
    reads: ReadSet,
    /// Exclusive guard for everything else
    meta: Mutex<ShadowMeta>,
}

impl LocationShadow {
    /// Create the shadow for a location's first observed access.
    ///
    /// Seeds the write epoch if the access was a write, the read summary
    /// if it was a read. No prior access is assumed racy by construction.
    ///
    /// # Panics
    ///
    /// A sentinel epoch is a caller defect.
    pub fn new(kind: AccessKind, epoch: Epoch) -> Self {
        Self::with_delay_config(kind, epoch, DelayConfig::default())
    }

    /// Create the shadow with a non-default delay envelope.
    pub fn with_delay_config(kind: AccessKind, epoch: Epoch, config: DelayConfig) -> Self {
        assert!(
            !epoch.is_sentinel(),
            "shadow state must be seeded with a real epoch, got {epoch}"
        );
        let (write_raw, read_raw) = match kind {
            AccessKind::Write => (epoch.raw(), Epoch::ZERO.raw()),
            AccessKind::Read => (Epoch::ZERO.raw(), epoch.raw()),
        };
        Self {
            write_raw: AtomicU64::new(write_raw),
            read_raw: AtomicU64::new(read_raw),
            reads: ReadSet::new(),
            meta: Mutex::new(ShadowMeta {
                write_tag: None,
                read_tag: None,
                accessed_by_unguarded: false,
                delay: DelayController::new(config),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Race-tracking transitions
    // ------------------------------------------------------------------

    /// Record a write to the location.
    ///
    /// Sets the write epoch and resets the read summary to ZERO — a new
    /// write epoch invalidates the prior read history, including any
    /// shared-mode promotion. The caller has already evaluated its
    /// happens-before verdict against the previous state; this method
    /// only performs the mutation.
    ///
    /// # Panics
    ///
    /// A sentinel epoch is a caller defect.
    pub fn record_write(&self, epoch: Epoch) {
        assert!(
            !epoch.is_sentinel(),
            "record_write takes a real epoch, got {epoch}"
        );
        let _guard = self.meta.lock();
        if Epoch::from_raw(self.read_raw.load(Ordering::Acquire)).is_shared() {
            // The summary must leave shared mode inside the slot guard so
            // a late fast-path slot store cannot land after the clear.
            self.reads
                .clear_with(|| self.read_raw.store(Epoch::ZERO.raw(), Ordering::Release));
        } else {
            self.read_raw.store(Epoch::ZERO.raw(), Ordering::Release);
        }
        self.write_raw.store(epoch.raw(), Ordering::Release);
    }

    /// Record a read of the location by `tid`.
    ///
    /// Exclusive summaries belonging to the same thread (or to no thread
    /// yet) are replaced in place. A read from a second thread promotes
    /// the summary to shared mode, seeding the vector from the prior
    /// epoch plus the incoming one; from then on each thread only updates
    /// its own slot.
    ///
    /// # Panics
    ///
    /// A sentinel epoch, or an epoch that does not belong to `tid`, is a
    /// caller defect.
    pub fn record_read(&self, tid: ThreadId, epoch: Epoch) {
        assert!(
            !epoch.is_sentinel(),
            "record_read takes a real epoch, got {epoch}"
        );
        debug_assert_eq!(epoch.tid(), tid, "epoch does not belong to reading thread");

        // Promoted fast path: own-slot store without the exclusive guard.
        if self.try_promoted_read(tid, epoch) {
            return;
        }

        let _guard = self.meta.lock();
        let summary = Epoch::from_raw(self.read_raw.load(Ordering::Acquire));
        if summary.is_shared() {
            // Promoted while this thread waited on the guard; read_raw
            // cannot change again while we hold it.
            let stored = self.reads.store_own(tid, epoch.clock(), || true);
            debug_assert!(stored);
        } else if summary.is_zero() || summary.tid() == tid {
            self.read_raw.store(epoch.raw(), Ordering::Release);
        } else {
            // Second reading thread: one-way promotion.
            self.reads.seed(summary, epoch);
            self.read_raw.store(Epoch::SHARED.raw(), Ordering::Release);
        }
    }

    fn try_promoted_read(&self, tid: ThreadId, epoch: Epoch) -> bool {
        if !self.is_promoted() {
            return false;
        }
        self.reads
            .store_own(tid, epoch.clock(), || self.is_promoted())
    }

    #[inline]
    fn is_promoted(&self) -> bool {
        Epoch::from_raw(self.read_raw.load(Ordering::Acquire)).is_shared()
    }

    // ------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------

    /// Epoch of the most recent write (ZERO if the location was never
    /// written). Lock-free.
    #[inline]
    pub fn write_epoch(&self) -> Epoch {
        Epoch::from_raw(self.write_raw.load(Ordering::Acquire))
    }

    /// Raw read-summary epoch: ZERO, a single reader's epoch, or SHARED.
    /// Lock-free.
    #[inline]
    pub fn read_epoch(&self) -> Epoch {
        Epoch::from_raw(self.read_raw.load(Ordering::Acquire))
    }

    /// Counter recorded for one thread's reads in shared mode (zero when
    /// the thread has no slot or the summary is not promoted).
    pub fn read_slot(&self, tid: ThreadId) -> u64 {
        self.reads.get(tid)
    }

    /// Consistent snapshot of the read history.
    ///
    /// Taken under the exclusive guard so the mode and the vector contents
    /// cannot be torn by a concurrent promotion or write reset.
    pub fn read_summary(&self) -> ReadSummary {
        let _guard = self.meta.lock();
        let summary = Epoch::from_raw(self.read_raw.load(Ordering::Acquire));
        if summary.is_zero() {
            ReadSummary::None
        } else if summary.is_shared() {
            ReadSummary::Shared(self.reads.snapshot())
        } else {
            ReadSummary::Exclusive(summary)
        }
    }

    // ------------------------------------------------------------------
    // Diagnostic tags
    // ------------------------------------------------------------------

    /// Attach the most recent writer's source tag.
    pub fn set_write_tag(&self, tag: SourceTag) {
        self.meta.lock().write_tag = Some(tag);
    }

    /// Attach the most recent reader's source tag.
    pub fn set_read_tag(&self, tag: SourceTag) {
        self.meta.lock().read_tag = Some(tag);
    }

    /// Most recent writer's source tag, if any.
    pub fn write_tag(&self) -> Option<SourceTag> {
        self.meta.lock().write_tag.clone()
    }

    /// Most recent reader's source tag, if any.
    pub fn read_tag(&self) -> Option<SourceTag> {
        self.meta.lock().read_tag.clone()
    }

    /// Mark that the non-delayed access class has touched this location.
    pub fn mark_unguarded_access(&self) {
        self.meta.lock().accessed_by_unguarded = true;
    }

    /// Has the non-delayed access class touched this location?
    pub fn accessed_by_unguarded(&self) -> bool {
        self.meta.lock().accessed_by_unguarded
    }

    // ------------------------------------------------------------------
    // Perturbation control
    // ------------------------------------------------------------------

    /// Sample the next perturbation delay for a guarded access.
    ///
    /// The returned duration is executed by the caller *after* this call
    /// returns — never while any of this instance's guards are held, so
    /// the stall cannot block unrelated threads touching the location.
    pub fn next_delay(&self) -> Delay {
        self.meta.lock().delay.sample()
    }

    /// Advance the delay exponent without sampling.
    pub fn advance_exponent(&self) -> ExponentStep {
        self.meta.lock().delay.advance()
    }

    /// Record one guarded-class access for envelope adaptation.
    pub fn record_guarded_access(&self) {
        self.meta.lock().delay.record_guarded_access();
    }

    /// Collapse the delay envelope after a confirmed race. Idempotent.
    pub fn confirm_race(&self) {
        self.meta.lock().delay.confirm_race();
    }

    /// Has a race been confirmed for this location?
    pub fn race_confirmed(&self) -> bool {
        self.meta.lock().delay.race_confirmed()
    }

    /// Force the delay exponent (clamped into the envelope).
    pub fn set_delay_exponent(&self, exponent: u32) {
        self.meta.lock().delay.set_exponent(exponent);
    }

    /// Diagnostic snapshot of the delay envelope.
    pub fn delay_snapshot(&self) -> DelaySnapshot {
        self.meta.lock().delay.snapshot()
    }
}

impl fmt::Display for LocationShadow {
    /// Renders `[W=… R=…]`, with the vector contents appended once the
    /// summary is promoted. Serialized against mutation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let _guard = self.meta.lock();
        let w = Epoch::from_raw(self.write_raw.load(Ordering::Acquire));
        let r = Epoch::from_raw(self.read_raw.load(Ordering::Acquire));
        if r.is_shared() {
            write!(f, "[W={} R={} V={}]", w, r, self.reads.snapshot())
        } else {
            write!(f, "[W={} R={}]", w, r)
        }
    }
}

impl fmt::Debug for LocationShadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationShadow{self}")
    }
}
