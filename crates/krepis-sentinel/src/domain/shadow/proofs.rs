//! Kani Formal Verification Proofs
//!
//! Bounded harnesses over the shadow-state transitions and the delay
//! envelope. The shadow is exercised single-threaded here: Kani cannot
//! model the parking_lot primitives, but the transition algorithm itself
//! is sequential once the guard is held, so the proofs cover the state
//! machine the guard serializes.

use super::*;
use crate::domain::perturb::DelayController;

#[kani::proof]
#[kani::unwind(6)]
fn proof_read_transitions_sound() {
    let first_tid: usize = kani::any();
    let second_tid: usize = kani::any();
    let first_clock: u64 = kani::any();
    let second_clock: u64 = kani::any();

    kani::assume(first_tid < 4 && second_tid < 4);
    kani::assume(first_clock >= 1 && first_clock <= 3);
    kani::assume(second_clock >= 1 && second_clock <= 3);

    let shadow = LocationShadow::new(
        AccessKind::Read,
        Epoch::new(ThreadId(first_tid), first_clock),
    );
    shadow.record_read(
        ThreadId(second_tid),
        Epoch::new(ThreadId(second_tid), second_clock),
    );

    if first_tid == second_tid {
        kani::assert(
            !shadow.read_epoch().is_shared(),
            "same-thread reads must stay exclusive",
        );
        kani::assert(
            shadow.read_epoch().clock() == second_clock,
            "exclusive summary must hold the latest read",
        );
    } else {
        kani::assert(
            shadow.read_epoch().is_shared(),
            "a second reading thread must promote the summary",
        );
        kani::assert(
            shadow.read_slot(ThreadId(first_tid)) == first_clock
                && shadow.read_slot(ThreadId(second_tid)) == second_clock,
            "promotion must seed both reader slots",
        );
    }
}

#[kani::proof]
#[kani::unwind(6)]
fn proof_write_resets_read_history() {
    let tid: usize = kani::any();
    let clock: u64 = kani::any();
    kani::assume(tid < 4);
    kani::assume(clock >= 1 && clock <= 3);

    let shadow = LocationShadow::new(AccessKind::Read, Epoch::new(ThreadId(0), 1));
    shadow.record_read(ThreadId(1), Epoch::new(ThreadId(1), 1));

    let write = Epoch::new(ThreadId(tid), clock);
    shadow.record_write(write);

    kani::assert(shadow.write_epoch() == write, "write epoch must be replaced");
    kani::assert(
        shadow.read_epoch().is_zero(),
        "read summary must reset to ZERO",
    );
    kani::assert(
        shadow.read_slot(ThreadId(1)) == 0,
        "promoted slots must be cleared",
    );
}

#[kani::proof]
#[kani::unwind(12)]
fn proof_envelope_containment() {
    let mut ctl = DelayController::default();
    let initial_upper = ctl.upper_bound();

    for _ in 0..8 {
        let op: u8 = kani::any();
        kani::assume(op < 3);
        match op {
            0 => {
                let _ = ctl.sample();
            }
            1 => ctl.record_guarded_access(),
            _ => ctl.confirm_race(),
        }

        kani::assert(
            ctl.lower_bound() <= ctl.exponent() && ctl.exponent() <= ctl.upper_bound(),
            "exponent must stay inside the envelope",
        );
        kani::assert(
            ctl.upper_bound() <= initial_upper,
            "upper bound must be monotonically non-increasing",
        );
        kani::assert(
            ctl.upper_bound() >= 2,
            "upper bound must never pass the floor",
        );
    }
}
