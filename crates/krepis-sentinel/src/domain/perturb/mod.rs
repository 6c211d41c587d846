//! Perturbation Controller - Adaptive Delay Injection
//!
//! # Overview
//!
//! A latent race between two accesses only manifests when the scheduler
//! happens to land them inside the same narrow timing window. The
//! controller widens that window deliberately: before a guarded-class
//! access touches its location, the instrumentation layer asks for a
//! delay, stalls for it, and thereby gives a conflicting access from
//! another thread time to arrive.
//!
//! # Envelope
//!
//! ```text
//!  delay = unit * 2^exponent
//!
//!  exponent:  lower ──▶ lower+1 ──▶ ... ──▶ upper ──┐
//!                ▲                                  │ wrap + sweep_complete
//!                └──────────────────────────────────┘
//!
//!  upper bound:  initial ──▶ shrinks one step per 8 guarded accesses
//!                        ──▶ collapses to floor on a confirmed race
//! ```
//!
//! Escalating, wrapping exponential delays cover a broad range of timing
//! offsets without unbounded stalls. The two-sided adaptation keeps
//! aggregate injected latency proportional to the remaining uncertainty
//! about a location: sustained access volume with no race shrinks the
//! envelope; a confirmed race collapses it, since further escalation can
//! prove nothing new.
//!
//! # Concurrency
//!
//! The controller is plain mutable state. Embedded in a
//! [`LocationShadow`](crate::domain::shadow::LocationShadow) it runs under
//! that instance's exclusive guard; it never sleeps itself — the returned
//! [`Delay`] is executed by the caller, outside any lock.

mod types;

pub use types::{Delay, DelayConfig, DelaySnapshot, ExponentStep};

use std::time::Duration;

/// Guarded accesses between two relaxations of the upper bound.
const RELAX_PERIOD: u64 = 8;

/// Per-location adaptive delay state machine
///
/// Tracks the current exponent inside `[lower, upper]`, the volume of
/// guarded-class accesses, and whether a race has been confirmed.
#[derive(Debug, Clone)]
pub struct DelayController {
    /// Current exponent; next delay is `unit * 2^exponent`
    exponent: u32,
    /// Fixed lower bound
    lower: u32,
    /// Adaptive upper bound; only ever shrinks, never below `floor`
    upper: u32,
    /// Floor for the upper bound
    floor: u32,
    /// Base time unit
    unit: Duration,
    /// Guarded-class accesses observed
    guarded_accesses: u64,
    /// Set once a race is confirmed for this location
    race_confirmed: bool,
}

impl DelayController {
    /// Create a controller from an envelope configuration.
    ///
    /// # Panics
    ///
    /// Panics on an inverted envelope (`lower_bound > upper_bound_floor`
    /// or `upper_bound_floor > initial_upper_bound`) or an upper bound of
    /// 32 or more (the shift would overflow) — both caller defects.
    pub fn new(config: DelayConfig) -> Self {
        assert!(
            config.lower_bound <= config.upper_bound_floor
                && config.upper_bound_floor <= config.initial_upper_bound,
            "inverted delay envelope: lower={} floor={} upper={}",
            config.lower_bound,
            config.upper_bound_floor,
            config.initial_upper_bound
        );
        assert!(
            config.initial_upper_bound < 32,
            "delay exponent upper bound too large: {}",
            config.initial_upper_bound
        );
        Self {
            exponent: config.lower_bound,
            lower: config.lower_bound,
            upper: config.initial_upper_bound,
            floor: config.upper_bound_floor,
            unit: config.unit,
            guarded_accesses: 0,
            race_confirmed: false,
        }
    }

    /// Sample the next perturbation delay, then advance the exponent.
    ///
    /// Returns `unit * 2^exponent` plus the sweep flag: the sample taken at
    /// the upper bound completes a full pass over the envelope, wraps the
    /// exponent back to the lower bound, and carries
    /// `sweep_complete = true`.
    pub fn sample(&mut self) -> Delay {
        let duration = self.unit * (1u32 << self.exponent);
        let sweep_complete = matches!(self.advance(), ExponentStep::Wrapped);
        Delay {
            duration,
            sweep_complete,
        }
    }

    /// Advance the exponent by one step.
    ///
    /// At the upper bound the exponent wraps to the lower bound and the
    /// step reports [`ExponentStep::Wrapped`]; otherwise it reports the
    /// exponent it advanced from.
    pub fn advance(&mut self) -> ExponentStep {
        if self.exponent >= self.upper {
            self.exponent = self.lower;
            ExponentStep::Wrapped
        } else {
            let prev = self.exponent;
            self.exponent += 1;
            ExponentStep::Advanced(prev)
        }
    }

    /// Record one guarded-class access.
    ///
    /// Every 8th access relaxes the upper bound one step, floored:
    /// sustained volume without a detected race is evidence the location
    /// is unlikely to be racy, so injected delay tapers off.
    pub fn record_guarded_access(&mut self) {
        self.guarded_accesses += 1;
        if self.guarded_accesses % RELAX_PERIOD == 0 {
            self.upper = self.upper.saturating_sub(1).max(self.floor);
            self.clamp_exponent();
        }
    }

    /// Collapse the upper bound to the floor after a confirmed race.
    ///
    /// Idempotent. Once a race has been found for this location, further
    /// escalation only adds overhead.
    pub fn confirm_race(&mut self) {
        self.race_confirmed = true;
        self.upper = self.floor;
        self.clamp_exponent();
    }

    /// Force the exponent, clamped into the current envelope.
    pub fn set_exponent(&mut self, exponent: u32) {
        self.exponent = exponent.clamp(self.lower, self.upper);
    }

    /// Current exponent
    #[inline]
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Current (adapted) upper bound
    #[inline]
    pub fn upper_bound(&self) -> u32 {
        self.upper
    }

    /// Fixed lower bound
    #[inline]
    pub fn lower_bound(&self) -> u32 {
        self.lower
    }

    /// Whether a race has been confirmed for this location
    #[inline]
    pub fn race_confirmed(&self) -> bool {
        self.race_confirmed
    }

    /// Diagnostic snapshot of the envelope state
    pub fn snapshot(&self) -> DelaySnapshot {
        DelaySnapshot {
            exponent: self.exponent,
            lower_bound: self.lower,
            upper_bound: self.upper,
            upper_bound_floor: self.floor,
            guarded_accesses: self.guarded_accesses,
            race_confirmed: self.race_confirmed,
        }
    }

    // The exponent must stay inside [lower, upper] even when the upper
    // bound shrinks underneath it.
    fn clamp_exponent(&mut self) {
        if self.exponent > self.upper {
            self.exponent = self.upper;
        }
    }
}

impl Default for DelayController {
    fn default() -> Self {
        Self::new(DelayConfig::default())
    }
}
