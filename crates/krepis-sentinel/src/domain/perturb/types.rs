//! Perturbation Controller Types

use std::fmt;
use std::time::Duration;

/// Delay envelope configuration
///
/// Delays are `unit * 2^exponent` for an exponent that sweeps the
/// inclusive range `[lower_bound, upper_bound]`. The upper bound adapts
/// downward over the life of a location, never past `upper_bound_floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayConfig {
    /// Smallest exponent in the envelope
    pub lower_bound: u32,

    /// Largest exponent before any adaptation has occurred
    pub initial_upper_bound: u32,

    /// Hard floor the upper bound can relax or collapse down to
    pub upper_bound_floor: u32,

    /// Base time unit one exponent step multiplies
    pub unit: Duration,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            lower_bound: 0,        // 2^0 = 1 unit
            initial_upper_bound: 7, // 2^7 = 128 units
            upper_bound_floor: 2,   // 2^2 = 4 units once confidence has fired
            unit: Duration::from_millis(1),
        }
    }
}

/// One sampled perturbation delay
///
/// `sweep_complete` is the bail-out signal: the sample that carries it is
/// the last one of a full pass over the envelope, and the exponent has
/// wrapped back to the lower bound. Callers that escalate per round should
/// stop escalating when they see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    /// How long to stall the guarded access
    pub duration: Duration,

    /// True when this sample completed a full sweep of the envelope
    pub sweep_complete: bool,
}

/// Outcome of advancing the delay exponent
///
/// An explicit tagged result: a wrapped sweep is a normal control outcome,
/// not an error, and must stay distinguishable from every legitimate
/// exponent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExponentStep {
    /// Exponent advanced by one; carries the value it advanced from
    Advanced(u32),

    /// Exponent was at the upper bound and wrapped to the lower bound
    Wrapped,
}

/// Diagnostic view of a controller's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySnapshot {
    /// Current exponent
    pub exponent: u32,
    /// Fixed lower bound
    pub lower_bound: u32,
    /// Current (adapted) upper bound
    pub upper_bound: u32,
    /// Floor the upper bound cannot pass
    pub upper_bound_floor: u32,
    /// Guarded-class accesses observed so far
    pub guarded_accesses: u64,
    /// Whether a race has been confirmed for this location
    pub race_confirmed: bool,
}

impl fmt::Display for DelaySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exp=2^{} bounds=[{}, {}] floor={} accesses={} race={}",
            self.exponent,
            self.lower_bound,
            self.upper_bound,
            self.upper_bound_floor,
            self.guarded_accesses,
            self.race_confirmed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_envelope() {
        let config = DelayConfig::default();
        assert_eq!(config.lower_bound, 0);
        assert_eq!(config.initial_upper_bound, 7);
        assert_eq!(config.upper_bound_floor, 2);
        assert_eq!(config.unit, Duration::from_millis(1));
    }

    #[test]
    fn test_snapshot_display() {
        let snap = DelaySnapshot {
            exponent: 3,
            lower_bound: 0,
            upper_bound: 7,
            upper_bound_floor: 2,
            guarded_accesses: 12,
            race_confirmed: false,
        };
        assert_eq!(
            snap.to_string(),
            "exp=2^3 bounds=[0, 7] floor=2 accesses=12 race=false"
        );
    }
}
