//! Krepis Sentinel - Dynamic Data-Race Shadow State
//!
//! # Overview
//!
//! `krepis-sentinel` is the per-memory-location core of a dynamic,
//! instrumentation-based data-race detector. For every shared location the
//! monitored program touches, it maintains a compact summary — the epoch
//! of the last write and either a single read epoch or, once a second
//! thread reads, a per-thread vector — sufficient for the detector to
//! decide whether a new access is ordered after all prior conflicting
//! accesses or constitutes a race, without storing full history.
//!
//! Alongside the summary, each location carries an adaptive perturbation
//! controller: an exponentially-sweeping delay envelope the harness uses
//! to stall one class of accesses, widening the timing window in which a
//! conflicting access can land — and backing off once a race is confirmed
//! or sustained access volume suggests none exists.
//!
//! # Trinity Architecture
//!
//! - **Domain**: epoch substrate, location shadow state, delay controller
//! - **Adapters**: the [`ShadowTable`] seam the instrumentation layer calls
//!
//! # Laws (Invariants)
//!
//! ## Epoch Laws
//! - **E-001**: Sentinel Exclusivity - ZERO and SHARED collide with no
//!   real (thread, counter) pair
//! - **E-002**: Thread-Local Order - epochs of one thread are totally
//!   ordered; cross-thread epochs are concurrent
//!
//! ## Shadow Laws
//! - **S-001**: Write Reset - every recorded write replaces the write
//!   epoch and clears the read history
//! - **S-002**: One-way Promotion - a read summary in shared mode never
//!   reverts to a single epoch until a new write
//! - **S-003**: Serialized Mutation - mutating operations on one shadow
//!   are mutually exclusive, except the owning-thread slot store on a
//!   promoted summary
//!
//! ## Perturbation Laws
//! - **P-001**: Envelope Containment - lower ≤ exponent ≤ upper at every
//!   observable point
//! - **P-002**: Monotone Upper Bound - the upper bound only shrinks,
//!   never below the floor
//! - **P-003**: Collapse Idempotence - confirming a race any number of
//!   times pins the upper bound at the floor
//!
//! # Usage
//!
//! ```rust
//! use krepis_sentinel::{AccessKind, Epoch, ShadowTable, ThreadId};
//!
//! let table = ShadowTable::new();
//!
//! // First access to the location: a write by thread 1
//! let shadow = table.observe(0x7f3a, AccessKind::Write, Epoch::new(ThreadId(1), 5));
//!
//! // Reads from two other threads promote the summary to a vector
//! shadow.record_read(ThreadId(2), Epoch::new(ThreadId(2), 1));
//! shadow.record_read(ThreadId(3), Epoch::new(ThreadId(3), 1));
//! assert_eq!(shadow.to_string(), "[W=t1@5 R=SHARED V=[0, 0, 1, 1]]");
//!
//! // Perturbation: stall a guarded access for the sampled duration
//! let delay = shadow.next_delay();
//! assert_eq!(delay.duration, std::time::Duration::from_millis(1));
//! ```
//!
//! # What stays outside
//!
//! Instrumentation (intercepting reads/writes), thread identity
//! assignment, the happens-before verdict policy, the sleeping primitive,
//! and race reporting are all the caller's: this crate supplies the state,
//! the transitions, and the delay arithmetic.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Trinity Architecture Layers
pub mod adapters;
pub mod domain;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Epoch substrate
pub use domain::{Epoch, EpochOrder, ThreadId, VectorClock, MAX_CLOCK, MAX_TID};

// Shadow state
pub use domain::{AccessKind, LocationShadow, ReadSummary, SourceTag};

// Perturbation control
pub use domain::{Delay, DelayConfig, DelayController, DelaySnapshot, ExponentStep};

// Instrumentation seam
pub use adapters::{LocationId, ShadowTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
