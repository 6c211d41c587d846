//! Domain Layer - Race-Detection State Machine
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  Epoch Module                 Perturb Module                │
//! │  ├─ ThreadId                  ├─ DelayController            │
//! │  ├─ Epoch (packed, sentinels) ├─ DelayConfig / Delay        │
//! │  └─ VectorClock (growable)    └─ ExponentStep               │
//! │                                                             │
//! │                  Shadow Module                              │
//! │                  ├─ LocationShadow                          │
//! │                  ├─ ReadSummary / SourceTag                 │
//! │                  └─ AccessKind                              │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The epoch module is the leaf: value types only. The shadow module owns
//! one [`perturb::DelayController`] per location and composes the epoch
//! types into the per-location summary; it never reimplements the epoch
//! arithmetic it consumes.

pub mod epoch;
pub mod perturb;
pub mod shadow;

// Re-export epoch types
pub use epoch::{Epoch, EpochOrder, ThreadId, VectorClock, MAX_CLOCK, MAX_TID};

// Re-export shadow types
pub use shadow::{AccessKind, LocationShadow, ReadSummary, SourceTag};

// Re-export perturbation types
pub use perturb::{Delay, DelayConfig, DelayController, DelaySnapshot, ExponentStep};
