//! Adapters Layer - Instrumentation Seam
//!
//! Connects the domain state machine to the instrumentation layer that
//! intercepts program accesses.
//!
//! # Responsibilities
//! - Lazy location → shadow mapping ([`ShadowTable`])
//! - Race-confirmation entry point (envelope collapse + log line)
//!
//! Thread identity assignment, access classification, the actual sleep,
//! and race reporting proper all stay on the instrumentation side.

pub mod table;

pub use table::{LocationId, ShadowTable};
