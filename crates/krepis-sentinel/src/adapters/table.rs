//! Shadow Table - Location to Shadow-State Mapping
//!
//! # Overview
//!
//! The instrumentation layer identifies each monitored memory location by
//! an opaque numeric id and needs its [`LocationShadow`] on every
//! intercepted access. The table creates shadows lazily on first access,
//! hands out shared handles, and drops a location's shadow when the
//! location itself is reclaimed.
//!
//! # Thread Safety
//!
//! `DashMap` shards the location space, so first-access creation and
//! lookup from many application threads proceed without a global lock.
//! The per-location serialization lives inside [`LocationShadow`] itself.

use crate::domain::shadow::{AccessKind, LocationShadow};
use crate::domain::Epoch;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Opaque identifier for a monitored memory location
pub type LocationId = usize;

/// Concurrent map from monitored locations to their shadow states
#[derive(Default)]
pub struct ShadowTable {
    locations: DashMap<LocationId, Arc<LocationShadow>>,
}

impl ShadowTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            locations: DashMap::new(),
        }
    }

    /// Get the shadow for a location, creating it from this first access
    /// if the location is not yet monitored.
    ///
    /// The access kind and epoch only seed a newly created shadow; for an
    /// existing one the caller records the access through the returned
    /// handle.
    pub fn observe(&self, loc: LocationId, kind: AccessKind, epoch: Epoch) -> Arc<LocationShadow> {
        let entry = self.locations.entry(loc).or_insert_with(|| {
            trace!(loc, kind = %kind, epoch = %epoch, "shadow created");
            Arc::new(LocationShadow::new(kind, epoch))
        });
        Arc::clone(entry.value())
    }

    /// Shadow for a location, if it is currently monitored
    pub fn get(&self, loc: LocationId) -> Option<Arc<LocationShadow>> {
        self.locations.get(&loc).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a location's shadow when the location is reclaimed.
    ///
    /// Returns the removed handle; outstanding `Arc`s held by in-flight
    /// accesses stay valid until they drop.
    pub fn reclaim(&self, loc: LocationId) -> Option<Arc<LocationShadow>> {
        let removed = self.locations.remove(&loc).map(|(_, shadow)| shadow);
        if removed.is_some() {
            debug!(loc, "shadow reclaimed");
        }
        removed
    }

    /// Collapse a location's delay envelope after the detector confirmed
    /// a race there. No-op for unmonitored locations.
    pub fn confirm_race(&self, loc: LocationId) {
        if let Some(shadow) = self.get(loc) {
            warn!(loc, state = %shadow, "data race confirmed; collapsing delay envelope");
            shadow.confirm_race();
        }
    }

    /// Number of locations currently monitored
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True when no location is monitored
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
