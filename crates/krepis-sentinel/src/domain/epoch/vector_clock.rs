//! Vector Clock Implementation
//!
//! Vector clocks are used to track causality (happens-before relation)
//! in concurrent executions.
//!
//! # Theory
//!
//! Given events e1 and e2:
//! - e1 happens-before e2 (e1 → e2) if VC(e1) < VC(e2)
//! - e1 and e2 are concurrent if neither happens-before the other
//!
//! # Implementation
//!
//! The domain of known thread ids is grown on demand: a monitored program
//! may spawn threads at any point, and a location's read history only
//! needs entries for the threads that actually touched it. Entries for
//! threads the clock has never seen are implicitly zero.

use super::{Epoch, ThreadId};
use std::fmt;

/// Vector clock: per-thread logical counters
///
/// # Representation
///
/// `clocks[i]` is thread `i`'s counter as last observed. Indexing is by
/// thread id; the vector grows to `tid + 1` the first time a thread is
/// written. An absent entry reads as zero.
#[derive(Debug, Clone, Default)]
pub struct VectorClock {
    clocks: Vec<u64>,
}

impl PartialEq for VectorClock {
    /// Entries past a clock's materialized domain are implicitly zero, so
    /// `[0, 3]` and `[0, 3, 0]` are the same clock.
    fn eq(&self, other: &Self) -> bool {
        let longest = self.clocks.len().max(other.clocks.len());
        (0..longest).all(|i| {
            self.clocks.get(i).copied().unwrap_or(0) == other.clocks.get(i).copied().unwrap_or(0)
        })
    }
}

impl Eq for VectorClock {}

impl VectorClock {
    /// Create an empty vector clock (all counters implicitly zero)
    #[inline]
    pub fn new() -> Self {
        Self { clocks: Vec::new() }
    }

    /// Create a clock with capacity for `threads` entries
    pub fn with_threads(threads: usize) -> Self {
        Self {
            clocks: vec![0; threads],
        }
    }

    /// Get the counter for a thread (zero if never seen)
    #[inline]
    pub fn get(&self, thread: ThreadId) -> u64 {
        self.clocks.get(thread.as_usize()).copied().unwrap_or(0)
    }

    /// Set the counter for a thread, growing the domain if needed
    #[inline]
    pub fn set(&mut self, thread: ThreadId, value: u64) {
        self.ensure_thread(thread);
        self.clocks[thread.as_usize()] = value;
    }

    /// Grow the domain to include `thread`
    pub fn ensure_thread(&mut self, thread: ThreadId) {
        let needed = thread.as_usize() + 1;
        if self.clocks.len() < needed {
            self.clocks.resize(needed, 0);
        }
    }

    /// Extract the epoch for one thread
    ///
    /// A zero counter means the thread has not contributed an access, so
    /// the extracted value is [`Epoch::ZERO`] rather than a real epoch.
    #[inline]
    pub fn epoch_of(&self, thread: ThreadId) -> Epoch {
        let clock = self.get(thread);
        if clock == 0 {
            Epoch::ZERO
        } else {
            Epoch::new(thread, clock)
        }
    }

    /// Merge with another vector clock (element-wise max)
    ///
    /// # Example
    ///
    /// ```text
    /// self:  [3, 1, 2]
    /// other: [2, 5]
    /// result:[3, 5, 2]
    /// ```
    pub fn merge(&mut self, other: &VectorClock) {
        if self.clocks.len() < other.clocks.len() {
            self.clocks.resize(other.clocks.len(), 0);
        }
        for (i, &theirs) in other.clocks.iter().enumerate() {
            self.clocks[i] = self.clocks[i].max(theirs);
        }
    }

    /// Does this clock cover the given epoch?
    ///
    /// True when the clock's counter for the epoch's thread is at least
    /// the epoch's counter, i.e. the access the epoch names is ordered at
    /// or before this clock's view of that thread. This is the comparison
    /// primitive the happens-before verdict is built from.
    ///
    /// # Panics
    ///
    /// Covering a sentinel is a caller defect ([`Epoch::ZERO`] asks about
    /// no access at all; [`Epoch::SHARED`] is not an access).
    #[inline]
    pub fn covers(&self, epoch: Epoch) -> bool {
        assert!(!epoch.is_sentinel(), "cannot cover a sentinel epoch");
        epoch.clock() <= self.get(epoch.tid())
    }

    /// Number of thread slots currently materialized
    #[inline]
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// True if no thread slot has been materialized
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, &val) in self.clocks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", val)?;
        }
        write!(f, "]")
    }
}
