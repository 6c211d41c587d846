//! Shadow State Types

use crate::domain::epoch::{Epoch, VectorClock};
use std::fmt;
use std::sync::Arc;

/// Kind of the access that creates a shadow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// The first observed access was a read
    Read,
    /// The first observed access was a write
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

/// Opaque diagnostic identifier for an access site
///
/// Caller-supplied (typically a code-location string), stored and rendered
/// verbatim. Has no effect on the transition logic; it only travels along
/// for error reporting. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceTag(Arc<str>);

impl SourceTag {
    /// View the tag as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceTag {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SourceTag {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a location's read history
///
/// Either no read since the last write, a single reading thread's epoch,
/// or — once a second thread has read the location — a full per-thread
/// vector. The composition is one-directional: a shared summary never
/// reverts to exclusive until a new write resets the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSummary {
    /// No read since the last write
    None,
    /// At most one thread has read since the last write
    Exclusive(Epoch),
    /// More than one thread has read; per-thread counters
    Shared(VectorClock),
}

impl ReadSummary {
    /// Is the summary in shared (vector) mode?
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, ReadSummary::Shared(_))
    }
}

impl fmt::Display for ReadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadSummary::None => write!(f, "ZERO"),
            ReadSummary::Exclusive(epoch) => write!(f, "{epoch}"),
            ReadSummary::Shared(vc) => write!(f, "SHARED{vc}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::epoch::ThreadId;

    #[test]
    fn test_source_tag_verbatim() {
        let tag = SourceTag::from("src/worker.rs:142");
        assert_eq!(tag.as_str(), "src/worker.rs:142");
        assert_eq!(tag.to_string(), "src/worker.rs:142");
    }

    #[test]
    fn test_source_tag_clone_is_same_content() {
        let tag = SourceTag::from(String::from("alloc.c:99"));
        let other = tag.clone();
        assert_eq!(tag, other);
    }

    #[test]
    fn test_read_summary_display() {
        assert_eq!(ReadSummary::None.to_string(), "ZERO");

        let e = Epoch::new(ThreadId(2), 1);
        assert_eq!(ReadSummary::Exclusive(e).to_string(), "t2@1");

        let mut vc = VectorClock::new();
        vc.set(ThreadId(1), 3);
        assert_eq!(ReadSummary::Shared(vc).to_string(), "SHARED[0, 3]");
    }

    #[test]
    fn test_shared_predicate() {
        assert!(!ReadSummary::None.is_shared());
        assert!(ReadSummary::Shared(VectorClock::new()).is_shared());
    }
}
