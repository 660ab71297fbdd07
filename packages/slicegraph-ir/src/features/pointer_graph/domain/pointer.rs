//! Pointers and points-to sets
//!
//! A pointer is a (target node, offset) pair. Two sentinel targets exist per
//! analysis instance and occupy fixed arena slots: the null pointer target
//! and the unknown-memory target (see [`crate::PointerSubgraph::new`]).

use super::node::PsNodeId;
use super::offset::Offset;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena slot of the NULLPTR sentinel
pub const NULLPTR_ID: PsNodeId = 0;

/// Arena slot of the UNKNOWN_MEMORY sentinel
pub const UNKNOWN_MEMORY_ID: PsNodeId = 1;

/// A (target, offset) pair in a points-to set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub target: PsNodeId,
    pub offset: Offset,
}

/// Set of pointers a node may hold
pub type PointsToSet = FxHashSet<Pointer>;

impl Pointer {
    #[inline]
    pub fn new(target: PsNodeId, offset: Offset) -> Self {
        Self { target, offset }
    }

    /// The canonical null pointer
    #[inline]
    pub fn null() -> Self {
        Self::new(NULLPTR_ID, Offset::ZERO)
    }

    /// The canonical unknown pointer
    #[inline]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_MEMORY_ID, Offset::UNKNOWN)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.target == NULLPTR_ID
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.target == UNKNOWN_MEMORY_ID
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}+{}", self.target, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_pointers() {
        assert!(Pointer::null().is_null());
        assert!(!Pointer::null().is_unknown());
        assert!(Pointer::unknown().is_unknown());
        assert!(Pointer::unknown().offset.is_unknown());
    }

    #[test]
    fn test_set_dedup() {
        let mut set = PointsToSet::default();
        assert!(set.insert(Pointer::new(5, Offset(0))));
        assert!(!set.insert(Pointer::new(5, Offset(0))));
        assert!(set.insert(Pointer::new(5, Offset(4))));
        assert_eq!(set.len(), 2);
    }
}
