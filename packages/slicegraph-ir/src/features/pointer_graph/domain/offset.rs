//! Byte offsets within abstract memory objects
//!
//! An offset is either a concrete non-negative byte count or the sentinel
//! [`UNKNOWN_OFFSET`]. The sentinel absorbs under addition: once pointer
//! arithmetic loses track of an offset it never becomes concrete again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Byte offset into a memory object, or unknown
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Offset(pub u64);

/// Sentinel representing any/unknown offset
pub const UNKNOWN_OFFSET: Offset = Offset(u64::MAX);

impl Offset {
    pub const ZERO: Offset = Offset(0);

    /// The unknown sentinel
    pub const UNKNOWN: Offset = UNKNOWN_OFFSET;

    #[inline]
    pub fn is_unknown(self) -> bool {
        self == UNKNOWN_OFFSET
    }

    /// Add with saturation against a cap: unknown absorbs, overflow and any
    /// result beyond `cap` widen to unknown.
    #[inline]
    pub fn add_capped(self, rhs: Offset, cap: Offset) -> Offset {
        let sum = self + rhs;
        if sum > cap {
            UNKNOWN_OFFSET
        } else {
            sum
        }
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        if self.is_unknown() || rhs.is_unknown() {
            return UNKNOWN_OFFSET;
        }
        match self.0.checked_add(rhs.0) {
            Some(sum) => Offset(sum),
            None => UNKNOWN_OFFSET,
        }
    }
}

impl From<u64> for Offset {
    fn from(value: u64) -> Self {
        Offset(value)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "?")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
