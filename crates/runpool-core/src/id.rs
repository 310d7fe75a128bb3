//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a page within a pool.
///
/// Pages are created in order and never removed while their pool is
/// alive, so `PageId(n)` is the n-th page the pool created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PageId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
