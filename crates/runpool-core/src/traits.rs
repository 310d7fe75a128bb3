//! The allocator adapter contract consumed by generic containers.

use std::ptr::NonNull;

use crate::error::PoolError;

/// Minimal typed-allocator contract for container adapters.
///
/// A container asks for room for `count` values of [`Value`](Self::Value)
/// and later gives the same region back with the same `count`. No size is
/// stored per allocation, so the pairing is the caller's responsibility.
pub trait ElementAllocator {
    /// Element type this allocator hands out storage for.
    type Value;
    /// Unsigned type used for element counts.
    type Size;
    /// Signed type used for distances between elements.
    type Difference;

    /// Reserve uninitialised storage for `count` values.
    ///
    /// A `count` of zero (or a zero-sized `Value`) returns a dangling,
    /// well-aligned pointer without touching any pool state.
    fn allocate(&self, count: usize) -> Result<NonNull<Self::Value>, PoolError>;

    /// Release storage previously returned by [`allocate`](Self::allocate).
    ///
    /// Implementations that can tell a pointer is not theirs report it as
    /// [`PoolError::ForeignPointer`] and leave their state untouched.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator (or one sharing its
    /// pool), `count` must equal the count passed to that call, and the
    /// region must not be released twice. A mismatched count corrupts the
    /// pool's free chain, after which it may hand out overlapping storage.
    #[allow(unsafe_code)]
    unsafe fn deallocate(&self, ptr: NonNull<Self::Value>, count: usize) -> Result<(), PoolError>;
}
