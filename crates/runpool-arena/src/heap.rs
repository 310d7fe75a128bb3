//! Passthrough to the system heap for requests the pool does not serve.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use runpool_core::PoolError;

/// Allocate `layout` from the system heap.
///
/// `layout` must have a non-zero size.
pub(crate) fn allocate(layout: Layout) -> Result<NonNull<u8>, PoolError> {
    assert!(layout.size() > 0, "zero-sized heap request");
    // SAFETY: the layout has a non-zero size (asserted above).
    let raw = unsafe { alloc::alloc(layout) };
    NonNull::new(raw).ok_or(PoolError::Heap {
        bytes: layout.size(),
        align: layout.align(),
    })
}

/// Return memory obtained from [`allocate`].
///
/// # Safety
///
/// `ptr` must have been returned by [`allocate`] with the same `layout` and
/// not released since.
pub(crate) unsafe fn deallocate(ptr: NonNull<u8>, layout: Layout) {
    // SAFETY: guaranteed by the caller.
    unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
}
