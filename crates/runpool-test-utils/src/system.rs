//! Baseline allocator that forwards every request to the system heap.

use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

use runpool_core::{ElementAllocator, PoolError};

/// [`ElementAllocator`] backed directly by `std::alloc`.
///
/// Used as the reference point in benchmarks and differential tests.
pub struct SystemAllocator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SystemAllocator<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn layout(count: usize) -> Result<Layout, PoolError> {
        Layout::array::<T>(count).map_err(|_| PoolError::InvalidSize {
            count,
            element_size: std::mem::size_of::<T>(),
        })
    }
}

impl<T> Default for SystemAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SystemAllocator<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> ElementAllocator for SystemAllocator<T> {
    type Value = T;
    type Size = usize;
    type Difference = isize;

    fn allocate(&self, count: usize) -> Result<NonNull<T>, PoolError> {
        let layout = Self::layout(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        // SAFETY: non-zero size checked above.
        let raw = unsafe { alloc::alloc(layout) };
        NonNull::new(raw.cast()).ok_or(PoolError::Heap {
            bytes: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) -> Result<(), PoolError> {
        let layout = Self::layout(count)?;
        if layout.size() != 0 {
            // SAFETY: the caller passes a pointer from `allocate` with the same count.
            unsafe { alloc::dealloc(ptr.as_ptr().cast(), layout) };
        }
        Ok(())
    }
}
