//! A minimal growable vector over any [`ElementAllocator`].
//!
//! Enough of `Vec` to drive realistic allocation patterns: doubling growth,
//! exact-count release, and nesting (a `PoolVec` of `PoolVec`s whose
//! allocators share one pool).

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use runpool_core::{ElementAllocator, PoolError};

/// Smallest non-zero capacity handed out by growth.
const MIN_CAPACITY: usize = 4;

/// Growable array whose storage comes from `A`.
pub struct PoolVec<T, A: ElementAllocator<Value = T>> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
}

impl<T, A: ElementAllocator<Value = T>> PoolVec<T, A> {
    /// Empty vector; nothing is allocated until the first push.
    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
        }
    }

    pub fn with_capacity_in(cap: usize, alloc: A) -> Result<Self, PoolError> {
        let mut v = Self::new_in(alloc);
        v.reserve_exact(cap)?;
        Ok(v)
    }

    /// Copy `items` into a new vector.
    pub fn from_slice_in(items: &[T], alloc: A) -> Result<Self, PoolError>
    where
        T: Clone,
    {
        let mut v = Self::with_capacity_in(items.len(), alloc)?;
        for item in items {
            v.push(item.clone())?;
        }
        Ok(v)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Start of the current storage.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn push(&mut self, value: T) -> Result<(), PoolError> {
        if self.len == self.cap {
            let target = (self.cap * 2).max(MIN_CAPACITY);
            self.reserve_exact(target - self.len)?;
        }
        // SAFETY: len < cap, so the slot is inside the allocation.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was initialised and is now outside `len`.
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    /// Drop every element, keeping the storage.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Drop the elements past `len`, keeping the storage.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        self.len = len;
        // SAFETY: slots `len..len + tail` were initialised and are now outside `len`.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr().add(len),
                tail,
            ))
        };
    }

    /// Grow with clones of `value` or shrink to `new_len`.
    ///
    /// Growing past the capacity reallocates to exactly `new_len`.
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<(), PoolError>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        self.reserve_exact(new_len - self.len)?;
        while self.len < new_len {
            self.push(value.clone())?;
        }
        Ok(())
    }

    /// Make room for exactly `additional` more elements.
    ///
    /// Moves the contents to a fresh allocation and releases the old one.
    /// If the fresh allocation fails the vector is unchanged. If releasing
    /// the old storage fails, the vector already owns the fresh storage and
    /// the error is still returned.
    pub fn reserve_exact(&mut self, additional: usize) -> Result<(), PoolError> {
        let needed = self.len.checked_add(additional).ok_or(PoolError::InvalidSize {
            count: usize::MAX,
            element_size: std::mem::size_of::<T>(),
        })?;
        if needed <= self.cap {
            return Ok(());
        }
        let fresh = self.alloc.allocate(needed)?;
        // SAFETY: both regions hold at least `len` slots and are distinct
        // live allocations.
        unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), fresh.as_ptr(), self.len) };
        let old = mem::replace(&mut self.ptr, fresh);
        let old_cap = mem::replace(&mut self.cap, needed);
        if old_cap == 0 {
            return Ok(());
        }
        // SAFETY: `old` came from `allocate(old_cap)` on `alloc` and its
        // contents were moved out above.
        unsafe { self.alloc.deallocate(old, old_cap) }
    }

    /// Hand the storage back to the allocator.
    ///
    /// # Safety
    ///
    /// The elements must already be moved out or dropped; `ptr` is left
    /// dangling-equivalent and must be replaced or never used again.
    unsafe fn release_storage(&mut self) -> Result<(), PoolError> {
        if self.cap == 0 {
            return Ok(());
        }
        // SAFETY: `ptr` came from `allocate(cap)` on `alloc`.
        unsafe { self.alloc.deallocate(self.ptr, self.cap) }
    }
}

impl<T, A: ElementAllocator<Value = T>> Deref for PoolVec<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: `ptr` is non-null and aligned, and the first `len` slots are initialised.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: ElementAllocator<Value = T>> DerefMut for PoolVec<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as for `deref`, and `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T, A: ElementAllocator<Value = T>> Drop for PoolVec<T, A> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: every element was dropped above and `self` is going away.
        let released = unsafe { self.release_storage() };
        debug_assert!(released.is_ok(), "release failed: {released:?}");
    }
}

impl<T: fmt::Debug, A: ElementAllocator<Value = T>> fmt::Debug for PoolVec<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
