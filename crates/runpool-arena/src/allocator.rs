//! Typed allocator façade over a shared [`PagePool`].
//!
//! [`PoolAllocator<T>`] turns element counts into block counts, sends
//! oversized (or over-aligned) requests to the system heap, and hands the
//! rest to the pool. No per-allocation header is stored: `deallocate`
//! recomputes the same placement from the same `count`.

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;

use runpool_core::geometry::byte_size;
use runpool_core::{
    block_amount, ConfigError, ElementAllocator, PoolConfig, PoolError, PoolMetrics, BLOCK_ALIGN,
};

use crate::heap;
use crate::pool::{PagePool, SharedPool};

/// Where a request of a given count is served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// Zero bytes: a dangling pointer, no state touched.
    Empty,
    /// A run of this many blocks in a page.
    Pooled(usize),
    /// The system heap, bypassing every page.
    Heap(Layout),
}

/// Allocator for values of type `T` backed by a block pool.
///
/// Cloning is cheap and shares the pool; so does [`rebind`](Self::rebind).
/// Two allocators compare equal when they share a pool, meaning storage from
/// one may be released through the other.
///
/// # Example
///
/// ```
/// use runpool_arena::PoolAllocator;
/// use runpool_core::PoolConfig;
///
/// let alloc = PoolAllocator::<u32>::with_config(PoolConfig::new().with_page_capacity(64)).unwrap();
/// let ptr = alloc.allocate(4).unwrap();
/// unsafe {
///     ptr.as_ptr().write(7);
///     assert_eq!(ptr.as_ptr().read(), 7);
///     alloc.deallocate(ptr, 4).unwrap();
/// }
/// ```
pub struct PoolAllocator<T> {
    pool: SharedPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PoolAllocator<T> {
    /// Create an allocator on an existing pool.
    pub fn new(pool: SharedPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Create an allocator with a private pool built from `config`.
    pub fn with_config(config: PoolConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(PagePool::new(config)?.into_shared()))
    }

    /// The pool this allocator draws from.
    pub fn pool(&self) -> &SharedPool {
        &self.pool
    }

    /// An allocator for `U` on the same pool.
    pub fn rebind<U>(&self) -> PoolAllocator<U> {
        PoolAllocator::new(Rc::clone(&self.pool))
    }

    /// Whether `other` draws from the same pool.
    pub fn shares_pool_with<U>(&self, other: &PoolAllocator<U>) -> bool {
        Rc::ptr_eq(&self.pool, &other.pool)
    }

    /// Snapshot of the pool's counters.
    pub fn metrics(&self) -> PoolMetrics {
        self.pool.borrow().metrics().clone()
    }

    fn placement(&self, count: usize) -> Result<Placement, PoolError> {
        let element_size = mem::size_of::<T>();
        let invalid = PoolError::InvalidSize {
            count,
            element_size,
        };
        let bytes = byte_size(count, element_size).ok_or_else(|| invalid.clone())?;
        if bytes == 0 {
            return Ok(Placement::Empty);
        }
        let threshold = self.pool.borrow().config().oversized_threshold;
        if bytes > threshold || mem::align_of::<T>() > BLOCK_ALIGN {
            let layout = Layout::array::<T>(count).map_err(|_| invalid)?;
            return Ok(Placement::Heap(layout));
        }
        Ok(Placement::Pooled(block_amount(bytes)))
    }

    /// Reserve uninitialised storage for `count` values of `T`.
    ///
    /// Fails with [`PoolError::InvalidSize`] if the byte size overflows,
    /// [`PoolError::Exhausted`] if no page can hold the run, or
    /// [`PoolError::Heap`] if an oversized request is refused.
    pub fn allocate(&self, count: usize) -> Result<NonNull<T>, PoolError> {
        match self.placement(count)? {
            Placement::Empty => Ok(NonNull::dangling()),
            Placement::Pooled(blocks) => {
                let ptr = self.pool.borrow_mut().allocate_blocks(blocks)?;
                Ok(ptr.cast())
            }
            Placement::Heap(layout) => {
                let ptr = heap::allocate(layout)?;
                log::trace!("heap allocate {} bytes at {ptr:p}", layout.size());
                self.pool.borrow_mut().record_heap_allocation();
                Ok(ptr.cast())
            }
        }
    }

    /// Release storage for `count` values previously returned by
    /// [`allocate`](Self::allocate).
    ///
    /// A pool-sized request whose pointer lies in none of the pool's pages
    /// is rejected with [`PoolError::ForeignPointer`] and changes nothing.
    ///
    /// # Safety
    ///
    /// Unless it is rejected as foreign, `ptr` must come from `allocate` on an
    /// allocator sharing this pool, with the same `count`, and must not have
    /// been released already.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) -> Result<(), PoolError> {
        match self.placement(count)? {
            Placement::Empty => Ok(()),
            Placement::Pooled(blocks) => {
                // SAFETY: forwarded from the caller's contract.
                unsafe { self.pool.borrow_mut().release_blocks(ptr.cast(), blocks) }
            }
            Placement::Heap(layout) => {
                log::trace!("heap release {} bytes at {ptr:p}", layout.size());
                // SAFETY: the same count gives the same layout, and the caller
                // guarantees `ptr` came from the heap path of `allocate`.
                unsafe { heap::deallocate(ptr.cast(), layout) };
                self.pool.borrow_mut().record_heap_deallocation();
                Ok(())
            }
        }
    }
}

impl<T> ElementAllocator for PoolAllocator<T> {
    type Value = T;
    type Size = usize;
    type Difference = isize;

    fn allocate(&self, count: usize) -> Result<NonNull<T>, PoolError> {
        PoolAllocator::allocate(self, count)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) -> Result<(), PoolError> {
        // SAFETY: same contract as the trait method.
        unsafe { PoolAllocator::deallocate(self, ptr, count) }
    }
}

impl<T> Clone for PoolAllocator<T> {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.pool))
    }
}

impl<T, U> PartialEq<PoolAllocator<U>> for PoolAllocator<T> {
    fn eq(&self, other: &PoolAllocator<U>) -> bool {
        self.shares_pool_with(other)
    }
}

impl<T> Eq for PoolAllocator<T> {}

impl<T> Default for PoolAllocator<T> {
    /// An allocator with a private pool using [`PoolConfig::default`].
    fn default() -> Self {
        Self::new(PagePool::default().into_shared())
    }
}

impl<T> fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("pool", &Rc::as_ptr(&self.pool))
            .finish()
    }
}
