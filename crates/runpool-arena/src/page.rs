//! Fixed-capacity block pages.
//!
//! A [`Page`] is a contiguous run of [`Block`]s reserved once from the
//! system heap, a parallel tag array, and two cursors:
//!
//! ```text
//!  0                begin              end                  capacity
//!  ├── used/free ───┼── used/free runs ─┼── never handed out ──┤
//!                   ▲                   ▲
//!           head of free space     high-water mark
//! ```
//!
//! Blocks at or past `end` are implicitly free and carry no tag. Between
//! `begin` and `end` free runs are chained through sentinels: a free run
//! that does not flow straight into the next free region has its last
//! block tagged, and that block's [`Block::link`] names where free space
//! resumes.
//!
//! The page has no allocation policy of its own; the free-list engine in
//! [`crate::freelist`] drives it.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use runpool_core::{PoolError, BYTES_PER_BLOCK};

use crate::block::Block;

/// A fixed-capacity arena of blocks with its free-chain bookkeeping.
pub struct Page {
    /// Block storage, `capacity` blocks long. Only ever accessed through
    /// raw pointers so that payload pointers handed to callers stay valid
    /// while the engine rewrites other blocks.
    storage: NonNull<Block>,
    layout: Layout,
    /// `tags[i]` is true iff block `i` currently holds a link.
    tags: Vec<bool>,
    capacity: usize,
    /// First free block index.
    pub(crate) begin: usize,
    /// One past the highest block ever handed out.
    pub(crate) end: usize,
    /// Blocks currently handed out.
    pub(crate) live_blocks: usize,
    /// Set when a request failed on this page for lack of space; cleared
    /// by the next successful claim or any release.
    pub(crate) exhausted: bool,
}

impl Page {
    /// Reserve a page of `capacity` blocks.
    ///
    /// The storage is zero-initialised and every block starts untagged with
    /// `begin = end = 0`.
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        let err = PoolError::PageAllocation { blocks: capacity };
        if capacity == 0 {
            return Err(err);
        }
        let layout = Layout::array::<Block>(capacity).map_err(|_| err.clone())?;
        // SAFETY: `layout` has a non-zero size because `capacity > 0` and
        // `Block` is not zero-sized.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let storage = NonNull::new(raw.cast::<Block>()).ok_or(err)?;
        Ok(Self {
            storage,
            layout,
            tags: vec![false; capacity],
            capacity,
            begin: 0,
            end: 0,
            live_blocks: 0,
            exhausted: false,
        })
    }

    /// Capacity in blocks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Head of free space.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// High-water mark: one past the highest block ever handed out.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Blocks currently handed out from this page.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks
    }

    /// Whether the last request tried on this page failed for lack of
    /// space and nothing has been released since.
    ///
    /// Diagnostic only: the pool still tries this page for every request.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether block `index` is a sentinel.
    pub fn is_sentinel(&self, index: usize) -> bool {
        self.tags[index]
    }

    /// The link stored in sentinel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or not a sentinel.
    pub fn link(&self, index: usize) -> usize {
        assert!(self.tags[index], "block {index} is not a sentinel");
        // SAFETY: `index < capacity` (checked by the tag lookup above), and
        // a tagged block always had its link written by `set_link` before
        // the tag was raised, so the `link` field is initialised.
        unsafe { (*self.storage.as_ptr().add(index)).link }
    }

    /// Tag block `index` as a sentinel linking to `next`.
    pub(crate) fn set_sentinel(&mut self, index: usize, next: usize) {
        self.write_link(index, next);
        self.tags[index] = true;
    }

    /// Rewrite the link of an existing sentinel.
    pub(crate) fn set_link(&mut self, index: usize, next: usize) {
        assert!(self.tags[index], "block {index} is not a sentinel");
        self.write_link(index, next);
    }

    /// Drop the sentinel tag on block `index`; its bits become payload.
    pub(crate) fn clear_sentinel(&mut self, index: usize) {
        self.tags[index] = false;
    }

    fn write_link(&mut self, index: usize, next: usize) {
        assert!(index < self.capacity, "block {index} out of range");
        // SAFETY: `index < capacity`, so the pointer is inside the storage
        // allocation. The block is free (the caller is threading the free
        // chain through it), so no caller-held payload pointer observes it.
        unsafe { self.storage.as_ptr().add(index).write(Block::linking_to(next)) }
    }

    /// Pointer to block `index`. `index == capacity` yields the one-past-end
    /// pointer.
    pub fn block_ptr(&self, index: usize) -> NonNull<Block> {
        assert!(index <= self.capacity, "block {index} out of range");
        // SAFETY: `index <= capacity` keeps the offset within (or one past)
        // the storage allocation.
        unsafe { self.storage.add(index) }
    }

    fn base_addr(&self) -> usize {
        self.storage.as_ptr() as usize
    }

    /// Whether `addr` falls inside this page's block storage.
    pub fn contains(&self, addr: usize) -> bool {
        let base = self.base_addr();
        addr >= base && addr - base < self.capacity * BYTES_PER_BLOCK
    }

    /// Block index of `addr`, if it is the start of a block in this page.
    pub fn index_of(&self, addr: usize) -> Option<usize> {
        if !self.contains(addr) {
            return None;
        }
        let offset = addr - self.base_addr();
        (offset % BYTES_PER_BLOCK == 0).then_some(offset / BYTES_PER_BLOCK)
    }

    /// Snapshot the cursors and the sentinel chain.
    pub fn state(&self) -> PageState {
        let sentinels = self
            .tags
            .iter()
            .enumerate()
            .filter(|&(_, &tagged)| tagged)
            .map(|(i, _)| (i, self.link(i)))
            .collect();
        PageState {
            begin: self.begin,
            end: self.end,
            live_blocks: self.live_blocks,
            sentinels,
        }
    }

    /// Size of the block storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        // SAFETY: `storage` was returned by `alloc_zeroed(self.layout)` and
        // is released exactly once, here.
        unsafe { alloc::dealloc(self.storage.as_ptr().cast::<u8>(), self.layout) }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("storage", &self.storage)
            .field("capacity", &self.capacity)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("live_blocks", &self.live_blocks)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Point-in-time view of a page's bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageState {
    /// Head of free space.
    pub begin: usize,
    /// High-water mark.
    pub end: usize,
    /// Blocks currently handed out.
    pub live_blocks: usize,
    /// Every sentinel as `(index, link)`, in index order.
    pub sentinels: Vec<(usize, usize)>,
}
