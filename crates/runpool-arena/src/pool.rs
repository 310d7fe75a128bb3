//! Growable list of pages with ownership lookup.
//!
//! A [`PagePool`] owns every [`Page`] created for it, in creation order.
//! Pages are created lazily on the first pooled request and, when
//! [`PoolConfig::max_pages`] allows it, appended when no existing page can
//! hold a request. A single request never spans pages.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

use runpool_core::{ConfigError, PageId, PoolConfig, PoolError, PoolMetrics};

use crate::block::Block;
use crate::freelist;
use crate::page::{Page, PageState};

/// Shared handle to a pool.
///
/// Every allocator built on the same pool holds one of these. The handle is
/// neither `Send` nor `Sync`, so a pool and its allocators stay on the thread
/// that created them.
pub type SharedPool = Rc<RefCell<PagePool>>;

/// The pages backing one family of allocators, plus their counters.
#[derive(Debug)]
pub struct PagePool {
    config: PoolConfig,
    pages: Vec<Page>,
    metrics: PoolMetrics,
}

impl PagePool {
    /// Create an empty pool. No page is reserved until the first request.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: PoolConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            metrics: PoolMetrics::default(),
        }
    }

    /// Wrap the pool in a [`SharedPool`] handle.
    pub fn into_shared(self) -> SharedPool {
        Rc::new(RefCell::new(self))
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Counters accumulated so far.
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Look up a page by id.
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.0 as usize)
    }

    /// Bookkeeping snapshot of every page, in creation order.
    pub fn page_states(&self) -> Vec<PageState> {
        self.pages.iter().map(Page::state).collect()
    }

    /// Total bytes of block storage reserved by all pages.
    pub fn memory_bytes(&self) -> usize {
        self.pages.iter().map(Page::memory_bytes).sum()
    }

    /// The page whose storage contains `addr`.
    ///
    /// Every page is checked before giving up.
    pub fn owner_of(&self, addr: usize) -> Option<PageId> {
        self.pages
            .iter()
            .position(|page| page.contains(addr))
            .map(|i| PageId(i as u32))
    }

    /// Claim a run of `block_amount` blocks.
    ///
    /// Every existing page is tried in creation order; a new page is
    /// appended only when all of them fail and the limit allows it.
    /// On failure no page's free chain or cursors have changed.
    pub fn allocate_blocks(&mut self, block_amount: usize) -> Result<NonNull<Block>, PoolError> {
        if block_amount == 0 {
            return Ok(NonNull::dangling());
        }

        if block_amount <= self.config.page_capacity {
            for i in 0..self.pages.len() {
                if let Some(ptr) = self.claim_on(i, block_amount) {
                    return Ok(ptr);
                }
            }

            if self.pages.len() < self.config.max_pages {
                let i = self.push_page()?;
                if let Some(ptr) = self.claim_on(i, block_amount) {
                    return Ok(ptr);
                }
            }
        }

        self.metrics.exhausted_failures += 1;
        log::debug!(
            "pool exhausted: {block_amount} blocks requested, {} page(s) of {} blocks",
            self.pages.len(),
            self.config.page_capacity
        );
        Err(PoolError::Exhausted {
            requested_blocks: block_amount,
            page_capacity: self.config.page_capacity,
            pages: self.pages.len(),
        })
    }

    /// Return a run of `block_amount` blocks starting at `ptr`.
    ///
    /// A pointer that lies in none of the pages, or inside a page but off a
    /// block boundary, is rejected with [`PoolError::ForeignPointer`].
    ///
    /// # Safety
    ///
    /// Unless it is rejected, `ptr` and `block_amount` must come from a single
    /// earlier [`allocate_blocks`](Self::allocate_blocks) call on this pool
    /// that has not been released yet.
    pub unsafe fn release_blocks(
        &mut self,
        ptr: NonNull<Block>,
        block_amount: usize,
    ) -> Result<(), PoolError> {
        if block_amount == 0 {
            return Ok(());
        }
        let addr = ptr.as_ptr() as usize;
        let id = self
            .owner_of(addr)
            .ok_or(PoolError::ForeignPointer { address: addr })?;
        let page = &mut self.pages[id.0 as usize];
        let index = page
            .index_of(addr)
            .ok_or(PoolError::ForeignPointer { address: addr })?;

        freelist::release(page, index, block_amount);
        log::trace!(
            "release page={id} index={index} blocks={block_amount} begin={} end={}",
            page.begin,
            page.end
        );

        self.metrics.pooled_deallocations += 1;
        self.metrics.live_blocks -= block_amount;
        Ok(())
    }

    /// Count an oversized allocation served by the system heap.
    pub(crate) fn record_heap_allocation(&mut self) {
        self.metrics.heap_allocations += 1;
    }

    /// Count an oversized release handed back to the system heap.
    pub(crate) fn record_heap_deallocation(&mut self) {
        self.metrics.heap_deallocations += 1;
    }

    fn push_page(&mut self) -> Result<usize, PoolError> {
        let page = Page::new(self.config.page_capacity)?;
        self.pages.push(page);
        self.metrics.pages_created += 1;
        let i = self.pages.len() - 1;
        log::debug!(
            "created page {i} with {} blocks at {:p}",
            self.config.page_capacity,
            self.pages[i].block_ptr(0)
        );
        Ok(i)
    }

    fn claim_on(&mut self, i: usize, block_amount: usize) -> Option<NonNull<Block>> {
        let page = &mut self.pages[i];
        let Some(claim) = freelist::claim(page, block_amount) else {
            page.exhausted = true;
            log::debug!("page {i} cannot fit {block_amount} blocks");
            return None;
        };
        log::trace!(
            "claim page={i} index={} blocks={block_amount} jumps={} begin={} end={}",
            claim.index,
            claim.jumps,
            page.begin,
            page.end
        );
        page.exhausted = false;
        let ptr = page.block_ptr(claim.index);

        self.metrics.pooled_allocations += 1;
        self.metrics.jumps += u64::from(claim.jumps);
        self.metrics.sentinels_absorbed += u64::from(claim.absorbed);
        self.metrics.live_blocks += block_amount;
        self.metrics.high_water_blocks =
            self.metrics.high_water_blocks.max(self.metrics.live_blocks);
        Some(ptr)
    }
}

impl Default for PagePool {
    fn default() -> Self {
        Self::with_valid_config(PoolConfig::default())
    }
}
