//! Pool configuration parameters.

use crate::error::ConfigError;
use crate::geometry::BYTES_PER_BLOCK;

/// Configuration for a block pool.
///
/// Controls page sizing, how many pages the pool may create, and where
/// requests stop being pooled and go straight to the system heap.
/// Validated when the pool is built; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Capacity of each page in blocks.
    ///
    /// Default: 100_000 (800KB at 8 bytes per block).
    pub page_capacity: usize,

    /// Maximum number of pages the pool may create.
    ///
    /// Default: 1, which bounds the pool to a single fixed arena. Higher
    /// values let the pool append a fresh page when every existing page
    /// is exhausted.
    pub max_pages: usize,

    /// Requests larger than this many bytes bypass the pool.
    ///
    /// Default: 0x1000 (4KB).
    pub oversized_threshold: usize,
}

impl PoolConfig {
    /// Default page capacity in blocks.
    pub const DEFAULT_PAGE_CAPACITY: usize = 100_000;

    /// Default page limit.
    pub const DEFAULT_MAX_PAGES: usize = 1;

    /// Default oversized-request threshold in bytes.
    pub const DEFAULT_OVERSIZED_THRESHOLD: usize = 0x1000;

    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self {
            page_capacity: Self::DEFAULT_PAGE_CAPACITY,
            max_pages: Self::DEFAULT_MAX_PAGES,
            oversized_threshold: Self::DEFAULT_OVERSIZED_THRESHOLD,
        }
    }

    /// Set the page capacity in blocks.
    pub fn with_page_capacity(mut self, blocks: usize) -> Self {
        self.page_capacity = blocks;
        self
    }

    /// Set the maximum number of pages.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Set the oversized-request threshold in bytes.
    pub fn with_oversized_threshold(mut self, bytes: usize) -> Self {
        self.oversized_threshold = bytes;
        self
    }

    /// Size of one page's block storage in bytes.
    ///
    /// Returns `None` if it overflows the addressable size.
    pub fn page_bytes(&self) -> Option<usize> {
        crate::geometry::byte_size(self.page_capacity, BYTES_PER_BLOCK)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_capacity == 0 {
            return Err(ConfigError::ZeroPageCapacity);
        }
        if self.max_pages == 0 {
            return Err(ConfigError::ZeroMaxPages);
        }
        if self.page_bytes().is_none() {
            return Err(ConfigError::PageTooLarge {
                blocks: self.page_capacity,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
