//! Allocation counters for a block pool.
//!
//! [`PoolMetrics`] is a plain snapshot of counters maintained by the pool.
//! Cumulative fields only grow; gauge fields (`live_blocks`) move both ways.

use crate::geometry::BYTES_PER_BLOCK;

/// Counters collected by a pool over its lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Cumulative allocations served from a page.
    pub pooled_allocations: u64,
    /// Cumulative runs returned to a page.
    pub pooled_deallocations: u64,
    /// Cumulative oversized allocations served by the system heap.
    pub heap_allocations: u64,
    /// Cumulative oversized releases handed back to the system heap.
    pub heap_deallocations: u64,
    /// Cumulative sentinel jumps taken while searching for a run.
    pub jumps: u64,
    /// Cumulative sentinels absorbed into the end of a claimed run.
    pub sentinels_absorbed: u64,
    /// Cumulative allocations rejected because every page was exhausted.
    pub exhausted_failures: u64,
    /// Number of pages created so far.
    pub pages_created: usize,
    /// Blocks currently handed out across all pages.
    pub live_blocks: usize,
    /// Largest value `live_blocks` has reached.
    pub high_water_blocks: usize,
}

impl PoolMetrics {
    /// Bytes currently handed out from pages (block-granular).
    pub fn live_bytes(&self) -> usize {
        self.live_blocks * BYTES_PER_BLOCK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = PoolMetrics::default();
        assert_eq!(m.pooled_allocations, 0);
        assert_eq!(m.pooled_deallocations, 0);
        assert_eq!(m.heap_allocations, 0);
        assert_eq!(m.heap_deallocations, 0);
        assert_eq!(m.jumps, 0);
        assert_eq!(m.sentinels_absorbed, 0);
        assert_eq!(m.exhausted_failures, 0);
        assert_eq!(m.pages_created, 0);
        assert_eq!(m.live_blocks, 0);
        assert_eq!(m.high_water_blocks, 0);
    }

    #[test]
    fn live_bytes_is_block_granular() {
        let m = PoolMetrics {
            live_blocks: 3,
            ..Default::default()
        };
        assert_eq!(m.live_bytes(), 24);
    }
}
