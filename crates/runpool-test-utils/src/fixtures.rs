//! Reusable pool configurations and value patterns.
//!
//! - [`tiny_config`]: one 8-block page, the size used in worked examples.
//! - [`small_config`]: one 1024-block page.
//! - [`scenario_pool`]: a shared pool on [`tiny_config`].
//! - [`pattern`]: a deterministic value for checking payload integrity.

use runpool_arena::{PagePool, SharedPool};
use runpool_core::PoolConfig;

/// A single page of 8 blocks.
pub fn tiny_config() -> PoolConfig {
    PoolConfig::new().with_page_capacity(8)
}

/// A single page of 1024 blocks.
pub fn small_config() -> PoolConfig {
    PoolConfig::new().with_page_capacity(1024)
}

/// Shared pool built on [`tiny_config`].
pub fn scenario_pool() -> SharedPool {
    PagePool::new(tiny_config())
        .expect("tiny config is valid")
        .into_shared()
}

/// Deterministic value for slot `inner` of container `outer`.
///
/// Distinct for every pair likely to appear in a test, and never zero, so a
/// slot overwritten by free-chain bookkeeping is caught.
pub fn pattern(outer: usize, inner: usize) -> u64 {
    (((outer as u64) << 32) | inner as u64) ^ 0x9E37_79B9_7F4A_7C15
}
