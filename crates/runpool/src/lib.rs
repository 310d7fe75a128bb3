//! runpool: a fixed-arena block allocator.
//!
//! This is the top-level facade crate that re-exports the public API from the
//! runpool sub-crates. For most users, adding `runpool` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use runpool::prelude::*;
//!
//! // One small page shared by allocators for two element types.
//! let pool = PagePool::new(PoolConfig::new().with_page_capacity(64))
//!     .unwrap()
//!     .into_shared();
//! let words = PoolAllocator::<u64>::new(pool.clone());
//! let bytes: PoolAllocator<u8> = words.rebind();
//! assert_eq!(words, bytes);
//!
//! let w = words.allocate(3).unwrap();
//! let b = bytes.allocate(10).unwrap(); // two blocks
//! unsafe {
//!     w.as_ptr().write(42);
//!     b.as_ptr().write(7);
//!     assert_eq!(w.as_ptr().read(), 42);
//!     words.deallocate(w, 3).unwrap();
//!     bytes.deallocate(b, 10).unwrap();
//! }
//!
//! let metrics = words.metrics();
//! assert_eq!(metrics.pooled_allocations, 2);
//! assert_eq!(metrics.live_blocks, 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `runpool-arena` | Blocks, pages, the free-list engine, `PoolAllocator` |
//! | [`types`] | `runpool-core` | Geometry constants, config, errors, metrics, `ElementAllocator` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Pages, the free-list engine and the typed allocator (`runpool-arena`).
///
/// Most users only need [`arena::PoolAllocator`] and [`arena::PagePool`]
/// from this module; they are also available in the [`prelude`].
pub use runpool_arena as arena;

/// Constants, configuration, errors and the allocator trait (`runpool-core`).
pub use runpool_core as types;

/// Common imports for typical runpool usage.
///
/// ```rust
/// use runpool::prelude::*;
/// ```
pub mod prelude {
    // Allocation
    pub use runpool_arena::{PagePool, PoolAllocator, SharedPool};

    // Core types and traits
    pub use runpool_core::{ElementAllocator, PoolConfig, PoolMetrics};

    // Errors
    pub use runpool_core::{ConfigError, PoolError};
}
