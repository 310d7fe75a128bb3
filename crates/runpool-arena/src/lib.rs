//! Fixed-arena block allocation for runpool.
//!
//! Storage is carved out of pages of 8-byte blocks. Free runs are tracked
//! inside the pages themselves, with no side allocation, and adjacent free
//! runs merge on release. This is the only runpool crate that contains
//! `unsafe` code; it is confined to the page storage, the heap passthrough,
//! and the pointer-facing pool and allocator entry points.
//!
//! # Architecture
//!
//! ```text
//! PoolAllocator<T> (typed façade, one per element type)
//! ├── heap passthrough (requests above the oversized threshold)
//! └── SharedPool = Rc<RefCell<PagePool>>
//!     └── Page[] (created lazily, up to max_pages)
//!         ├── Block[capacity]  payload or link
//!         ├── tags[capacity]   true = block holds a link
//!         └── begin / end cursors, driven by freelist::{claim, release}
//! ```
//!
//! # Placement
//!
//! A request for `count` values of `T` needs
//! `ceil(count * size_of::<T>() / 8)` blocks. Zero-byte requests get a
//! dangling pointer; requests above the threshold, or for types aligned
//! beyond a block, go to the system heap. Everything else is a single run
//! inside one page.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

#[allow(unsafe_code)]
pub mod allocator;
pub mod block;
pub mod freelist;
#[allow(unsafe_code)]
mod heap;
#[allow(unsafe_code)]
pub mod page;
#[allow(unsafe_code)]
pub mod pool;

// Public re-exports for the primary API surface.
pub use allocator::PoolAllocator;
pub use block::Block;
pub use page::{Page, PageState};
pub use pool::{PagePool, SharedPool};
