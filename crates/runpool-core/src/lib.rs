//! Core types and traits for the runpool block allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: block geometry,
//! pool configuration, error types, metrics counters and the
//! [`ElementAllocator`] adapter trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod id;
pub mod metrics;
pub mod traits;

pub use config::PoolConfig;
pub use error::{ConfigError, PoolError};
pub use geometry::{block_amount, BLOCK_ALIGN, BYTES_PER_BLOCK};
pub use id::PageId;
pub use metrics::PoolMetrics;
pub use traits::ElementAllocator;
