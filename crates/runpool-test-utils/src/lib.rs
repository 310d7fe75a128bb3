//! Test containers and fixtures for runpool development.
//!
//! Provides [`PoolVec`], a minimal growable vector generic over any
//! [`ElementAllocator`](runpool_core::ElementAllocator), a system-heap
//! baseline allocator, and fixture configurations sized so that tests hit
//! page boundaries quickly.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
#[allow(unsafe_code)]
pub mod system;
#[allow(unsafe_code)]
pub mod vec;

pub use fixtures::{pattern, scenario_pool, small_config, tiny_config};
pub use system::SystemAllocator;
pub use vec::PoolVec;
