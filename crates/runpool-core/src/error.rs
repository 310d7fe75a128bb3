//! Error types for the runpool allocator.
//!
//! Every failure is surfaced to the caller immediately; nothing is
//! retried or downgraded. [`PoolError`] covers allocation and release,
//! [`ConfigError`] covers pool construction.

use std::error::Error;
use std::fmt;

/// Errors from `allocate` and `deallocate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// `count * element_size` is not representable as an allocation size.
    ///
    /// Detected before any pool state is touched.
    InvalidSize {
        /// Number of elements requested.
        count: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// No free run of the requested length fits in any page, and the
    /// pool may not create another one. Pool state is unchanged.
    Exhausted {
        /// Run length that could not be placed, in blocks.
        requested_blocks: usize,
        /// Capacity of one page, in blocks.
        page_capacity: usize,
        /// Number of pages searched.
        pages: usize,
    },
    /// A pointer passed to `deallocate` lies in none of the pool's pages.
    ForeignPointer {
        /// Address of the rejected pointer.
        address: usize,
    },
    /// The system heap refused an oversized request.
    Heap {
        /// Requested size in bytes.
        bytes: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
    /// The system heap refused the backing storage for a new page.
    PageAllocation {
        /// Page capacity in blocks.
        blocks: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize {
                count,
                element_size,
            } => {
                write!(
                    f,
                    "invalid allocation size: {count} elements of {element_size} bytes"
                )
            }
            Self::Exhausted {
                requested_blocks,
                page_capacity,
                pages,
            } => {
                write!(
                    f,
                    "pool exhausted: no run of {requested_blocks} blocks in {pages} page(s) of {page_capacity} blocks"
                )
            }
            Self::ForeignPointer { address } => {
                write!(f, "pointer {address:#x} is not owned by any page")
            }
            Self::Heap { bytes, align } => {
                write!(f, "system heap refused {bytes} bytes (align {align})")
            }
            Self::PageAllocation { blocks } => {
                write!(f, "failed to reserve storage for a page of {blocks} blocks")
            }
        }
    }
}

impl Error for PoolError {}

/// Errors from [`PoolConfig::validate`](crate::PoolConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A page must hold at least one block.
    ZeroPageCapacity,
    /// The pool must be allowed at least one page.
    ZeroMaxPages,
    /// The page's byte size does not fit in an allocation.
    PageTooLarge {
        /// Requested page capacity in blocks.
        blocks: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPageCapacity => write!(f, "page capacity must be at least one block"),
            Self::ZeroMaxPages => write!(f, "max_pages must be at least 1"),
            Self::PageTooLarge { blocks } => {
                write!(f, "page of {blocks} blocks exceeds the addressable size")
            }
        }
    }
}

impl Error for ConfigError {}
