//! The block cell: one allocation granule.
//!
//! A [`Block`] holds either user payload or a forward link to another block
//! of the same page. Which reading is valid is decided by the page's tag
//! array, never by the block itself.

use std::mem;

use runpool_core::{BLOCK_ALIGN, BYTES_PER_BLOCK};

/// One fixed-size storage cell.
///
/// `payload` is the user's view; `link` is the index of the next free
/// block and is only meaningful while the block is tagged as a sentinel.
#[repr(C)]
#[derive(Clone, Copy)]
pub union Block {
    /// Raw user payload.
    pub payload: u64,
    /// Index of the next known free block in the same page.
    pub link: usize,
}

const _: () = assert!(mem::size_of::<Block>() == BYTES_PER_BLOCK);
const _: () = assert!(mem::align_of::<Block>() == BLOCK_ALIGN);

impl Block {
    /// A block carrying a link to `index`.
    pub const fn linking_to(index: usize) -> Block {
        Block { link: index }
    }
}
