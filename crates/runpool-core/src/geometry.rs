//! Block geometry: the allocation granule and byte-to-block conversion.

use std::mem;

/// Width of one block, the allocation granule, in bytes.
pub const BYTES_PER_BLOCK: usize = mem::size_of::<u64>();

/// Alignment guaranteed for every block handed out by a page.
///
/// Element types with a stricter alignment cannot be placed in a page
/// and are routed to the system heap instead.
pub const BLOCK_ALIGN: usize = mem::align_of::<u64>();

/// Number of blocks needed to hold `bytes` bytes (rounded up).
///
/// # Examples
///
/// ```
/// use runpool_core::block_amount;
///
/// assert_eq!(block_amount(0), 0);
/// assert_eq!(block_amount(1), 1);
/// assert_eq!(block_amount(8), 1);
/// assert_eq!(block_amount(9), 2);
/// ```
pub const fn block_amount(bytes: usize) -> usize {
    bytes.div_ceil(BYTES_PER_BLOCK)
}

/// Total byte size of `count` elements of `element_size` bytes each.
///
/// Returns `None` if the product overflows or exceeds `isize::MAX`,
/// the largest size a single allocation may have.
pub const fn byte_size(count: usize, element_size: usize) -> Option<usize> {
    match count.checked_mul(element_size) {
        Some(bytes) if bytes <= isize::MAX as usize => Some(bytes),
        _ => None,
    }
}
