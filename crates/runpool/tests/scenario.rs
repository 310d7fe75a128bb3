//! Integration test: the worked eight-block example, driven through the
//! public allocator API and checked against page bookkeeping.

use runpool::arena::PageState;
use runpool::prelude::*;
use runpool::types::PageId;
use runpool_test_utils::{scenario_pool, tiny_config};

fn page_state(pool: &SharedPool) -> PageState {
    pool.borrow().page(PageId(0)).unwrap().state()
}

#[test]
fn eight_block_page_walkthrough() {
    let pool = scenario_pool();
    let alloc = PoolAllocator::<u64>::new(pool.clone());

    let a = alloc.allocate(3).unwrap();
    assert_eq!((page_state(&pool).begin, page_state(&pool).end), (3, 3));

    let b = alloc.allocate(2).unwrap();
    assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 3 * 8);
    assert_eq!((page_state(&pool).begin, page_state(&pool).end), (5, 5));

    unsafe { alloc.deallocate(a, 3).unwrap() };
    let s = page_state(&pool);
    assert_eq!((s.begin, s.end), (0, 5));
    assert_eq!(s.sentinels, vec![(2, 5)]);

    // An exact fit reuses the freed run and absorbs its sentinel.
    let c = alloc.allocate(3).unwrap();
    assert_eq!(c, a);
    let s = page_state(&pool);
    assert_eq!((s.begin, s.end), (5, 5));
    assert!(s.sentinels.is_empty());
    assert_eq!(alloc.metrics().sentinels_absorbed, 1);
}

#[test]
fn short_hole_is_jumped_and_sentinel_patched() {
    let pool = PagePool::new(tiny_config().with_page_capacity(10))
        .unwrap()
        .into_shared();
    let alloc = PoolAllocator::<u64>::new(pool.clone());

    let a = alloc.allocate(3).unwrap();
    alloc.allocate(2).unwrap();
    unsafe { alloc.deallocate(a, 3).unwrap() };

    // Four blocks do not fit the three-block hole at 0.
    let d = alloc.allocate(4).unwrap();
    assert_eq!(d.as_ptr() as usize - a.as_ptr() as usize, 5 * 8);
    let s = page_state(&pool);
    assert_eq!((s.begin, s.end), (0, 9));
    assert_eq!(s.sentinels, vec![(2, 9)]);
    assert_eq!(alloc.metrics().jumps, 1);

    // The hole still serves an exact fit afterwards.
    assert_eq!(alloc.allocate(3).unwrap(), a);
    assert_eq!(alloc.allocate(1).unwrap().as_ptr() as usize, a.as_ptr() as usize + 9 * 8);
    assert!(matches!(
        alloc.allocate(1),
        Err(PoolError::Exhausted { .. })
    ));
}

#[test]
fn freeing_everything_restores_an_empty_page() {
    let pool = scenario_pool();
    let alloc = PoolAllocator::<u64>::new(pool.clone());
    let runs: Vec<_> = [2, 1, 3, 2]
        .iter()
        .map(|&n| (alloc.allocate(n).unwrap(), n))
        .collect();

    // Release out of order so runs merge from both sides.
    for &i in &[1, 3, 0, 2] {
        let (ptr, n) = runs[i];
        unsafe { alloc.deallocate(ptr, n).unwrap() };
    }
    let s = page_state(&pool);
    assert_eq!((s.begin, s.end, s.live_blocks), (0, 0, 0));
    assert!(s.sentinels.is_empty());
    assert_eq!(alloc.allocate(8).unwrap(), runs[0].0);
}
