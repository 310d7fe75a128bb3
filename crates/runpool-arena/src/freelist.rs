//! Free-list engine: run placement and boundary coalescing on a [`Page`].
//!
//! The free chain lives inside the page itself. Free space starts at
//! `begin`; wherever a free run is followed by live blocks, the run's last
//! block is tagged and links to the next free index. Everything at or past
//! `end` is one open-ended free run.
//!
//! ```text
//!  begin=0                       end=9
//!  │                              │
//!  [f f S][u u][f S][u u u][. . . . . .]
//!       └─────────┘ └───────────┘
//!   S = sentinel, u = live, f = free, . = never handed out
//! ```
//!
//! [`claim`] walks the chain from `begin`, jumping over runs that are too
//! short. [`release`] splices a run back into the chain, merging with the
//! free run on either side when they touch.

use crate::page::Page;

/// Result of a successful [`claim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claim {
    /// First block of the claimed run.
    pub index: usize,
    /// Sentinels followed while searching.
    pub jumps: u32,
    /// Whether a sentinel at the end of the run was absorbed.
    pub absorbed: bool,
}

/// Claim `block_amount` consecutive blocks from `page`.
///
/// Returns `None` without touching the page if no run fits before the
/// page's bound. `block_amount` must be non-zero.
pub fn claim(page: &mut Page, block_amount: usize) -> Option<Claim> {
    assert!(block_amount > 0, "cannot claim an empty run");
    let capacity = page.capacity();

    let mut candidate = page.begin;
    let mut followed = None;
    let mut jumps = 0u32;
    loop {
        let run_end = candidate.checked_add(block_amount)?;
        if run_end > capacity {
            return None;
        }
        // The last block may be a sentinel: that only means the free run
        // ends exactly where the claim does.
        match (candidate..run_end - 1).find(|&i| page.is_sentinel(i)) {
            None => break,
            Some(sentinel) => {
                followed = Some(sentinel);
                candidate = page.link(sentinel);
                jumps += 1;
            }
        }
    }

    let last = candidate + block_amount - 1;
    let mut end_of_run = candidate + block_amount;
    let absorbed = page.is_sentinel(last);
    if absorbed {
        end_of_run = page.link(last);
        page.clear_sentinel(last);
    }

    page.end = page.end.max(end_of_run);
    match followed {
        None => page.begin = end_of_run,
        Some(sentinel) => page.set_link(sentinel, end_of_run),
    }
    page.live_blocks += block_amount;

    Some(Claim {
        index: candidate,
        jumps,
        absorbed,
    })
}

/// Return the run `[index, index + block_amount)` to `page`.
///
/// The run must have been produced by [`claim`] with the same
/// `block_amount` and not released since; otherwise the chain is corrupted.
pub fn release(page: &mut Page, index: usize, block_amount: usize) {
    assert!(block_amount > 0, "cannot release an empty run");
    let run_end = index + block_amount;
    assert!(run_end <= page.capacity(), "run {index}..{run_end} out of range");
    // A live run's first block is never tagged, so the backward scan can
    // start just before it.
    debug_assert!(!page.is_sentinel(index), "block {index} is a sentinel, not live");

    // Nearest free-chain boundary before the run.
    let preceding = sentinel_before(page, index);
    let next_free = match preceding {
        None => page.begin,
        Some(sentinel) => page.link(sentinel),
    };

    // Freeing the tail retracts the high-water mark, past the previous free
    // run too when the two touch.
    if page.end == run_end {
        page.end = match preceding {
            Some(sentinel) if sentinel + 1 == index => free_run_start(page, sentinel),
            _ => index,
        };
    }

    match preceding {
        None => page.begin = index,
        // The previous free run touches this one: they merge, no link needed.
        Some(sentinel) if sentinel + 1 == index => page.clear_sentinel(sentinel),
        Some(sentinel) => page.set_link(sentinel, index),
    }

    if next_free > run_end {
        page.set_sentinel(run_end - 1, next_free);
    }

    page.live_blocks -= block_amount;
    page.exhausted = false;
}

/// Index of the last sentinel strictly before `index`.
fn sentinel_before(page: &Page, index: usize) -> Option<usize> {
    (0..index).rev().find(|&i| page.is_sentinel(i))
}

/// First block of the free run that ends at `sentinel`.
fn free_run_start(page: &Page, sentinel: usize) -> usize {
    match sentinel_before(page, sentinel) {
        None => page.begin,
        Some(previous) => page.link(previous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageState;

    fn state(begin: usize, end: usize, live: usize, sentinels: &[(usize, usize)]) -> PageState {
        PageState {
            begin,
            end,
            live_blocks: live,
            sentinels: sentinels.to_vec(),
        }
    }

    #[test]
    fn sequential_claims_bump() {
        let mut page = Page::new(8).unwrap();
        let a = claim(&mut page, 3).unwrap();
        assert_eq!(a.index, 0);
        assert_eq!(page.state(), state(3, 3, 3, &[]));

        let b = claim(&mut page, 2).unwrap();
        assert_eq!(b.index, 3);
        assert_eq!(b.jumps, 0);
        assert_eq!(page.state(), state(5, 5, 5, &[]));
    }

    #[test]
    fn eight_block_walkthrough() {
        let mut page = Page::new(8).unwrap();
        assert_eq!(claim(&mut page, 3).unwrap().index, 0);
        assert_eq!(claim(&mut page, 2).unwrap().index, 3);

        // Front run freed: nothing before it, and block 3 is live, so block 2
        // becomes a sentinel bridging to the old head of free space.
        release(&mut page, 0, 3);
        assert_eq!(page.state(), state(0, 5, 2, &[(2, 5)]));

        // An exact fit reuses the freed run, absorbing its sentinel.
        let c = claim(&mut page, 3).unwrap();
        assert_eq!(c.index, 0);
        assert_eq!(c.jumps, 0);
        assert!(c.absorbed);
        assert_eq!(page.state(), state(5, 5, 5, &[]));

        // The remaining three blocks still fit.
        assert_eq!(claim(&mut page, 3).unwrap().index, 5);
        assert_eq!(page.state(), state(8, 8, 8, &[]));
        assert!(claim(&mut page, 1).is_none());
    }

    #[test]
    fn short_run_is_jumped_over() {
        let mut page = Page::new(10).unwrap();
        claim(&mut page, 3).unwrap();
        claim(&mut page, 2).unwrap();
        release(&mut page, 0, 3);

        // Four blocks don't fit in [0, 3): the scan meets the sentinel at 2
        // and resumes at 5.
        let c = claim(&mut page, 4).unwrap();
        assert_eq!(c.index, 5);
        assert_eq!(c.jumps, 1);
        assert!(!c.absorbed);
        // begin stays at the front; the sentinel now skips the new run.
        assert_eq!(page.state(), state(0, 9, 6, &[(2, 9)]));

        // A two-block request is served from the front without a jump.
        let d = claim(&mut page, 2).unwrap();
        assert_eq!(d.index, 0);
        assert_eq!(page.state(), state(2, 9, 8, &[(2, 9)]));

        // A one-block request takes the sentinel block itself and absorbs it.
        let e = claim(&mut page, 1).unwrap();
        assert_eq!(e.index, 2);
        assert!(e.absorbed);
        assert_eq!(page.state(), state(9, 9, 9, &[]));
    }

    #[test]
    fn run_past_capacity_fails_without_side_effects() {
        let mut page = Page::new(10).unwrap();
        claim(&mut page, 3).unwrap();
        claim(&mut page, 2).unwrap();
        release(&mut page, 0, 3);
        let before = page.state();

        assert!(claim(&mut page, 6).is_none());
        assert_eq!(page.state(), before);
        assert!(claim(&mut page, 11).is_none());
        assert_eq!(page.state(), before);
    }

    #[test]
    fn claim_exactly_filling_page() {
        let mut page = Page::new(4).unwrap();
        assert_eq!(claim(&mut page, 4).unwrap().index, 0);
        assert_eq!(page.state(), state(4, 4, 4, &[]));
        assert!(claim(&mut page, 1).is_none());
        release(&mut page, 0, 4);
        assert_eq!(page.state(), state(0, 0, 0, &[]));
    }

    #[test]
    fn freeing_tail_retracts_end() {
        let mut page = Page::new(8).unwrap();
        claim(&mut page, 3).unwrap();
        claim(&mut page, 2).unwrap();
        release(&mut page, 3, 2);
        assert_eq!(page.state(), state(3, 3, 3, &[]));
    }

    #[test]
    fn freeing_tail_next_to_free_run_retracts_past_it() {
        let mut page = Page::new(8).unwrap();
        claim(&mut page, 2).unwrap(); // [0, 2)
        claim(&mut page, 2).unwrap(); // [2, 4)
        claim(&mut page, 2).unwrap(); // [4, 6)

        release(&mut page, 2, 2);
        assert_eq!(page.state(), state(2, 6, 4, &[(3, 6)]));
        release(&mut page, 4, 2);
        assert_eq!(page.state(), state(2, 2, 2, &[]));

        // Round trip from here leaves the cursors where they were.
        let c = claim(&mut page, 3).unwrap();
        assert_eq!(c.index, 2);
        assert_eq!(page.state(), state(5, 5, 5, &[]));
        release(&mut page, 2, 3);
        assert_eq!(page.state(), state(2, 2, 2, &[]));
    }

    #[test]
    fn adjacent_frees_coalesce_front_first() {
        let mut page = Page::new(16).unwrap();
        claim(&mut page, 2).unwrap(); // [0, 2)
        claim(&mut page, 3).unwrap(); // [2, 5)
        claim(&mut page, 2).unwrap(); // [5, 7)

        release(&mut page, 0, 2);
        assert_eq!(page.state(), state(0, 7, 5, &[(1, 7)]));
        release(&mut page, 2, 3);
        // Sentinel at 1 merged away; the combined run ends at 4 and links on.
        assert_eq!(page.state(), state(0, 7, 2, &[(4, 7)]));

        let c = claim(&mut page, 5).unwrap();
        assert_eq!(c.index, 0);
        assert_eq!(c.jumps, 0);
        assert_eq!(page.state(), state(7, 7, 7, &[]));
    }

    #[test]
    fn adjacent_frees_coalesce_back_first() {
        let mut page = Page::new(16).unwrap();
        claim(&mut page, 2).unwrap(); // [0, 2)
        claim(&mut page, 3).unwrap(); // [2, 5)
        claim(&mut page, 2).unwrap(); // [5, 7)

        release(&mut page, 2, 3);
        assert_eq!(page.state(), state(2, 7, 4, &[(4, 7)]));
        release(&mut page, 0, 2);
        // Block 2 is already free, so no sentinel at 1.
        assert_eq!(page.state(), state(0, 7, 2, &[(4, 7)]));

        let c = claim(&mut page, 5).unwrap();
        assert_eq!(c.index, 0);
        assert_eq!(c.jumps, 0);
    }

    #[test]
    fn middle_free_links_from_previous_sentinel() {
        let mut page = Page::new(16).unwrap();
        for _ in 0..5 {
            claim(&mut page, 2).unwrap(); // [0,2) [2,4) [4,6) [6,8) [8,10)
        }
        release(&mut page, 0, 2);
        assert_eq!(page.state(), state(0, 10, 8, &[(1, 10)]));

        release(&mut page, 4, 2);
        // Chain: 0..2 -> 4..6 -> 10..
        assert_eq!(page.state(), state(0, 10, 6, &[(1, 4), (5, 10)]));

        // A two-block request takes the front run and patches begin.
        let c = claim(&mut page, 2).unwrap();
        assert_eq!(c.index, 0);
        assert_eq!(page.state(), state(4, 10, 8, &[(5, 10)]));
    }

    #[test]
    fn jump_chain_over_multiple_holes() {
        let mut page = Page::new(32).unwrap();
        for _ in 0..6 {
            claim(&mut page, 2).unwrap();
        }
        release(&mut page, 0, 2);
        release(&mut page, 4, 2);
        release(&mut page, 8, 2);

        let c = claim(&mut page, 3).unwrap();
        assert_eq!(c.index, 12);
        assert_eq!(c.jumps, 3);
        // The last sentinel followed now skips the new run.
        assert_eq!(page.state(), state(0, 15, 9, &[(1, 4), (5, 8), (9, 15)]));
    }

    #[test]
    fn allocate_then_release_restores_state() {
        let mut page = Page::new(10).unwrap();
        claim(&mut page, 3).unwrap();
        claim(&mut page, 2).unwrap();
        release(&mut page, 0, 3);
        let before = page.state();

        // Jumping claim.
        let c = claim(&mut page, 4).unwrap();
        release(&mut page, c.index, 4);
        assert_eq!(page.state(), before);

        // Absorbing claim.
        let c = claim(&mut page, 3).unwrap();
        release(&mut page, c.index, 3);
        assert_eq!(page.state(), before);

        // Plain front claim.
        let c = claim(&mut page, 1).unwrap();
        release(&mut page, c.index, 1);
        assert_eq!(page.state(), before);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is a sentinel")]
    fn releasing_a_free_run_head_panics() {
        let mut page = Page::new(8).unwrap();
        claim(&mut page, 3).unwrap();
        claim(&mut page, 2).unwrap();
        release(&mut page, 0, 3);
        // Block 2 is now the freed run's sentinel.
        release(&mut page, 2, 1);
    }

    #[test]
    fn release_clears_exhausted_hint() {
        let mut page = Page::new(2).unwrap();
        claim(&mut page, 2).unwrap();
        page.exhausted = true;
        release(&mut page, 0, 2);
        assert!(!page.is_exhausted());
    }

    #[test]
    #[should_panic(expected = "empty run")]
    fn empty_claim_panics() {
        let mut page = Page::new(2).unwrap();
        let _ = claim(&mut page, 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const CAPACITY: usize = 64;

        #[derive(Clone, Debug)]
        enum Op {
            Claim(usize),
            Release(usize),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1usize..8).prop_map(Op::Claim),
                any::<usize>().prop_map(Op::Release),
            ]
        }

        /// Apply `ops`, tracking live runs as `(index, len)`.
        fn run(page: &mut Page, ops: &[Op]) -> Vec<(usize, usize)> {
            let mut live: Vec<(usize, usize)> = Vec::new();
            for op in ops {
                match *op {
                    Op::Claim(len) => {
                        if let Some(c) = claim(page, len) {
                            live.push((c.index, len));
                        }
                    }
                    Op::Release(pick) => {
                        if !live.is_empty() {
                            let (index, len) = live.swap_remove(pick % live.len());
                            release(page, index, len);
                        }
                    }
                }
            }
            live
        }

        fn overlaps(a: (usize, usize), b: (usize, usize)) -> bool {
            a.0 < b.0 + b.1 && b.0 < a.0 + a.1
        }

        proptest! {
            #[test]
            fn claims_without_release_are_disjoint(
                lens in proptest::collection::vec(1usize..10, 1..40),
            ) {
                let mut page = Page::new(CAPACITY).unwrap();
                let mut runs = Vec::new();
                for len in lens {
                    if let Some(c) = claim(&mut page, len) {
                        prop_assert!(c.index + len <= CAPACITY);
                        runs.push((c.index, len));
                    }
                }
                for (i, &a) in runs.iter().enumerate() {
                    for &b in &runs[i + 1..] {
                        prop_assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
                    }
                }
            }

            #[test]
            fn live_runs_stay_disjoint_under_churn(
                ops in proptest::collection::vec(arb_op(), 1..80),
            ) {
                let mut page = Page::new(CAPACITY).unwrap();
                let live = run(&mut page, &ops);
                for (i, &a) in live.iter().enumerate() {
                    for &b in &live[i + 1..] {
                        prop_assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
                    }
                }
                let total: usize = live.iter().map(|r| r.1).sum();
                prop_assert_eq!(page.live_blocks(), total);
            }

            #[test]
            fn claim_release_pair_restores_state(
                ops in proptest::collection::vec(arb_op(), 0..60),
                len in 1usize..8,
            ) {
                let mut page = Page::new(CAPACITY).unwrap();
                run(&mut page, &ops);
                let before = page.state();
                if let Some(c) = claim(&mut page, len) {
                    release(&mut page, c.index, len);
                    prop_assert_eq!(page.state(), before);
                } else {
                    prop_assert_eq!(page.state(), before);
                }
            }

            #[test]
            fn end_only_drops_when_tail_is_freed(
                ops in proptest::collection::vec(arb_op(), 1..80),
            ) {
                let mut page = Page::new(CAPACITY).unwrap();
                let mut live: Vec<(usize, usize)> = Vec::new();
                for op in ops {
                    let end_before = page.end();
                    match op {
                        Op::Claim(len) => {
                            if let Some(c) = claim(&mut page, len) {
                                live.push((c.index, len));
                            }
                            prop_assert!(page.end() >= end_before);
                        }
                        Op::Release(pick) => {
                            if live.is_empty() {
                                continue;
                            }
                            let (index, len) = live.swap_remove(pick % live.len());
                            release(&mut page, index, len);
                            if index + len == end_before {
                                prop_assert!(page.end() <= index);
                            } else {
                                prop_assert_eq!(page.end(), end_before);
                            }
                        }
                    }
                    prop_assert!(page.end() <= CAPACITY);
                }
            }

            #[test]
            fn end_is_one_past_highest_live_block(
                ops in proptest::collection::vec(arb_op(), 1..80),
            ) {
                let mut page = Page::new(CAPACITY).unwrap();
                let live = run(&mut page, &ops);
                let highest = live.iter().map(|&(index, len)| index + len).max().unwrap_or(0);
                prop_assert_eq!(page.end(), highest);
                for (index, _) in page.state().sentinels {
                    prop_assert!(index < page.end());
                }
            }

            #[test]
            fn neighbouring_runs_merge_in_either_order(
                first in 1usize..6,
                second in 1usize..6,
                front_first in any::<bool>(),
            ) {
                let mut page = Page::new(CAPACITY).unwrap();
                let a = claim(&mut page, first).unwrap();
                let b = claim(&mut page, second).unwrap();
                claim(&mut page, 1).unwrap(); // keeps the pair off the tail
                if front_first {
                    release(&mut page, a.index, first);
                    release(&mut page, b.index, second);
                } else {
                    release(&mut page, b.index, second);
                    release(&mut page, a.index, first);
                }
                let merged = claim(&mut page, first + second).unwrap();
                prop_assert_eq!(merged.index, a.index);
                prop_assert_eq!(merged.jumps, 0);
            }
        }
    }
}
