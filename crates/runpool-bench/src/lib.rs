//! Benchmark profiles and utilities for runpool.
//!
//! The workload is nested vectors: an outer vector of integer vectors and
//! one of point vectors, filled to random lengths and then resized at
//! random. The same plan runs against a pool or the system heap so the
//! two can be compared and their results cross-checked.
//!
//! - [`reference_profile`]: 10 outer slots, lengths up to 10, 10 resizes
//! - [`stress_profile`]: 256 outer slots, lengths up to 64, 4096 resizes
//! - [`NestedProfile::plan`]: deterministic operation sequence via seed

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use runpool_arena::{PoolAllocator, SharedPool};
use runpool_core::{ElementAllocator, PoolConfig, PoolError};
use runpool_test_utils::{PoolVec, SystemAllocator};

/// Element type of the point vectors.
pub type Point = (i32, i32);

/// Shape of a nested-vector workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedProfile {
    /// Number of inner vectors in each outer vector.
    pub outer: usize,
    /// Largest length any inner vector is resized to.
    pub max_len: usize,
    /// Number of random resizes after the initial fill.
    pub resizes: usize,
    /// RNG seed for the plan.
    pub seed: u64,
}

/// A concrete operation sequence drawn from a [`NestedProfile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    /// Initial length of each integer vector.
    pub int_lengths: Vec<usize>,
    /// Initial length of each point vector.
    pub point_lengths: Vec<usize>,
    /// `(slot, new_len)` pairs applied to both outer vectors in order.
    pub resizes: Vec<(usize, usize)>,
    /// Slot whose middle element is overwritten at the end.
    pub probe: usize,
}

/// Small profile mirroring a quick demo run.
pub fn reference_profile(seed: u64) -> NestedProfile {
    NestedProfile {
        outer: 10,
        max_len: 10,
        resizes: 10,
        seed,
    }
}

/// Larger profile with heavy resize churn.
pub fn stress_profile(seed: u64) -> NestedProfile {
    NestedProfile {
        outer: 256,
        max_len: 64,
        resizes: 4096,
        seed,
    }
}

impl NestedProfile {
    /// Draw the operation sequence. Identical seeds give identical plans.
    pub fn plan(&self) -> Plan {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let len = |rng: &mut ChaCha8Rng| rng.random_range(1..=self.max_len);
        let int_lengths = (0..self.outer).map(|_| len(&mut rng)).collect();
        let point_lengths = (0..self.outer).map(|_| len(&mut rng)).collect();
        let resizes = (0..self.resizes)
            .map(|_| (rng.random_range(0..self.outer), len(&mut rng)))
            .collect();
        let probe = rng.random_range(0..self.outer);
        Plan {
            int_lengths,
            point_lengths,
            resizes,
            probe,
        }
    }

    /// A pool configuration with room for the whole workload.
    ///
    /// Sized at four times the peak live blocks so fragmentation from
    /// exact-size regrowth never exhausts the pool.
    pub fn pool_config(&self) -> PoolConfig {
        // Point vectors take one block per element, integer vectors half
        // that, and each inner vector header is four blocks.
        let per_slot = self.max_len + self.max_len.div_ceil(2) + 8;
        PoolConfig::new()
            .with_page_capacity(self.outer * per_slot * 4)
            .with_max_pages(4)
    }
}

/// Run `plan` with the given allocators and return a checksum of the
/// final contents.
///
/// Every vector is dropped before returning, so all storage is released.
pub fn run_nested<I, IO, P, PO>(
    plan: &Plan,
    ints: I,
    int_outer: IO,
    points: P,
    point_outer: PO,
) -> Result<u64, PoolError>
where
    I: ElementAllocator<Value = u32> + Clone,
    IO: ElementAllocator<Value = PoolVec<u32, I>>,
    P: ElementAllocator<Value = Point> + Clone,
    PO: ElementAllocator<Value = PoolVec<Point, P>>,
{
    let mut vec_ints = PoolVec::with_capacity_in(plan.int_lengths.len(), int_outer)?;
    for &len in &plan.int_lengths {
        let mut v = PoolVec::new_in(ints.clone());
        v.resize(len, 0)?;
        vec_ints.push(v)?;
    }

    let mut vec_pts = PoolVec::with_capacity_in(plan.point_lengths.len(), point_outer)?;
    for &len in &plan.point_lengths {
        let mut v = PoolVec::new_in(points.clone());
        v.resize(len, (0, 0))?;
        vec_pts.push(v)?;
    }

    for &(slot, len) in &plan.resizes {
        vec_ints[slot].resize(len, slot as u32)?;
        vec_pts[slot].resize(len, (slot as i32, len as i32))?;
    }

    let probe = &mut vec_ints[plan.probe];
    let mid = probe.len() / 2;
    probe[mid] = 10;
    let probe = &mut vec_pts[plan.probe];
    let mid = probe.len() / 2;
    probe[mid] = (11, 15);

    let mut sum = 0u64;
    for v in vec_ints.iter() {
        sum = v.iter().fold(sum, |acc, &x| acc.wrapping_mul(31).wrapping_add(u64::from(x)));
    }
    for v in vec_pts.iter() {
        sum = v.iter().fold(sum, |acc, &(x, y)| {
            acc.wrapping_mul(31)
                .wrapping_add(x as u64)
                .wrapping_mul(31)
                .wrapping_add(y as u64)
        });
    }
    Ok(sum)
}

/// Run `plan` with every allocator drawn from `pool`.
pub fn run_on_pool(plan: &Plan, pool: &SharedPool) -> Result<u64, PoolError> {
    type Ints = PoolAllocator<u32>;
    type Points = PoolAllocator<Point>;

    let ints = Ints::new(pool.clone());
    let points = ints.rebind::<Point>();
    let int_outer = ints.rebind::<PoolVec<u32, Ints>>();
    let point_outer = ints.rebind::<PoolVec<Point, Points>>();
    run_nested(plan, ints, int_outer, points, point_outer)
}

/// Run `plan` on the system heap.
pub fn run_on_system(plan: &Plan) -> Result<u64, PoolError> {
    run_nested(
        plan,
        SystemAllocator::new(),
        SystemAllocator::new(),
        SystemAllocator::new(),
        SystemAllocator::new(),
    )
}
