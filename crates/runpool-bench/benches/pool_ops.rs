//! Criterion micro-benchmarks for claim and release on a single page.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use runpool_arena::{PagePool, PoolAllocator};
use runpool_core::{ElementAllocator, PoolConfig};
use runpool_test_utils::SystemAllocator;

fn pool_u64(blocks: usize) -> PoolAllocator<u64> {
    PoolAllocator::with_config(PoolConfig::new().with_page_capacity(blocks)).unwrap()
}

/// Benchmark: allocate then immediately release four blocks, pool vs heap.
fn bench_alloc_release_pair(c: &mut Criterion) {
    let pool = pool_u64(1024);
    c.bench_function("pool_alloc_release_4", |b| {
        b.iter(|| {
            let ptr = pool.allocate(black_box(4)).unwrap();
            unsafe { pool.deallocate(ptr, 4).unwrap() };
        });
    });

    let heap = SystemAllocator::<u64>::new();
    c.bench_function("system_alloc_release_4", |b| {
        b.iter(|| {
            let ptr = heap.allocate(black_box(4)).unwrap();
            unsafe { heap.deallocate(ptr, 4).unwrap() };
        });
    });
}

/// Benchmark: fill 1000 one-block runs, then release them all.
fn bench_fill_and_drain_1k(c: &mut Criterion) {
    let pool = pool_u64(1024);
    let mut ptrs = Vec::with_capacity(1000);
    c.bench_function("pool_fill_drain_1k", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                ptrs.push(pool.allocate(1).unwrap());
            }
            for ptr in ptrs.drain(..) {
                unsafe { pool.deallocate(ptr, 1).unwrap() };
            }
        });
    });
}

/// Benchmark: a request that must jump over many short holes.
///
/// The page is prepared with alternating one-block holes and live blocks,
/// so a two-block request follows every sentinel before it fits.
fn bench_jump_chain(c: &mut Criterion) {
    let shared = PagePool::new(PoolConfig::new().with_page_capacity(4096))
        .unwrap()
        .into_shared();
    let pool = PoolAllocator::<u64>::new(shared);
    let ptrs: Vec<_> = (0..2000).map(|_| pool.allocate(1).unwrap()).collect();
    for ptr in ptrs.iter().step_by(2) {
        unsafe { pool.deallocate(*ptr, 1).unwrap() };
    }

    c.bench_function("pool_jump_1k_holes", |b| {
        b.iter(|| {
            let ptr = pool.allocate(black_box(2)).unwrap();
            unsafe { pool.deallocate(ptr, 2).unwrap() };
        });
    });
}

criterion_group!(
    benches,
    bench_alloc_release_pair,
    bench_fill_and_drain_1k,
    bench_jump_chain
);
criterion_main!(benches);
