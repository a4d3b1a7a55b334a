//! # Entity Store & Broad-Phase Benchmark
//!
//! Measures the per-tick work the scheduler does on the core:
//! integrate, rebuild the grid, and walk neighborhoods.
//!
//! Run with: `cargo bench --package lockstep_core --bench store_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lockstep_core::{EntityFlags, EntityStore, SnapshotRecord, SpatialIndex};
use rand::{rngs::StdRng, Rng, SeedableRng};

const WORLD: f32 = 1000.0;

fn populated_store(count: usize) -> EntityStore {
    let mut rng = StdRng::seed_from_u64(count as u64);
    let mut store = EntityStore::new(count);
    for _ in 0..count {
        let _ = store.spawn(
            rng.gen_range(0.0..WORLD),
            rng.gen_range(0.0..WORLD),
            rng.gen_range(-50.0..50.0),
            rng.gen_range(-50.0..50.0),
            EntityFlags::ENEMY,
        );
    }
    store
}

/// Spawn/despawn churn on a half-full store.
fn bench_spawn_despawn_cycle(c: &mut Criterion) {
    let mut store = EntityStore::new(10_000);
    for _ in 0..5_000 {
        let _ = store.spawn(0.0, 0.0, 0.0, 0.0, EntityFlags::BULLET);
    }

    c.bench_function("spawn_despawn_cycle_1K", |b| {
        let mut handles = Vec::with_capacity(1_000);
        b.iter(|| {
            for _ in 0..1_000 {
                if let Ok(h) = store.spawn(1.0, 1.0, 1.0, 1.0, EntityFlags::BULLET) {
                    handles.push(h);
                }
            }
            for h in handles.drain(..) {
                let _ = store.despawn(h);
            }
            black_box(store.live_count())
        });
    });
}

/// Integration over a dense store and over one with scattered holes.
fn bench_integrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_integrate");

    for count in [1_000, 10_000, 60_000] {
        let mut dense = populated_store(count);
        group.bench_with_input(BenchmarkId::new("dense", count), &count, |b, _| {
            b.iter(|| {
                dense.integrate(black_box(1.0 / 60.0));
                black_box(dense.live_count())
            });
        });

        let mut holey = populated_store(count);
        let victims: Vec<_> = holey.active_slots().step_by(3).collect();
        for slot in victims {
            let _ = holey.despawn(holey.handle_at(slot));
        }
        group.bench_with_input(BenchmarkId::new("holey", count), &count, |b, _| {
            b.iter(|| {
                holey.integrate(black_box(1.0 / 60.0));
                black_box(holey.live_count())
            });
        });
    }

    group.finish();
}

/// Grid rebuild plus one neighborhood walk per entity.
fn bench_broad_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("broad_phase");

    for count in [1_000, 10_000] {
        let store = populated_store(count);
        let mut index = SpatialIndex::new(WORLD, WORLD, store.capacity());

        group.bench_with_input(BenchmarkId::new("rebuild", count), &count, |b, _| {
            b.iter(|| {
                index.rebuild(&store);
                black_box(index.grid_width())
            });
        });

        index.rebuild(&store);
        group.bench_with_input(BenchmarkId::new("neighborhoods", count), &count, |b, _| {
            b.iter(|| {
                let mut candidates = 0usize;
                for slot in store.active_slots() {
                    let (x, y) = store.position(slot);
                    index.query_neighborhood(x, y, |other| {
                        candidates += usize::from(other > slot);
                    });
                }
                black_box(candidates)
            });
        });
    }

    group.finish();
}

/// Snapshot extraction into a reused buffer.
fn bench_fill_snapshot(c: &mut Criterion) {
    let store = populated_store(10_000);
    let mut records: Vec<SnapshotRecord> = Vec::with_capacity(store.capacity());

    c.bench_function("fill_snapshot_10K", |b| {
        b.iter(|| {
            store.fill_snapshot(&mut records);
            black_box(records.len())
        });
    });
}

criterion_group!(
    benches,
    bench_spawn_despawn_cycle,
    bench_integrate,
    bench_broad_phase,
    bench_fill_snapshot,
);

criterion_main!(benches);
