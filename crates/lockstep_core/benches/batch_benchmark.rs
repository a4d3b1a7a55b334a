//! # Batch Kernel Benchmark
//!
//! Compares the 8-lane kernels against the scalar reference on the same
//! data. Sizes include ragged lengths so the scalar tail shows up.
//!
//! Run with: `cargo bench --package lockstep_core --bench batch_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lockstep_core::batch::{self, scalar};
use rand::{rngs::StdRng, Rng, SeedableRng};

const SIZES: [usize; 4] = [1_000, 10_000, 100_003, 1_000_000];

fn random_column(rng: &mut StdRng, n: usize, range: f32) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(-range..range)).collect()
}

/// Euler integration, batched vs scalar.
fn bench_integrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrate");
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for n in SIZES {
        let mut pos = random_column(&mut rng, n, 1000.0);
        let vel = random_column(&mut rng, n, 10.0);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("batched", n), &n, |b, _| {
            b.iter(|| {
                batch::integrate(&mut pos, &vel, black_box(1.0 / 60.0));
                black_box(pos[0])
            });
        });

        group.bench_with_input(BenchmarkId::new("scalar", n), &n, |b, _| {
            b.iter(|| {
                scalar::integrate(&mut pos, &vel, black_box(1.0 / 60.0));
                black_box(pos[0])
            });
        });
    }

    group.finish();
}

/// Element-wise add and scale.
fn bench_elementwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("elementwise");
    let mut rng = StdRng::seed_from_u64(7);

    for n in SIZES {
        let a = random_column(&mut rng, n, 100.0);
        let b_col = random_column(&mut rng, n, 100.0);
        let mut out = vec![0.0; n];
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("add", n), &n, |b, _| {
            b.iter(|| {
                batch::add(&a, &b_col, &mut out);
                black_box(out[n - 1])
            });
        });

        group.bench_with_input(BenchmarkId::new("mul_scalar", n), &n, |b, _| {
            b.iter(|| {
                batch::mul_scalar(&a, black_box(0.5), &mut out);
                black_box(out[n - 1])
            });
        });
    }

    group.finish();
}

/// Point-in-circle counting, batched vs scalar.
fn bench_count_within_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_within_radius");
    let mut rng = StdRng::seed_from_u64(42);

    for n in SIZES {
        let px = random_column(&mut rng, n, 500.0);
        let py = random_column(&mut rng, n, 500.0);
        let cx = random_column(&mut rng, n, 500.0);
        let cy = random_column(&mut rng, n, 500.0);
        let r_sq = vec![100.0 * 100.0; n];
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("batched", n), &n, |b, _| {
            b.iter(|| black_box(batch::count_within_radius(&px, &py, &cx, &cy, &r_sq)));
        });

        group.bench_with_input(BenchmarkId::new("scalar", n), &n, |b, _| {
            b.iter(|| black_box(scalar::count_within_radius(&px, &py, &cx, &cy, &r_sq)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_integrate,
    bench_elementwise,
    bench_count_within_radius,
);

criterion_main!(benches);
