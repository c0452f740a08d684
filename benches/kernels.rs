//! Kernel Benchmark Comparison
//!
//! Times every kernel variant on the `testing` and `small` presets, plus the
//! blocked kernel across tile sizes.
//!
//! # Usage:
//! ```bash
//! # Run all kernel benchmarks
//! cargo bench --bench kernels
//!
//! # Run one group
//! cargo bench --bench kernels -- kernels_small
//! cargo bench --bench kernels -- blocked_tiles
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::prelude::*;

use matbench::{DatasetSize, GuardedMatrix, Invocation, KernelKind, Matrix};

fn random_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Matrix {
    Matrix::from_fn(rows, cols, |_, _| rng.random_range(-1.0..1.0))
}

/// One graph per preset, one line per kernel
fn bench_kernels_by_size(c: &mut Criterion) {
    for size in [DatasetSize::Testing, DatasetSize::Small] {
        let dims = size.dims();
        let mut group = c.benchmark_group(format!("kernels_{size}"));
        group.sample_size(20);

        let mut rng = StdRng::seed_from_u64(42);
        let a = random_matrix(dims.n, dims.m, &mut rng);
        let b = random_matrix(dims.m, dims.p, &mut rng);

        for kind in KernelKind::ALL {
            let kernel = match kind.build(4, 0, false) {
                Ok(kernel) => kernel,
                Err(e) => panic!("cannot build {}: {e}", kind.kernel_name()),
            };
            let mut out = GuardedMatrix::new(dims.n, dims.p);
            let mut inv = Invocation::new(&a, &b, &mut out).unwrap();

            group.bench_function(kernel.name(), |bencher| {
                bencher.iter(|| {
                    kernel.multiply(black_box(&mut inv));
                })
            });
        }

        group.finish();
    }
}

fn bench_blocked_tiles(c: &mut Criterion) {
    let dims = DatasetSize::Small.dims();
    let mut group = c.benchmark_group("blocked_tiles");
    group.sample_size(20);

    let mut rng = StdRng::seed_from_u64(7);
    let a = random_matrix(dims.n, dims.m, &mut rng);
    let b = random_matrix(dims.m, dims.p, &mut rng);
    let kernel = KernelKind::Opt.build(1, 0, false).unwrap();

    for block in [8, 16, 32, 64, 128] {
        let mut out = GuardedMatrix::new(dims.n, dims.p);
        let mut inv = Invocation::new(&a, &b, &mut out)
            .unwrap()
            .with_block_size(block);

        group.bench_function(format!("tile_{block}"), |bencher| {
            bencher.iter(|| kernel.multiply(black_box(&mut inv)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kernels_by_size, bench_blocked_tiles);
criterion_main!(benches);
