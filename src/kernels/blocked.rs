use std::cmp::min;

use crate::kernel::{Invocation, Kernel};
use crate::matrix::at;

/// Performs `C = A * B` with cubic cache tiles of edge `block`.
///
/// Matrices are row-major: `a` is n x m, `b` is m x p, `c` is n x p.
///
/// The algorithm:
/// 1. Zero every element of `c`.
/// 2. Step `ii`, `jj`, `kk` by `block` across `0..n`, `0..p`, `0..m`.
/// 3. Inside each tile, for every `(i, j)` load `c[i][j]` into an `f64`
///    accumulator, add `a[i][k] * b[k][j]` for the tile's `k` range, and store
///    the sum back truncated to `f32`.
///
/// Tiles on the right and bottom edges are clamped with `min`, so dimensions
/// that are not multiples of `block` are still summed exactly once. The
/// reduction order differs from the plain triple loop, so results agree with
/// it within tolerance, not bit for bit.
///
/// # Panics
///
/// Panics if `block` is zero or a slice is shorter than its dimensions imply.
pub fn blocked_matmul(
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    n: usize,
    m: usize,
    p: usize,
    block: usize,
) {
    assert!(block > 0, "tile size must be positive");

    c[..n * p].fill(0.0);

    for ii in (0..n).step_by(block) {
        let max_i = min(ii + block, n);
        for jj in (0..p).step_by(block) {
            let max_j = min(jj + block, p);
            for kk in (0..m).step_by(block) {
                let max_k = min(kk + block, m);

                for i in ii..max_i {
                    let a_row = &a[at(i, 0, m)..at(i, 0, m) + m];
                    for j in jj..max_j {
                        let mut acc = c[at(i, j, p)] as f64;
                        for k in kk..max_k {
                            acc += a_row[k] as f64 * b[at(k, j, p)] as f64;
                        }
                        c[at(i, j, p)] = acc as f32;
                    }
                }
            }
        }
    }
}

/// The cache-blocked scalar variant. Tile edge comes from
/// [`Invocation::block_size`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockedKernel;

impl Kernel for BlockedKernel {
    fn name(&self) -> &'static str {
        "scalar_opt"
    }

    fn multiply(&self, inv: &mut Invocation<'_>) {
        let d = inv.dims;
        blocked_matmul(
            inv.a.as_slice(),
            inv.b.as_slice(),
            inv.c.as_mut_slice(),
            d.n,
            d.m,
            d.p,
            inv.block_size,
        );
    }
}
