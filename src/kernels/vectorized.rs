//! SIMD variant: row-broadcast multiply-accumulate.
//!
//! For every output row `i`, each `A[i][k]` is broadcast into a vector and
//! fused-multiply-added against row `k` of `B`, [`LANES`] columns at a time,
//! with a scalar tail for the last `p % LANES` columns. Both `B` and `C` are
//! walked contiguously, so no packing is needed for row-major inputs.
//!
//! The instruction set is chosen once per process:
//! - `avx2` cfg (set by the build script) and AVX2+FMA confirmed at runtime: 256-bit AVX2.
//! - `neon` cfg on aarch64: 128-bit NEON, two registers per step.
//! - anything else: fixed-width arrays the compiler can auto-vectorize.

use std::sync::OnceLock;

use crate::kernel::{Invocation, Kernel};
use crate::matrix::at;

/// Columns processed per step.
pub const LANES: usize = 8;

/// Instruction set backing the inner loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdPath {
    /// 256-bit AVX2 with fused multiply-add.
    Avx2Fma,
    /// 128-bit ARM NEON.
    Neon,
    /// Fixed-width scalar lanes.
    Portable,
}

impl SimdPath {
    /// Detects the best path compiled in and supported by the running CPU.
    #[allow(unreachable_code)]
    pub fn detect() -> Self {
        #[cfg(all(avx2, target_arch = "x86_64"))]
        {
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return SimdPath::Avx2Fma;
            }
        }

        #[cfg(all(neon, target_arch = "aarch64"))]
        {
            return SimdPath::Neon;
        }

        SimdPath::Portable
    }

    pub fn name(&self) -> &'static str {
        match self {
            SimdPath::Avx2Fma => "avx2+fma",
            SimdPath::Neon => "neon",
            SimdPath::Portable => "portable",
        }
    }
}

static SIMD_PATH: OnceLock<SimdPath> = OnceLock::new();

/// The detected path, cached for the lifetime of the process.
pub fn simd_path() -> SimdPath {
    *SIMD_PATH.get_or_init(SimdPath::detect)
}

/// `y += alpha * x` over `min(x.len(), y.len())` elements.
#[inline]
fn axpy(path: SimdPath, alpha: f32, x: &[f32], y: &mut [f32]) {
    match path {
        #[cfg(all(avx2, target_arch = "x86_64"))]
        // SAFETY: `Avx2Fma` is only produced by `detect` after the runtime check.
        SimdPath::Avx2Fma => unsafe { axpy_avx2(alpha, x, y) },
        #[cfg(all(neon, target_arch = "aarch64"))]
        // SAFETY: NEON is mandatory on aarch64.
        SimdPath::Neon => unsafe { axpy_neon(alpha, x, y) },
        _ => axpy_portable(alpha, x, y),
    }
}

fn axpy_portable(alpha: f32, x: &[f32], y: &mut [f32]) {
    let len = x.len().min(y.len());
    let (x, y) = (&x[..len], &mut y[..len]);

    let mut y_chunks = y.chunks_exact_mut(LANES);
    let mut x_chunks = x.chunks_exact(LANES);
    for (yc, xc) in (&mut y_chunks).zip(&mut x_chunks) {
        let mut lanes = [0.0f32; LANES];
        lanes.copy_from_slice(yc);
        for l in 0..LANES {
            lanes[l] += alpha * xc[l];
        }
        yc.copy_from_slice(&lanes);
    }

    for (yv, xv) in y_chunks
        .into_remainder()
        .iter_mut()
        .zip(x_chunks.remainder())
    {
        *yv += alpha * xv;
    }
}

#[cfg(all(avx2, target_arch = "x86_64"))]
#[target_feature(enable = "avx2,fma")]
unsafe fn axpy_avx2(alpha: f32, x: &[f32], y: &mut [f32]) {
    use std::arch::x86_64::*;

    let len = x.len().min(y.len());
    let full = len / LANES * LANES;
    let va = _mm256_set1_ps(alpha);

    let mut idx = 0;
    while idx < full {
        let vx = _mm256_loadu_ps(x.as_ptr().add(idx));
        let vy = _mm256_loadu_ps(y.as_ptr().add(idx));
        _mm256_storeu_ps(y.as_mut_ptr().add(idx), _mm256_fmadd_ps(va, vx, vy));
        idx += LANES;
    }

    for t in full..len {
        y[t] = alpha.mul_add(x[t], y[t]);
    }
}

#[cfg(all(neon, target_arch = "aarch64"))]
unsafe fn axpy_neon(alpha: f32, x: &[f32], y: &mut [f32]) {
    use std::arch::aarch64::*;

    let len = x.len().min(y.len());
    let full = len / LANES * LANES;
    let va = vdupq_n_f32(alpha);

    let mut idx = 0;
    while idx < full {
        let lo = vfmaq_f32(vld1q_f32(y.as_ptr().add(idx)), vld1q_f32(x.as_ptr().add(idx)), va);
        let hi = vfmaq_f32(
            vld1q_f32(y.as_ptr().add(idx + 4)),
            vld1q_f32(x.as_ptr().add(idx + 4)),
            va,
        );
        vst1q_f32(y.as_mut_ptr().add(idx), lo);
        vst1q_f32(y.as_mut_ptr().add(idx + 4), hi);
        idx += LANES;
    }

    for t in full..len {
        y[t] = alpha.mul_add(x[t], y[t]);
    }
}

fn matmul_with_path(
    path: SimdPath,
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    n: usize,
    m: usize,
    p: usize,
) {
    for (i, c_row) in c[..n * p].chunks_exact_mut(p.max(1)).enumerate() {
        c_row.fill(0.0);
        for k in 0..m {
            let b_row = &b[at(k, 0, p)..at(k, 0, p) + p];
            axpy(path, a[at(i, k, m)], b_row, c_row);
        }
    }
}

/// Performs `C = A * B` (row-major, n x m times m x p) on the detected SIMD path.
pub fn vectorized_matmul(a: &[f32], b: &[f32], c: &mut [f32], n: usize, m: usize, p: usize) {
    matmul_with_path(simd_path(), a, b, c, n, m, p);
}

/// The SIMD variant.
#[derive(Debug, Clone, Copy)]
pub struct VectorizedKernel {
    path: SimdPath,
}

impl VectorizedKernel {
    /// Uses the best instruction set available on this machine.
    pub fn detect() -> Self {
        Self { path: simd_path() }
    }

    /// Forces the portable lanes, whatever the CPU supports.
    pub fn portable() -> Self {
        Self {
            path: SimdPath::Portable,
        }
    }

    pub fn path(&self) -> SimdPath {
        self.path
    }
}

impl Kernel for VectorizedKernel {
    fn name(&self) -> &'static str {
        "vectorized"
    }

    fn multiply(&self, inv: &mut Invocation<'_>) {
        let d = inv.dims;
        matmul_with_path(
            self.path,
            inv.a.as_slice(),
            inv.b.as_slice(),
            inv.c.as_mut_slice(),
            d.n,
            d.m,
            d.p,
        );
    }
}
