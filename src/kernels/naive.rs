use crate::kernel::{Invocation, Kernel};
use crate::matrix::at;

/// Reference `C = A * B` with the textbook i-j-k loop order.
///
/// `a` is n x m, `b` is m x p and `c` is n x p, all row-major. Every element of
/// `c` in `0..n*p` is overwritten.
pub fn naive_matmul(a: &[f32], b: &[f32], c: &mut [f32], n: usize, m: usize, p: usize) {
    for i in 0..n {
        for j in 0..p {
            let mut sum = 0.0f32;
            for k in 0..m {
                sum += a[at(i, k, m)] * b[at(k, j, p)];
            }
            c[at(i, j, p)] = sum;
        }
    }
}

/// The scalar reference variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveKernel;

impl Kernel for NaiveKernel {
    fn name(&self) -> &'static str {
        "scalar_naive"
    }

    fn multiply(&self, inv: &mut Invocation<'_>) {
        let d = inv.dims;
        naive_matmul(
            inv.a.as_slice(),
            inv.b.as_slice(),
            inv.c.as_mut_slice(),
            d.n,
            d.m,
            d.p,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_2x2() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        naive_matmul(&a, &b, &mut c, 2, 2, 2);
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_naive_non_square() {
        // (2x3) * (3x1)
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 0.0, -1.0];
        let mut c = [f32::NAN; 2];
        naive_matmul(&a, &b, &mut c, 2, 3, 1);
        assert_eq!(c, [-2.0, -2.0]);
    }

    #[test]
    fn test_naive_empty_inner_dimension_zeroes_output() {
        let mut c = [7.0; 6];
        naive_matmul(&[], &[], &mut c, 2, 0, 3);
        assert_eq!(c, [0.0; 6]);
    }
}
