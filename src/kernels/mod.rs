//! Matrix-multiplication variants implementing [`crate::kernel::Kernel`].
//!
//! All variants take row-major `A` (n x m) and `B` (m x p) and overwrite the
//! n x p output. They differ only in loop order, tiling, vector width and
//! threading, so their outputs agree within floating-point tolerance but are
//! not bit-identical.

pub mod blocked;
pub mod naive;
pub mod parallel;
pub mod vectorized;

pub use blocked::{blocked_matmul, BlockedKernel};
pub use naive::{naive_matmul, NaiveKernel};
pub use parallel::ParallelKernel;
pub use vectorized::{vectorized_matmul, SimdPath, VectorizedKernel};
