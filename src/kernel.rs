//! The calling convention every multiplication variant implements.
//!
//! A kernel computes `C = A * B` for row-major `A` (n x m), `B` (m x p) and
//! `C` (n x p). It receives one [`Invocation`], writes exactly the `n * p`
//! logical output elements and returns once all of its work is done, even if
//! it fanned out to worker threads internally.

use std::fmt;

use clap::ValueEnum;
use tracing::debug;

use crate::error::{config_error, shape_error, Result};
use crate::kernels::{BlockedKernel, NaiveKernel, ParallelKernel, VectorizedKernel};
use crate::matrix::{GuardedMatrix, Matrix};

/// Problem dimensions: `A` is `n x m`, `B` is `m x p`, `C` is `n x p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dims {
    pub n: usize,
    pub m: usize,
    pub p: usize,
}

impl Dims {
    pub const fn new(n: usize, m: usize, p: usize) -> Self {
        Self { n, m, p }
    }

    pub fn c_len(&self) -> usize {
        self.n * self.p
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.n, self.m, self.p)
    }
}

/// Everything one kernel call needs.
///
/// Inputs are shared borrows, the output is the only mutable borrow, so a
/// kernel can read `a` and `b` and write `c` but nothing else. Variants that
/// do not tile ignore `block_size`. Worker count and core placement are not
/// part of a call: a parallel variant fixes them when its pool is built
/// (see [`KernelKind::build`]).
#[derive(Debug)]
pub struct Invocation<'a> {
    pub a: &'a Matrix,
    pub b: &'a Matrix,
    pub c: &'a mut GuardedMatrix,
    pub dims: Dims,
    /// Tile edge for blocked variants.
    pub block_size: usize,
}

impl<'a> Invocation<'a> {
    /// Bundles the operands after checking their shapes agree.
    pub fn new(a: &'a Matrix, b: &'a Matrix, c: &'a mut GuardedMatrix) -> Result<Self> {
        let dims = Dims::new(a.rows(), a.cols(), b.cols());
        if b.rows() != dims.m {
            return Err(shape_error(
                dims.m,
                b.rows(),
                format!("left operand has {} columns but right operand has {} rows", dims.m, b.rows()),
            ));
        }
        if c.rows() != dims.n || c.cols() != dims.p {
            return Err(shape_error(
                dims.c_len(),
                c.len(),
                format!("output must be {}x{}, got {}x{}", dims.n, dims.p, c.rows(), c.cols()),
            ));
        }

        Ok(Self {
            a,
            b,
            c,
            dims,
            block_size: 32,
        })
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

/// One interchangeable matrix-multiplication algorithm.
pub trait Kernel: Send + Sync {
    /// Identifier used in logs and report file names.
    fn name(&self) -> &'static str;

    /// Computes `inv.c = inv.a * inv.b`, overwriting the whole logical output.
    fn multiply(&self, inv: &mut Invocation<'_>);
}

/// Kernel selection as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum KernelKind {
    /// Scalar triple loop.
    Naive,
    /// Cache-blocked scalar loop.
    Opt,
    /// SIMD row-broadcast loop.
    Vec,
    /// Multi-threaded rows.
    Para,
}

impl KernelKind {
    pub const ALL: [KernelKind; 4] = [
        KernelKind::Naive,
        KernelKind::Opt,
        KernelKind::Vec,
        KernelKind::Para,
    ];

    /// The name the built kernel reports.
    pub fn kernel_name(&self) -> &'static str {
        match self {
            KernelKind::Naive => "scalar_naive",
            KernelKind::Opt => "scalar_opt",
            KernelKind::Vec => "vectorized",
            KernelKind::Para => "parallelized",
        }
    }

    /// Instantiates the selected variant.
    ///
    /// `threads`, `cpu` and `pin` configure the parallel variant's pool for the
    /// kernel's whole lifetime; the other variants ignore them. Only the
    /// parallel variant can fail, when its worker pool cannot be built.
    pub fn build(&self, threads: usize, cpu: usize, pin: bool) -> Result<Box<dyn Kernel>> {
        let kernel: Box<dyn Kernel> = match self {
            KernelKind::Naive => Box::new(NaiveKernel),
            KernelKind::Opt => Box::new(BlockedKernel),
            KernelKind::Vec => {
                let kernel = VectorizedKernel::detect();
                debug!(path = kernel.path().name(), "vectorized kernel instruction set");
                Box::new(kernel)
            }
            KernelKind::Para => {
                let kernel = ParallelKernel::new(threads, cpu, pin)?;
                debug!(threads = kernel.threads(), cpu, pin, "parallel kernel pool built");
                Box::new(kernel)
            }
        };
        Ok(kernel)
    }
}

impl std::str::FromStr for KernelKind {
    type Err = crate::error::HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        <KernelKind as ValueEnum>::from_str(s, true)
            .map_err(|_| config_error(format!("Unknown \"{s}\" implementation")))
    }
}
