//! The measurement loop: repeated, amortized, timed kernel invocations.
//!
//! Every sample brackets `inner` back-to-back calls with a single pair of
//! [`Instant`] readings and records the elapsed nanoseconds divided by
//! `inner`. Samples are taken strictly one after another on the calling
//! thread; the loop never overlaps invocations.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::{config_error, Result};
use crate::kernel::{Invocation, Kernel};
use crate::stats::TimingSample;

/// Default number of samples.
pub const DEFAULT_REPEATS: usize = 10_000;

/// Default number of invocations per sample.
pub const DEFAULT_INNER: usize = 16;

/// Repeat count and per-sample multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    repeats: usize,
    inner: usize,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            repeats: DEFAULT_REPEATS,
            inner: DEFAULT_INNER,
        }
    }
}

impl Sampler {
    /// Both counts must be at least one.
    pub fn new(repeats: usize, inner: usize) -> Result<Self> {
        if repeats == 0 {
            return Err(config_error("repeat count must be at least 1"));
        }
        if inner == 0 {
            return Err(config_error("inner multiplicity must be at least 1"));
        }
        Ok(Self { repeats, inner })
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }

    pub fn inner(&self) -> usize {
        self.inner
    }

    /// Collects `repeats` samples of `kernel` on `inv`.
    ///
    /// When this returns, `inv.c` holds the output of the last invocation.
    pub fn sample(&self, kernel: &dyn Kernel, inv: &mut Invocation<'_>) -> TimingSample {
        info!(
            kernel = kernel.name(),
            repeats = self.repeats,
            inner = self.inner,
            dims = %inv.dims,
            "invoking the implementation"
        );

        let mut sample = TimingSample::with_capacity(self.repeats);
        for _ in 0..self.repeats {
            let start = Instant::now();
            for _ in 0..self.inner {
                kernel.multiply(inv);
            }
            let elapsed = start.elapsed();
            sample.push(elapsed.as_nanos() as f64 / self.inner as f64);
        }

        debug!(samples = sample.len(), "measurement finished");
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{GuardedMatrix, Matrix};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingKernel {
        calls: AtomicUsize,
    }

    impl Kernel for CountingKernel {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn multiply(&self, inv: &mut Invocation<'_>) {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            inv.c.as_mut_slice().fill(call as f32);
        }
    }

    #[test]
    fn test_sampler_rejects_zero_counts() {
        assert!(Sampler::new(0, 16).is_err());
        assert!(Sampler::new(10, 0).is_err());
        assert!(Sampler::new(1, 1).is_ok());
    }

    #[test]
    fn test_sample_invokes_repeats_times_inner() {
        let a = Matrix::zeros(2, 2);
        let b = Matrix::zeros(2, 2);
        let mut c = GuardedMatrix::new(2, 2);
        let mut inv = Invocation::new(&a, &b, &mut c).unwrap();

        let kernel = CountingKernel {
            calls: AtomicUsize::new(0),
        };
        let sampler = Sampler::new(5, 3).unwrap();
        let sample = sampler.sample(&kernel, &mut inv);

        assert_eq!(sample.len(), 5);
        assert_eq!(sample.active_count(), 5);
        assert!(sample.values().iter().all(|&v| v >= 0.0));
        assert_eq!(kernel.calls.load(Ordering::SeqCst), 15);
        // Output of the last (15th) call survives.
        assert_eq!(c.as_slice(), &[14.0; 4]);
    }

    #[test]
    fn test_default_sampler() {
        let sampler = Sampler::default();
        assert_eq!(sampler.repeats(), DEFAULT_REPEATS);
        assert_eq!(sampler.inner(), DEFAULT_INNER);
    }
}
