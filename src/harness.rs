//! The orchestrator: loads a dataset, measures one kernel on it, verifies the
//! output and reduces the timings.
//!
//! Configuration and I/O problems end the run before any measurement. A wrong
//! or overrunning kernel does not: its timings are still reduced and reported,
//! tagged with the [`Outcome`] that says they cannot be trusted.

use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::error::{shape_error, Result};
use crate::io::{dump_matrix, load_matrix, MatrixReader, RuntimeReport};
use crate::kernel::{Dims, Invocation, Kernel};
use crate::matrix::{GuardedMatrix, Matrix};
use crate::measure::Sampler;
use crate::sched::SchedulingHints;
use crate::stats::{OutlierFilter, Statistics, TimingSample};
use crate::verify::{compare, mismatches, Outcome, Verdict};

/// Mismatching positions logged when verification fails.
const MISMATCH_LOG_LIMIT: usize = 10;

/// Everything a finished benchmark produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub kernel: &'static str,
    pub dims: Dims,
    pub outcome: Outcome,
    pub statistics: Statistics,
    /// Raw samples with the final active mask.
    pub sample: TimingSample,
    /// Output of the last invocation.
    pub output: Matrix,
}

impl RunSummary {
    pub fn report(&self) -> RuntimeReport<'_> {
        RuntimeReport {
            kernel: self.kernel,
            sample: &self.sample,
            statistics: &self.statistics,
            outcome: self.outcome,
        }
    }
}

/// A validated benchmark run.
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
    sampler: Sampler,
    filter: OutlierFilter,
}

impl Harness {
    /// Validates `config`; nothing is loaded or measured yet.
    pub fn from_config(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let sampler = Sampler::new(config.nruns, config.inner)?;
        let filter = OutlierFilter::new(config.nstdevs)?;
        Ok(Self {
            config,
            sampler,
            filter,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs the configured kernel on the configured dataset.
    pub fn run(&self) -> Result<RunSummary> {
        let cfg = &self.config;
        let dims = cfg.size.dims();

        if cfg.sched {
            SchedulingHints::new(cfg.cpu, cfg.threads).apply();
        } else {
            info!("scheduling hints disabled");
        }

        info!(size = %cfg.size, dims = %dims, "loading matrices");
        let golden = load_matrix(cfg.size.golden_path(&cfg.data_dir), dims.n, dims.p)?;
        let mut input = MatrixReader::open(cfg.size.input_path(&cfg.data_dir))?;
        let a = input.read_matrix(dims.n, dims.m)?;
        let b = input.read_matrix(dims.m, dims.p)?;

        let kernel = cfg.kernel.build(cfg.threads, cfg.cpu, cfg.sched)?;
        let summary = self.benchmark(kernel.as_ref(), &a, &b, &golden)?;

        if cfg.dump {
            dump_matrix(cfg.size.dump_path(&cfg.output_dir), &summary.output);
        }
        summary.report().save(&cfg.output_dir);

        Ok(summary)
    }

    /// Measures, verifies and reduces `kernel` on in-memory operands.
    pub fn benchmark(
        &self,
        kernel: &dyn Kernel,
        a: &Matrix,
        b: &Matrix,
        reference: &Matrix,
    ) -> Result<RunSummary> {
        if reference.rows() != a.rows() || reference.cols() != b.cols() {
            return Err(shape_error(
                a.rows() * b.cols(),
                reference.len(),
                format!(
                    "reference must be {}x{}, got {}x{}",
                    a.rows(),
                    b.cols(),
                    reference.rows(),
                    reference.cols()
                ),
            ));
        }

        let mut output = GuardedMatrix::new(a.rows(), b.cols());
        let mut inv = Invocation::new(a, b, &mut output)?
            .with_block_size(self.config.block_size);
        let dims = inv.dims;

        let mut sample = self.sampler.sample(kernel, &mut inv);

        let outcome = self.verify(&output, reference);
        let statistics = self.filter.converge(&mut sample)?;
        info!(
            kernel = kernel.name(),
            mean = statistics.mean,
            std_dev = statistics.std_dev,
            active = statistics.active,
            passes = statistics.pass_count(),
            "statistics converged"
        );

        Ok(RunSummary {
            kernel: kernel.name(),
            dims,
            outcome,
            statistics,
            sample,
            output: output.to_matrix(),
        })
    }

    fn verify(&self, output: &GuardedMatrix, reference: &Matrix) -> Outcome {
        let count = reference.len();
        let tolerance = self.config.tolerance;
        let values_match = compare(reference.as_slice(), output.as_slice(), count, tolerance);
        let guard_intact = output.guard_intact();
        let outcome = Verdict::new(values_match, guard_intact).outcome();

        if !values_match {
            for m in mismatches(
                reference.as_slice(),
                output.as_slice(),
                count,
                tolerance,
                MISMATCH_LOG_LIMIT,
            ) {
                warn!(
                    index = m.index,
                    expected = m.expected,
                    actual = m.actual,
                    "output differs from reference"
                );
            }
        }
        if !guard_intact {
            warn!("guard region past the output was overwritten");
        }

        match outcome {
            Outcome::Verified => info!(%outcome, "output verified"),
            _ => warn!(%outcome, "output could not be verified"),
        }
        outcome
    }
}
