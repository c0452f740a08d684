//! Benchmarking harness for interchangeable dense matrix-multiplication kernels.
//!
//! A run loads a pair of operands and their reference product, times a chosen
//! [`Kernel`] many times over, checks the last output against the reference
//! and a guard region, and reduces the timings to a mean with iterative
//! outlier rejection.
//!
//! ```no_run
//! use matbench::{DatasetSize, Harness, HarnessConfig, KernelKind};
//!
//! let config = HarnessConfig::new(KernelKind::Opt, DatasetSize::Small);
//! let summary = Harness::from_config(config)?.run()?;
//! println!("{}: {} ns ({})", summary.kernel, summary.statistics.mean, summary.outcome);
//! # Ok::<(), matbench::HarnessError>(())
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod generate;
pub mod harness;
pub mod io;
pub mod kernel;
pub mod kernels;
pub mod matrix;
pub mod measure;
pub mod sched;
pub mod stats;
pub mod verify;

pub use config::HarnessConfig;
pub use dataset::DatasetSize;
pub use error::{HarnessError, Result};
pub use harness::{Harness, RunSummary};
pub use kernel::{Dims, Invocation, Kernel, KernelKind};
pub use matrix::{GuardedMatrix, Matrix, GUARD_LEN, GUARD_SENTINEL};
pub use measure::Sampler;
pub use stats::{OutlierFilter, PassSummary, Statistics, TimingSample};
pub use verify::{check_guard, compare, Outcome, Verdict};
