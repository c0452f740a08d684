//! Run configuration.

use std::path::PathBuf;

use crate::dataset::DatasetSize;
use crate::error::{config_error, Result};
use crate::kernel::KernelKind;
use crate::measure::{DEFAULT_INNER, DEFAULT_REPEATS};
use crate::stats::DEFAULT_THRESHOLD;
use crate::verify::DEFAULT_TOLERANCE;

/// Default tile edge for blocked kernels.
pub const DEFAULT_BLOCK_SIZE: usize = 32;

/// Everything one benchmark run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub kernel: KernelKind,
    pub size: DatasetSize,
    /// Number of timing samples.
    pub nruns: usize,
    /// Outlier threshold in standard deviations.
    pub nstdevs: f64,
    pub threads: usize,
    /// First core of the affinity mask.
    pub cpu: usize,
    pub block_size: usize,
    /// Kernel calls per timing sample.
    pub inner: usize,
    pub tolerance: f32,
    /// Write the last output to `<size>_dump.csv`.
    pub dump: bool,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Request priority, FIFO scheduling and affinity before measuring.
    pub sched: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Naive,
            size: DatasetSize::Native,
            nruns: DEFAULT_REPEATS,
            nstdevs: DEFAULT_THRESHOLD,
            threads: 1,
            cpu: 0,
            block_size: DEFAULT_BLOCK_SIZE,
            inner: DEFAULT_INNER,
            tolerance: DEFAULT_TOLERANCE,
            dump: false,
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            sched: true,
        }
    }
}

impl HarnessConfig {
    pub fn new(kernel: KernelKind, size: DatasetSize) -> Self {
        Self {
            kernel,
            size,
            ..Self::default()
        }
    }

    /// Rejects values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(config_error("block size must be positive"));
        }
        if self.nruns == 0 {
            return Err(config_error("number of runs must be at least 1"));
        }
        if self.inner == 0 {
            return Err(config_error("inner multiplicity must be at least 1"));
        }
        if self.threads == 0 {
            return Err(config_error("number of threads must be at least 1"));
        }
        if !self.nstdevs.is_finite() || self.nstdevs <= 0.0 {
            return Err(config_error(format!(
                "number of standard deviations must be positive, got {}",
                self.nstdevs
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(config_error(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HarnessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.nruns, 10_000);
        assert_eq!(config.inner, 16);
        assert_eq!(config.block_size, 32);
        assert_eq!(config.nstdevs, 3.0);
        assert_eq!(config.tolerance, 0.5);
        assert_eq!(config.size, DatasetSize::Native);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = HarnessConfig::new(KernelKind::Opt, DatasetSize::Testing);
        let cases = [
            HarnessConfig { block_size: 0, ..base.clone() },
            HarnessConfig { nruns: 0, ..base.clone() },
            HarnessConfig { inner: 0, ..base.clone() },
            HarnessConfig { threads: 0, ..base.clone() },
            HarnessConfig { nstdevs: 0.0, ..base.clone() },
            HarnessConfig { nstdevs: f64::NAN, ..base.clone() },
            HarnessConfig { tolerance: -0.1, ..base.clone() },
            HarnessConfig { tolerance: f32::INFINITY, ..base.clone() },
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("Configuration error"), "{config:?}");
        }
    }

    #[test]
    fn test_zero_tolerance_allowed() {
        let config = HarnessConfig {
            tolerance: 0.0,
            ..HarnessConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
