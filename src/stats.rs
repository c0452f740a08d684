//! Iterative outlier rejection over a timing sample.
//!
//! Each pass freezes the mean and population standard deviation of the active
//! samples, then deactivates every active sample farther than
//! `threshold * std_dev` from that mean. Passes repeat until one deactivates
//! nothing; that pass's mean is the reported result. Deactivation is one-way
//! and raw values are never modified, so the same sample and threshold always
//! produce the same sequence of masks.

use tracing::debug;

use crate::error::{config_error, degenerate_error, Result};

/// Default outlier threshold, in standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Per-run durations (nanoseconds) and the mask of runs still in play.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    values: Vec<f64>,
    active: Vec<bool>,
}

impl TimingSample {
    /// Wraps raw durations with every sample active.
    pub fn new(values: Vec<f64>) -> Self {
        let active = vec![true; values.len()];
        Self { values, active }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            active: Vec::with_capacity(capacity),
        }
    }

    /// Appends one run; new runs start active.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
        self.active.push(true);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mask(&self) -> &[bool] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// Values of the samples still active, in collection order.
    pub fn active_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .zip(&self.active)
            .filter(|(_, &a)| a)
            .map(|(&v, _)| v)
    }
}

/// Figures for one refinement pass, computed before its deactivations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    /// 1-based pass number.
    pub pass: usize,
    pub active: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Samples deactivated by this pass.
    pub rejected: usize,
}

/// Converged statistics for a timing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub passes: Vec<PassSummary>,
    /// Mean of the final pass, the reported figure.
    pub mean: f64,
    pub std_dev: f64,
    /// Samples still active after convergence.
    pub active: usize,
    /// Samples deactivated across all passes of this run.
    pub rejected: usize,
}

impl Statistics {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}

/// The refinement engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierFilter {
    threshold: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl OutlierFilter {
    /// `threshold` must be finite and strictly positive.
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(config_error(format!(
                "outlier threshold must be a positive number of standard deviations, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Runs one pass over the active samples and deactivates the outliers.
    ///
    /// Fails if there are no active samples to describe.
    pub fn refine(&self, sample: &mut TimingSample, pass: usize) -> Result<PassSummary> {
        let (active, mean, std_dev, min, max) = describe(sample).ok_or_else(|| {
            degenerate_error(sample.len(), "no active samples left to average")
        })?;

        let limit = self.threshold * std_dev;
        let mut rejected = 0;
        for (value, flag) in sample.values.iter().zip(sample.active.iter_mut()) {
            if *flag && (value - mean).abs() > limit {
                *flag = false;
                rejected += 1;
            }
        }

        Ok(PassSummary {
            pass,
            active,
            mean,
            std_dev,
            min,
            max,
            rejected,
        })
    }

    /// Refines until a pass rejects nothing.
    ///
    /// An empty sample, or one whose every run gets rejected, is a fatal
    /// measurement failure rather than a zero or NaN average.
    pub fn converge(&self, sample: &mut TimingSample) -> Result<Statistics> {
        let mut passes = Vec::new();

        loop {
            let summary = self.refine(sample, passes.len() + 1)?;
            debug!(
                pass = summary.pass,
                active = summary.active,
                mean = summary.mean,
                std_dev = summary.std_dev,
                rejected = summary.rejected,
                "statistics pass"
            );
            passes.push(summary);

            if summary.rejected == 0 {
                let rejected = passes.iter().map(|p| p.rejected).sum();
                return Ok(Statistics {
                    mean: summary.mean,
                    std_dev: summary.std_dev,
                    active: summary.active,
                    rejected,
                    passes,
                });
            }
            if summary.rejected == summary.active {
                return Err(degenerate_error(
                    sample.len(),
                    format!(
                        "every sample was rejected as an outlier after {} passes",
                        passes.len()
                    ),
                ));
            }
        }
    }
}

/// Count, mean, population std-dev, min and max of the active samples.
fn describe(sample: &TimingSample) -> Option<(usize, f64, f64, f64, f64)> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in sample.active_values() {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    if count == 0 {
        return None;
    }

    let mean = sum / count as f64;
    let variance = sample
        .active_values()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / count as f64;

    Some((count, mean, variance.sqrt(), min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(threshold: f64) -> OutlierFilter {
        OutlierFilter::new(threshold).unwrap()
    }

    #[test]
    fn test_single_sample_converges_immediately() {
        let mut sample = TimingSample::new(vec![42.0]);
        let stats = filter(3.0).converge(&mut sample).unwrap();
        assert_eq!(stats.pass_count(), 1);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.rejected, 0);
    }

    #[test]
    fn test_identical_samples_never_rejected() {
        let mut sample = TimingSample::new(vec![7.0; 50]);
        let stats = filter(0.5).converge(&mut sample).unwrap();
        assert_eq!(stats.pass_count(), 1);
        assert_eq!(stats.active, 50);
    }

    #[test]
    fn test_empty_sample_is_degenerate() {
        let mut sample = TimingSample::new(Vec::new());
        assert!(filter(3.0).converge(&mut sample).is_err());
    }

    #[test]
    fn test_all_rejected_is_degenerate() {
        // mean 5, std 5: with T = 0.5 both samples sit 5 > 2.5 away.
        let mut sample = TimingSample::new(vec![0.0, 10.0]);
        let err = filter(0.5).converge(&mut sample).unwrap_err();
        assert!(err.to_string().contains("every sample was rejected"));
        assert_eq!(sample.active_count(), 0);
        assert_eq!(sample.values(), &[0.0, 10.0]);
    }

    #[test]
    fn test_pass_uses_frozen_mean() {
        // Two high outliers: both judged against the same mean in pass 1.
        let mut values = vec![10.0; 20];
        values.push(1000.0);
        values.push(1000.0);
        let mut sample = TimingSample::new(values);
        let summary = filter(2.0).refine(&mut sample, 1).unwrap();
        assert_eq!(summary.active, 22);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 1000.0);
        assert_eq!(sample.active_count(), 20);
    }

    #[test]
    fn test_statistics_taken_from_converged_pass() {
        let mut values = vec![10.0; 20];
        values.push(1000.0);
        values.push(1000.0);
        let mut sample = TimingSample::new(values);
        let stats = filter(2.0).converge(&mut sample).unwrap();

        let last = *stats.passes.last().unwrap();
        assert_eq!(last.rejected, 0);
        assert_eq!(stats.mean, last.mean);
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.active, 20);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.pass_count(), 2);
    }

    #[test]
    fn test_boundary_is_not_rejected() {
        // mean 2, population std 1; |x - mean| == 1 * std is kept.
        let mut sample = TimingSample::new(vec![1.0, 3.0]);
        let stats = filter(1.0).converge(&mut sample).unwrap();
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.std_dev, 1.0);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(OutlierFilter::new(0.0).is_err());
        assert!(OutlierFilter::new(-1.0).is_err());
        assert!(OutlierFilter::new(f64::NAN).is_err());
        assert!(OutlierFilter::new(f64::INFINITY).is_err());
        assert_eq!(OutlierFilter::default().threshold(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_push_keeps_mask_in_step() {
        let mut sample = TimingSample::with_capacity(3);
        sample.push(1.0);
        sample.push(2.0);
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.mask(), &[true, true]);
        assert_eq!(sample.active_values().collect::<Vec<_>>(), vec![1.0, 2.0]);
    }
}
