//! Outlier-rejection engine tests.

use matbench::{OutlierFilter, TimingSample};
use rand::prelude::*;
use statrs::statistics::Statistics as _;

fn near_ten(count: usize) -> Vec<f64> {
    (0..count).map(|i| 10.0 + (i % 5) as f64 * 0.01).collect()
}

#[test]
fn test_single_extreme_outlier_removed_in_one_pass() {
    let mut values = near_ten(100);
    values.push(10_000.0);
    let mut sample = TimingSample::new(values);

    let stats = OutlierFilter::new(3.0)
        .unwrap()
        .converge(&mut sample)
        .unwrap();

    assert_eq!(stats.passes[0].rejected, 1, "outlier not rejected in pass 1");
    assert_eq!(stats.pass_count(), 2);
    assert_eq!(stats.passes[1].rejected, 0);
    assert_eq!(stats.active, 100);
    assert!(!sample.mask()[100]);
    assert!((stats.mean - 10.02).abs() < 1e-9, "mean {}", stats.mean);
}

#[test]
fn test_converging_twice_changes_nothing() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut values: Vec<f64> = (0..500).map(|_| rng.random_range(900.0..1100.0)).collect();
    values.extend([5_000.0, 7_500.0, 20.0]);
    let mut sample = TimingSample::new(values);
    let filter = OutlierFilter::default();

    let first = filter.converge(&mut sample).unwrap();
    let mask = sample.mask().to_vec();
    let second = filter.converge(&mut sample).unwrap();

    assert_eq!(second.pass_count(), 1);
    assert_eq!(second.rejected, 0);
    assert_eq!(second.mean, first.mean);
    assert_eq!(sample.mask(), mask.as_slice());
}

#[test]
fn test_single_sample() {
    let mut sample = TimingSample::new(vec![1234.5]);
    let stats = OutlierFilter::default().converge(&mut sample).unwrap();
    assert_eq!(stats.pass_count(), 1);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.mean, 1234.5);
}

#[test]
fn test_mask_sequence_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(99);
    let values: Vec<f64> = (0..1000)
        .map(|_| {
            if rng.random_bool(0.02) {
                rng.random_range(5_000.0..50_000.0)
            } else {
                rng.random_range(100.0..120.0)
            }
        })
        .collect();

    let filter = OutlierFilter::new(2.5).unwrap();
    let mut first = TimingSample::new(values.clone());
    let mut second = TimingSample::new(values);
    let a = filter.converge(&mut first).unwrap();
    let b = filter.converge(&mut second).unwrap();

    assert_eq!(a, b);
    assert_eq!(first.mask(), second.mask());
}

#[test]
fn test_pass_figures_match_statrs() {
    let mut rng = StdRng::seed_from_u64(5);
    let values: Vec<f64> = (0..257).map(|_| rng.random_range(0.0..1000.0)).collect();
    let mut sample = TimingSample::new(values.clone());

    let stats = OutlierFilter::default().converge(&mut sample).unwrap();
    let first = stats.passes[0];

    let mean = values.iter().mean();
    let std_dev = values.iter().population_std_dev();
    assert!((first.mean - mean).abs() < 1e-9);
    assert!((first.std_dev - std_dev).abs() < 1e-9);
    assert_eq!(first.min, values.iter().copied().fold(f64::INFINITY, f64::min));
    assert_eq!(first.max, values.iter().copied().fold(f64::NEG_INFINITY, f64::max));
}

#[test]
fn test_raw_values_never_modified() {
    let mut values = near_ten(30);
    values.push(900.0);
    let original = values.clone();
    let mut sample = TimingSample::new(values);

    OutlierFilter::default().converge(&mut sample).unwrap();
    assert_eq!(sample.values(), original.as_slice());
}
