//! End-to-end runs over generated datasets.

use std::fs;

use matbench::generate::generate;
use matbench::io::load_matrix;
use matbench::{DatasetSize, Harness, HarnessConfig, HarnessError, KernelKind, Outcome};
use tempfile::TempDir;

fn quick_config(kernel: KernelKind, dir: &TempDir) -> HarnessConfig {
    HarnessConfig {
        nruns: 20,
        inner: 2,
        threads: 2,
        sched: false,
        data_dir: dir.path().to_path_buf(),
        output_dir: dir.path().to_path_buf(),
        ..HarnessConfig::new(kernel, DatasetSize::Testing)
    }
}

#[test]
fn test_generated_dataset_loads() {
    let dir = TempDir::new().unwrap();
    let files = generate(DatasetSize::Testing, 42, dir.path()).unwrap();

    let text = fs::read_to_string(&files.input).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert_eq!(text.lines().next().unwrap().split(',').count(), 16 * 12);

    let golden = load_matrix(&files.golden, 16, 8).unwrap();
    assert_eq!(golden.len(), 128);
    assert!(golden.as_slice().iter().all(|&v| (0.0..12.0).contains(&v)));
}

#[test]
fn test_every_kernel_verifies_on_testing_dataset() {
    let dir = TempDir::new().unwrap();
    generate(DatasetSize::Testing, 0xdead_beef, dir.path()).unwrap();

    for kind in KernelKind::ALL {
        let harness = Harness::from_config(quick_config(kind, &dir)).unwrap();
        let summary = harness.run().unwrap();

        assert_eq!(summary.kernel, kind.kernel_name());
        assert_eq!(summary.outcome, Outcome::Verified, "{}", kind.kernel_name());
        assert_eq!(summary.sample.len(), 20);
        assert!(summary.statistics.mean >= 0.0);
        assert!(summary.statistics.active >= 1);
    }
}

#[test]
fn test_runtime_report_written() {
    let dir = TempDir::new().unwrap();
    generate(DatasetSize::Testing, 1, dir.path()).unwrap();

    let harness = Harness::from_config(quick_config(KernelKind::Opt, &dir)).unwrap();
    let summary = harness.run().unwrap();

    let report = fs::read_to_string(dir.path().join("scalar_opt_runtimes.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "impl,scalar_opt");
    assert_eq!(lines[1], "num_of_runs,20");
    assert!(lines[2].starts_with("runtimes, "));
    assert_eq!(lines[2].split(", ").count(), 21);
    assert_eq!(lines[3], format!("avg,{}", summary.statistics.mean));
    assert!(lines.contains(&"verdict,verified"));
}

#[test]
fn test_dump_written_when_requested() {
    let dir = TempDir::new().unwrap();
    let files = generate(DatasetSize::Testing, 2, dir.path()).unwrap();

    let config = HarnessConfig {
        dump: true,
        ..quick_config(KernelKind::Vec, &dir)
    };
    Harness::from_config(config).unwrap().run().unwrap();

    let dumped = load_matrix(DatasetSize::Testing.dump_path(dir.path()), 16, 8).unwrap();
    let golden = load_matrix(&files.golden, 16, 8).unwrap();
    for (d, g) in dumped.as_slice().iter().zip(golden.as_slice()) {
        assert!((d - g).abs() < 1e-3);
    }
}

#[test]
fn test_missing_dataset_is_io_error() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::from_config(quick_config(KernelKind::Naive, &dir)).unwrap();
    match harness.run() {
        Err(HarnessError::Io { path, .. }) => {
            assert!(path.ends_with("testing_golden.csv"));
        }
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn test_truncated_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let files = generate(DatasetSize::Testing, 3, dir.path()).unwrap();

    // keep A, drop B
    let text = fs::read_to_string(&files.input).unwrap();
    let first_line = text.lines().next().unwrap();
    fs::write(&files.input, format!("{first_line}\n")).unwrap();

    let harness = Harness::from_config(quick_config(KernelKind::Naive, &dir)).unwrap();
    match harness.run() {
        Err(HarnessError::Truncated {
            expected, found, ..
        }) => {
            assert_eq!(expected, 12 * 8);
            assert_eq!(found, 0);
        }
        other => panic!("expected a truncation error, got {other:?}"),
    }
}

#[test]
fn test_invalid_config_rejected_before_loading() {
    let dir = TempDir::new().unwrap();
    let config = HarnessConfig {
        block_size: 0,
        ..quick_config(KernelKind::Opt, &dir)
    };
    assert!(matches!(
        Harness::from_config(config),
        Err(HarnessError::Config { .. })
    ));
}
