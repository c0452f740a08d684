//! Synthetic datasets: random operands and their reference product.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use crate::dataset::DatasetSize;
use crate::error::{io_error, Result};
use crate::io::write_line;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0xdead_beef;

/// Operands and reference product in double precision.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub a: Array2<f64>,
    pub b: Array2<f64>,
    pub golden: Array2<f64>,
}

impl Dataset {
    /// Draws `A` and `B` uniformly from `[0, 1)` and multiplies them.
    pub fn random(size: DatasetSize, seed: u64) -> Self {
        let dims = size.dims();
        let mut rng = StdRng::seed_from_u64(seed);
        let a = Array2::from_shape_fn((dims.n, dims.m), |_| rng.random::<f64>());
        let b = Array2::from_shape_fn((dims.m, dims.p), |_| rng.random::<f64>());
        let golden = a.dot(&b);
        Self { a, b, golden }
    }
}

/// Paths written for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub input: PathBuf,
    pub golden: PathBuf,
}

fn write_file(path: &Path, matrices: &[&Array2<f64>]) -> Result<()> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    for matrix in matrices {
        write_line(&mut writer, matrix.iter()).map_err(|e| io_error(path, e))?;
    }
    writer.flush().map_err(|e| io_error(path, e))
}

/// Writes `<size>_test.csv` (A then B, one per line) and `<size>_golden.csv`
/// into `dir`.
pub fn generate(size: DatasetSize, seed: u64, dir: impl AsRef<Path>) -> Result<GeneratedFiles> {
    let dir = dir.as_ref();
    let dims = size.dims();
    info!(size = %size, dims = %dims, seed, "generating dataset");

    let dataset = Dataset::random(size, seed);
    let files = GeneratedFiles {
        input: size.input_path(dir),
        golden: size.golden_path(dir),
    };

    write_file(&files.input, &[&dataset.a, &dataset.b])?;
    write_file(&files.golden, &[&dataset.golden])?;

    info!(
        input = %files.input.display(),
        golden = %files.golden.display(),
        "dataset written"
    );
    Ok(files)
}
