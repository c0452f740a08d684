//! Delimited text files: matrix loading, matrix dumps and runtime reports.
//!
//! Matrices are stored as decimal values separated by commas, whitespace or
//! newlines. A loader stops as soon as it has the values it was asked for and
//! throws away the rest of that line, so several matrices can live in one
//! file, one per line.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::{io_error, HarnessError, Result};
use crate::matrix::Matrix;
use crate::stats::{Statistics, TimingSample};
use crate::verify::Outcome;

/// Sequential reader of matrices from one delimited text source.
pub struct MatrixReader<R> {
    reader: R,
    path: PathBuf,
    line: String,
}

impl MatrixReader<BufReader<File>> {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> MatrixReader<R> {
    /// Wraps an already-open source; `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            line: String::new(),
        }
    }

    /// Fills `dest` with the next `dest.len()` values.
    pub fn read_into(&mut self, dest: &mut [f32]) -> Result<()> {
        let expected = dest.len();
        let mut found = 0;

        while found < expected {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| io_error(&self.path, e))?;
            if read == 0 {
                return Err(HarnessError::Truncated {
                    path: self.path.clone(),
                    expected,
                    found,
                });
            }

            let tokens = self
                .line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty());
            for token in tokens {
                if found == expected {
                    break;
                }
                dest[found] = token.parse().map_err(|e| HarnessError::Parse {
                    path: self.path.clone(),
                    index: found,
                    message: format!("invalid value \"{token}\": {e}"),
                })?;
                found += 1;
            }
        }

        Ok(())
    }

    /// Reads the next `rows x cols` matrix.
    pub fn read_matrix(&mut self, rows: usize, cols: usize) -> Result<Matrix> {
        let mut matrix = Matrix::zeros(rows, cols);
        self.read_into(matrix.as_mut_slice())?;
        Ok(matrix)
    }
}

/// Loads a single `rows x cols` matrix from the start of `path`.
pub fn load_matrix(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Matrix> {
    let path = path.as_ref();
    let matrix = MatrixReader::open(path)?.read_matrix(rows, cols)?;
    debug!(path = %path.display(), rows, cols, "matrix loaded");
    Ok(matrix)
}

/// Writes `values` as one comma-separated line.
pub fn write_line<W, T, I>(writer: &mut W, values: I) -> std::io::Result<()>
where
    W: Write,
    T: Display,
    I: IntoIterator<Item = T>,
{
    let mut first = true;
    for value in values {
        if first {
            write!(writer, "{value}")?;
            first = false;
        } else {
            write!(writer, ",{value}")?;
        }
    }
    writeln!(writer)
}

/// Writes a row-major `rows x cols` buffer, one matrix row per line.
pub fn write_matrix<W: Write>(
    writer: &mut W,
    buffer: &[f32],
    rows: usize,
    cols: usize,
) -> std::io::Result<()> {
    if cols == 0 {
        return Ok(());
    }
    for row in buffer[..rows * cols].chunks_exact(cols) {
        write_line(writer, row)?;
    }
    Ok(())
}

/// Dumps a matrix to `path`. Failures are logged, never returned.
pub fn dump_matrix(path: impl AsRef<Path>, matrix: &Matrix) {
    let path = path.as_ref();
    let result = File::create(path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write_matrix(&mut writer, matrix.as_slice(), matrix.rows(), matrix.cols())?;
        writer.flush()
    });

    match result {
        Ok(()) => info!(path = %path.display(), "output matrix dumped"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not dump output matrix"),
    }
}

/// One benchmark's record for offline analysis.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeReport<'a> {
    pub kernel: &'a str,
    pub sample: &'a TimingSample,
    pub statistics: &'a Statistics,
    pub outcome: Outcome,
}

impl RuntimeReport<'_> {
    /// `<kernel>_runtimes.csv`
    pub fn file_name(&self) -> String {
        format!("{}_runtimes.csv", self.kernel)
    }

    /// Writes the `key,value...` records.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "impl,{}", self.kernel)?;
        writeln!(writer, "num_of_runs,{}", self.sample.len())?;
        write!(writer, "runtimes")?;
        for value in self.sample.values() {
            write!(writer, ", {value}")?;
        }
        writeln!(writer)?;
        writeln!(writer, "avg,{}", self.statistics.mean)?;
        writeln!(writer, "stddev,{}", self.statistics.std_dev)?;
        writeln!(writer, "active,{}", self.statistics.active)?;
        writeln!(writer, "passes,{}", self.statistics.pass_count())?;
        writeln!(writer, "verdict,{}", self.outcome.label())?;
        writeln!(writer, "timestamp,{}", Local::now().to_rfc3339())
    }

    /// Saves the report under `dir`. Returns the path on success; failures
    /// are logged.
    pub fn save(&self, dir: impl AsRef<Path>) -> Option<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        let result = File::create(&path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            self.write_to(&mut writer)?;
            writer.flush()
        });

        match result {
            Ok(()) => {
                info!(path = %path.display(), "runtimes saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not save runtimes");
                None
            }
        }
    }
}
