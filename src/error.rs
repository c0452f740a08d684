//! Error types for matbench operations.
//!
//! Configuration and I/O errors are raised at the boundary and end the run
//! before any measurement. Measurement degeneracy is raised by the statistics
//! engine. Correctness failures are *not* errors: they travel alongside the
//! timing numbers as a [`crate::verify::Outcome`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing or running a benchmark.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Missing or invalid run configuration (unknown kernel, zero tile size, ...).
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },
    /// A file could not be opened, read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file the operation was performed on.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A token in a numeric text file is not a number.
    #[error("Parse error in {} at value {index}: {message}", path.display())]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// Zero-based index of the offending value within the matrix.
        index: usize,
        /// Human-readable error message.
        message: String,
    },
    /// A numeric text file ran out before the matrix was filled.
    #[error("Truncated data in {}: expected {expected} values, found {found}", path.display())]
    Truncated {
        /// The file being parsed.
        path: PathBuf,
        /// Number of values the matrix needs.
        expected: usize,
        /// Number of values actually read.
        found: usize,
    },
    /// A buffer does not match the dimensions it is declared with.
    #[error("Shape error: {message} (expected {expected} elements, got {actual})")]
    Shape {
        /// Number of elements implied by the dimensions.
        expected: usize,
        /// Number of elements supplied.
        actual: usize,
        /// Human-readable error message.
        message: String,
    },
    /// The statistics engine has no active samples left to average.
    #[error("Degenerate measurement: {message} ({samples} samples collected)")]
    DegenerateSample {
        /// Size of the raw timing sample.
        samples: usize,
        /// Human-readable error message.
        message: String,
    },
    /// The worker pool for a parallel kernel could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for matbench operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Creates a configuration error.
pub fn config_error(message: impl Into<String>) -> HarnessError {
    HarnessError::Config {
        message: message.into(),
    }
}

/// Creates an I/O error bound to the file it happened on.
pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> HarnessError {
    HarnessError::Io {
        path: path.into(),
        source,
    }
}

/// Creates a shape error.
pub fn shape_error(expected: usize, actual: usize, message: impl Into<String>) -> HarnessError {
    HarnessError::Shape {
        expected,
        actual,
        message: message.into(),
    }
}

/// Creates a measurement degeneracy error.
pub fn degenerate_error(samples: usize, message: impl Into<String>) -> HarnessError {
    HarnessError::DegenerateSample {
        samples,
        message: message.into(),
    }
}
