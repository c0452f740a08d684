//! Preset problem sizes and the file names tied to them.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::{config_error, HarnessError, Result};
use crate::kernel::Dims;

/// One of the preset problem sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatasetSize {
    Testing,
    Small,
    Medium,
    Large,
    Native,
}

impl DatasetSize {
    pub const ALL: [DatasetSize; 5] = [
        DatasetSize::Testing,
        DatasetSize::Small,
        DatasetSize::Medium,
        DatasetSize::Large,
        DatasetSize::Native,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetSize::Testing => "testing",
            DatasetSize::Small => "small",
            DatasetSize::Medium => "medium",
            DatasetSize::Large => "large",
            DatasetSize::Native => "native",
        }
    }

    pub fn dims(&self) -> Dims {
        match self {
            DatasetSize::Testing => Dims::new(16, 12, 8),
            DatasetSize::Small => Dims::new(121, 180, 115),
            DatasetSize::Medium => Dims::new(550, 620, 480),
            DatasetSize::Large => Dims::new(962, 1012, 1221),
            DatasetSize::Native => Dims::new(2500, 3000, 2100),
        }
    }

    /// `<size>_test.csv`: left operand on the first line, right on the second.
    pub fn input_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}_test.csv", self.name()))
    }

    /// `<size>_golden.csv`: the reference product.
    pub fn golden_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}_golden.csv", self.name()))
    }

    /// `<size>_dump.csv`: optional copy of the last kernel output.
    pub fn dump_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}_dump.csv", self.name()))
    }
}

impl fmt::Display for DatasetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DatasetSize {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        <DatasetSize as ValueEnum>::from_str(s, true)
            .map_err(|_| config_error(format!("Unknown \"{s}\" dataset size")))
    }
}
