//! Dense row-major matrices and the guarded output buffer kernels write into.
//!
//! Element `(i, j)` of an `rows x cols` matrix lives at offset `i * cols + j`.
//!
//! [`GuardedMatrix`] owns one extra region past the logical output: [`GUARD_LEN`]
//! slots filled with the [`GUARD_SENTINEL`] bit pattern. Kernels are handed the
//! logical region only, through bounds-checked slices, so a correct kernel cannot
//! reach the guard. The sentinel stays as a second line of detection for kernels
//! that go through [`GuardedMatrix::physical_mut`].

use crate::error::{shape_error, Result};
use crate::verify::check_guard;

/// Number of sentinel slots appended after the logical output region.
pub const GUARD_LEN: usize = 4;

/// Bit pattern stored in every guard slot.
pub const GUARD_SENTINEL: u32 = 0xDEAD_CAFE;

/// Calculates the 1D index for a 2D element in row-major order.
///
/// # Arguments
///
/// * `i` - Row index.
/// * `j` - Column index.
/// * `ld` - Leading dimension (number of columns for row-major).
#[inline(always)]
pub(crate) fn at(i: usize, j: usize, ld: usize) -> usize {
    i * ld + j
}

/// A dense, row-major `f32` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Creates a `rows x cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// Fails with a shape error if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(shape_error(
                rows * cols,
                data.len(),
                format!("buffer does not hold a {rows}x{cols} matrix"),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix by evaluating `f(i, j)` for every element.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Square identity matrix.
    pub fn identity(size: usize) -> Self {
        Self::from_fn(size, size, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of logical elements (`rows * cols`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[at(i, j, self.cols)]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// Output matrix with a trailing sentinel region for out-of-bounds detection.
///
/// The physical buffer is `rows * cols + GUARD_LEN` long. Only the first
/// `rows * cols` elements are the matrix; the rest must keep the sentinel
/// pattern written at construction.
#[derive(Debug, Clone)]
pub struct GuardedMatrix {
    rows: usize,
    cols: usize,
    buffer: Vec<f32>,
}

impl GuardedMatrix {
    /// Allocates a zeroed `rows x cols` output followed by the sentinel guard.
    pub fn new(rows: usize, cols: usize) -> Self {
        let logical = rows * cols;
        let mut buffer = vec![0.0; logical + GUARD_LEN];
        buffer[logical..].fill(f32::from_bits(GUARD_SENTINEL));
        Self { rows, cols, buffer }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of logical elements (`rows * cols`).
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the first guard slot inside the physical buffer.
    pub fn guard_offset(&self) -> usize {
        self.len()
    }

    /// The logical output region.
    pub fn as_slice(&self) -> &[f32] {
        &self.buffer[..self.len()]
    }

    /// The logical output region, writable. Kernels receive this slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        let len = self.len();
        &mut self.buffer[..len]
    }

    /// The whole physical buffer, guard included.
    ///
    /// Exists so fixtures can model a kernel that overruns its output.
    /// Nothing in the measurement path writes through it.
    pub fn physical_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    /// The whole physical buffer, guard included.
    pub fn physical(&self) -> &[f32] {
        &self.buffer
    }

    /// Whether every guard slot still holds the sentinel pattern.
    pub fn guard_intact(&self) -> bool {
        check_guard(&self.buffer, self.guard_offset(), GUARD_LEN, GUARD_SENTINEL)
    }

    /// Copies the logical region into a plain [`Matrix`].
    pub fn to_matrix(&self) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.as_slice().to_vec(),
        }
    }
}
