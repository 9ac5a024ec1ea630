//! Range normalization and noise floor
//!
//! With `step = max / INT_MAX_RANGE`, each cell quantizes to `cell / step`,
//! truncated. The matrix maximum maps to [`INT_MAX_RANGE`] and cells that land
//! below [`NOISE_FLOOR`] are zeroed.

use crate::engine::SpectrogramMatrix;
use tracing::debug;

/// Largest quantized value (`i32::MAX`)
pub const INT_MAX_RANGE: u32 = i32::MAX as u32;

/// Quantized values below this are forced to zero (1/1500 of the range)
pub const NOISE_FLOOR: u32 = INT_MAX_RANGE / 1500;

/// Integer grid ready for persistence
///
/// `x` is the time axis (matrix row), `y` the frequency axis (matrix column).
/// Values are stored row-major by `y`, i.e. in image scanline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedGrid {
    width: usize,
    height: usize,
    values: Vec<u32>,
}

impl QuantizedGrid {
    /// Grid from scanline-ordered values; `None` if the length does not match
    pub fn from_values(width: usize, height: usize, values: Vec<u32>) -> Option<Self> {
        (values.len() == width * height).then_some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.values[y * self.width + x])
    }

    /// Scanline-ordered values
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0)
    }
}

/// Quantize one cell of a matrix whose maximum is `max`
///
/// Evaluated as `cell / max * INT_MAX_RANGE` so the maximum lands exactly on
/// the top of the range.
fn quantize_cell(cell: f64, max: f64) -> u32 {
    let scaled = cell / max * INT_MAX_RANGE as f64;
    // `as` saturates and maps NaN to 0
    let q = scaled.min(INT_MAX_RANGE as f64) as u32;
    if q < NOISE_FLOOR {
        0
    } else {
        q
    }
}

/// Normalize a matrix into a quantized grid
///
/// An all-zero matrix quantizes to an all-zero grid.
pub fn quantize(matrix: &SpectrogramMatrix) -> QuantizedGrid {
    let max = matrix.max_value();
    debug!(max_value = max, "Quantizing spectrogram");

    let width = matrix.rows();
    let height = matrix.cols();
    let mut values = vec![0u32; width * height];

    if max > 0.0 && max.is_finite() {
        for ((x, y), &cell) in matrix.as_array().indexed_iter() {
            values[y * width + x] = quantize_cell(cell, max);
        }
    }

    QuantizedGrid {
        width,
        height,
        values,
    }
}
