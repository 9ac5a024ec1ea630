//! Fixed-shape spectrogram matrix

use crate::error::{Result, SpectroError};
use ndarray::{Array2, ArrayView1};

/// Time x frequency magnitudes
///
/// Rows are analysis frames, columns are frequency bins. The shape is fixed at
/// construction; rows that were never written stay zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramMatrix {
    data: Array2<f64>,
    filled_rows: usize,
}

impl SpectrogramMatrix {
    /// Zero-filled matrix of `rows x cols`
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            filled_rows: 0,
        }
    }

    /// Wrap existing values; every row counts as filled
    pub fn from_array(data: Array2<f64>) -> Self {
        let filled_rows = data.nrows();
        Self { data, filled_rows }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Rows written so far (highest written row + 1)
    pub fn filled_rows(&self) -> usize {
        self.filled_rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn row(&self, row: usize) -> Option<ArrayView1<'_, f64>> {
        (row < self.rows()).then(|| self.data.row(row))
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Largest value, or 0 for an empty or all-zero matrix
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// Overwrite one row
    ///
    /// Fails with `OverrunGuard`, leaving the matrix untouched, when `row` is
    /// past the last row or `values` does not match the column count.
    pub fn write_row(&mut self, row: usize, values: &[f64]) -> Result<()> {
        if row >= self.rows() || values.len() != self.cols() {
            return Err(SpectroError::OverrunGuard {
                row,
                len: values.len(),
                rows: self.rows(),
                cols: self.cols(),
            });
        }

        for (cell, &v) in self.data.row_mut(row).iter_mut().zip(values) {
            *cell = v;
        }
        self.filled_rows = self.filled_rows.max(row + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_matrix_is_zeroed() {
        let m = SpectrogramMatrix::new(3, 4);
        assert_eq!((m.rows(), m.cols()), (3, 4));
        assert_eq!(m.filled_rows(), 0);
        assert!(m.as_array().iter().all(|&v| v == 0.0));
        assert_eq!(m.max_value(), 0.0);
    }

    #[test]
    fn test_write_row() {
        let mut m = SpectrogramMatrix::new(2, 2);
        m.write_row(1, &[3.0, 9.0]).unwrap();
        assert_eq!(m.get(1, 1), Some(9.0));
        assert_eq!(m.get(0, 0), Some(0.0));
        assert_eq!(m.filled_rows(), 2);
        assert_eq!(m.max_value(), 9.0);
    }

    #[test]
    fn test_write_past_last_row_is_guarded() {
        let mut m = SpectrogramMatrix::new(2, 2);
        let err = m.write_row(2, &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, SpectroError::OverrunGuard { row: 2, rows: 2, .. }));
        assert_eq!(m.filled_rows(), 0);
    }

    #[test]
    fn test_write_wrong_width_is_guarded() {
        let mut m = SpectrogramMatrix::new(2, 2);
        assert!(m.write_row(0, &[1.0, 2.0, 3.0]).is_err());
        assert!(m.as_array().iter().all(|&v| v == 0.0));
    }
}
