//! Dense accumulated-cost matrix returned by [`Dtw::align`](crate::Dtw::align).

/// Row-major `n × m` accumulated DTW cost. Cells outside the band are `+∞`.
///
/// Rows index the first sequence and columns the second, in the space the
/// dynamic program ran in: after scaling, and with the first sequence reversed
/// when the reverse trial won.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl CostMatrix {
    pub(crate) fn from_dense(values: Vec<f64>, n_rows: usize, n_cols: usize) -> Self {
        debug_assert_eq!(values.len(), n_rows * n_cols);
        Self {
            values,
            n_rows,
            n_cols,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Accumulated cost at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()` or `j >= n_cols()`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(j < self.n_cols, "column {j} out of bounds");
        self.values[i * self.n_cols + j]
    }

    /// Cost of the bottom-right cell, the unnormalised DTW distance.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Return the row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let m = CostMatrix::from_dense(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 2, 3);
        assert_eq!(m.get(0, 2), 2.0);
        assert_eq!(m.get(1, 0), 3.0);
        assert_eq!(m.total(), 5.0);
    }

    #[test]
    #[should_panic(expected = "column 3 out of bounds")]
    fn column_overflow_panics() {
        let m = CostMatrix::from_dense(vec![0.0; 6], 2, 3);
        let _ = m.get(0, 3);
    }
}
