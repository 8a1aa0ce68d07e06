//! Condensed (upper-triangular) distance matrix for pairwise DTW distances.

use std::ops::Index;

use crate::error::DtwError;

/// Symmetric distance matrix stored as a condensed upper-triangular vector.
///
/// For `n` sequences, stores `n*(n-1)/2` distances in the order
/// `(0,1), (0,2), …, (0,n-1), (1,2), …, (n-2,n-1)`. Access is symmetric:
/// `get(i, j) == get(j, i)`. The diagonal is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

/// Number of unique pairs among `n` items.
#[must_use]
pub fn condensed_len(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Rank of pair `(i, j)` with `i < j < n` in the condensed ordering.
#[inline]
#[must_use]
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Inverse of [`condensed_index`]: the pair `(i, j)` at position `rank`.
///
/// # Panics
///
/// Panics if `rank >= condensed_len(n)`.
#[must_use]
pub fn pair_at(n: usize, rank: usize) -> (usize, usize) {
    assert!(rank < condensed_len(n), "pair rank {rank} out of bounds for {n} items");
    let mut i = 0;
    let mut row_start = 0;
    loop {
        let row_len = n - i - 1;
        if rank < row_start + row_len {
            return (i, i + 1 + rank - row_start);
        }
        row_start += row_len;
        i += 1;
    }
}

impl DistanceMatrix {
    /// Wrap a condensed distance vector.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::DimensionMismatch`] | `data.len() != n*(n-1)/2` |
    pub fn from_condensed(n: usize, data: Vec<f64>) -> Result<Self, DtwError> {
        let expected = condensed_len(n);
        if data.len() != expected {
            return Err(DtwError::DimensionMismatch {
                what: "condensed distance vector",
                expected,
                got: data.len(),
            });
        }
        Ok(Self { n, data })
    }

    /// Return the number of sequences in the matrix.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Return true if the matrix is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Return the distance between sequence `i` and sequence `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n` or `j >= n`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n, "row index {i} out of bounds for matrix of size {}", self.n);
        assert!(j < self.n, "column index {j} out of bounds for matrix of size {}", self.n);
        if i == j {
            return 0.0;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.data[condensed_index(self.n, lo, hi)]
    }

    /// Iterate over all unique pairs `(i, j, distance)` with `i < j`, in condensed order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.n;
        (0..n)
            .flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
            .zip(self.data.iter())
            .map(|((i, j), &d)| (i, j, d))
    }

    /// Return all distances from sequence `i` to every sequence, itself included.
    #[must_use]
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.n).map(|j| self.get(i, j)).collect()
    }

    /// Return the condensed vector.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume and return the condensed vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

impl Index<(usize, usize)> for DistanceMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(i != j, "cannot index diagonal, use get() instead");
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        &self.data[condensed_index(self.n, lo, hi)]
    }
}
