//! Warping path types for DTW alignment.

use crate::error::DtwError;
use crate::sequence::{Sequence, SequenceView};

/// A single step in a DTW warping path, mapping index `a` in the first sequence
/// to index `b` in the second sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpingStep {
    /// Index in the first sequence.
    pub a: usize,
    /// Index in the second sequence.
    pub b: usize,
}

/// An ordered sequence of warping steps.
///
/// A forward path runs from `(0, 0)` to `(n-1, m-1)`. When the reverse trial of
/// the kernel wins, the path is expressed in the original index space of the
/// first sequence and runs from `(n-1, 0)` to `(0, m-1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpingPath(Vec<WarpingStep>);

impl WarpingPath {
    pub(crate) fn new(steps: Vec<WarpingStep>) -> Self {
        Self(steps)
    }

    /// Build a path from parallel index arrays, validating every step.
    ///
    /// Each step advances `b` by 0 or 1 and `a` by 0 or 1 in one consistent
    /// direction (increasing for forward paths, decreasing for reversed ones),
    /// and at least one index moves.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InvalidPath`] | Arrays are empty, differ in length, or contain an illegal step |
    pub fn from_indices(a: &[usize], b: &[usize]) -> Result<Self, DtwError> {
        if a.len() != b.len() {
            return Err(DtwError::InvalidPath {
                reason: "index arrays differ in length",
            });
        }
        if a.is_empty() {
            return Err(DtwError::InvalidPath { reason: "path is empty" });
        }
        let steps: Vec<WarpingStep> = a
            .iter()
            .zip(b)
            .map(|(&a, &b)| WarpingStep { a, b })
            .collect();
        let path = Self(steps);
        path.validate_steps()?;
        Ok(path)
    }

    fn validate_steps(&self) -> Result<(), DtwError> {
        let reversed = self.is_reversed();
        for pair in self.0.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let da = if reversed {
                prev.a.checked_sub(next.a)
            } else {
                next.a.checked_sub(prev.a)
            };
            let db = next.b.checked_sub(prev.b);
            match (da, db) {
                (Some(0), Some(1)) | (Some(1), Some(0)) | (Some(1), Some(1)) => {}
                _ => {
                    return Err(DtwError::InvalidPath {
                        reason: "step is not one of (1,0), (0,1), (1,1)",
                    });
                }
            }
        }
        Ok(())
    }

    /// Return the warping steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[WarpingStep] {
        &self.0
    }

    /// Return the number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return true if the path walks the first sequence backwards.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => first.a > last.a,
            _ => false,
        }
    }

    /// Indices into the first sequence, one per step.
    #[must_use]
    pub fn a_indices(&self) -> Vec<usize> {
        self.0.iter().map(|s| s.a).collect()
    }

    /// Indices into the second sequence, one per step.
    #[must_use]
    pub fn b_indices(&self) -> Vec<usize> {
        self.0.iter().map(|s| s.b).collect()
    }

    /// Return true if the path starts and ends on the corners of an
    /// `len_a × len_b` matrix, in the orientation the path was built with.
    #[must_use]
    pub fn spans(&self, len_a: usize, len_b: usize) -> bool {
        let (Some(first), Some(last)) = (self.0.first(), self.0.last()) else {
            return false;
        };
        if len_a == 0 || len_b == 0 {
            return false;
        }
        let (a_start, a_end) = if self.is_reversed() {
            (len_a - 1, 0)
        } else {
            (0, len_a - 1)
        };
        first.a == a_start && first.b == 0 && last.a == a_end && last.b == len_b - 1
    }

    /// Project `sequence` (the first side of the path) onto the index space of
    /// the second side.
    ///
    /// Row `j` of the result is the mean of every row of `sequence` aligned to
    /// index `j`. The result has `target_len` rows and no padding.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InvalidPath`] | A step indexes outside `sequence` or `target_len`, or an index in `0..target_len` is never visited |
    /// | [`DtwError::InconsistentPadding`] | `sequence` is malformed |
    pub fn project(&self, sequence: SequenceView<'_>, target_len: usize) -> Result<Sequence, DtwError> {
        let body = sequence.strip_padding()?;
        let ndim = body.ndim();
        let mut sums = vec![0.0; target_len * ndim];
        let mut counts = vec![0usize; target_len];

        for step in &self.0 {
            if step.a >= body.n_rows() || step.b >= target_len {
                return Err(DtwError::InvalidPath {
                    reason: "step indexes outside the sequences",
                });
            }
            counts[step.b] += 1;
            let dst = &mut sums[step.b * ndim..(step.b + 1) * ndim];
            for (d, &v) in dst.iter_mut().zip(body.row(step.a)) {
                *d += v;
            }
        }

        for (row, &count) in sums.chunks_exact_mut(ndim).zip(&counts) {
            if count == 0 {
                return Err(DtwError::InvalidPath {
                    reason: "path does not cover every target index",
                });
            }
            for v in row {
                *v /= count as f64;
            }
        }
        Sequence::new(sums, ndim)
    }
}

impl<'a> IntoIterator for &'a WarpingPath {
    type Item = &'a WarpingStep;
    type IntoIter = std::slice::Iter<'a, WarpingStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
