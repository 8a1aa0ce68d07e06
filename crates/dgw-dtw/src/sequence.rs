//! Multi-dimensional sequence types with NaN padding.
//!
//! A sequence is a row-major `[L × D]` block of `f64`. Trailing rows in which
//! every dimension is NaN are padding; the semantic length is the number of
//! leading non-padded rows.

use crate::error::DtwError;

/// Owned `[L × D]` sequence, possibly carrying trailing NaN padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    values: Vec<f64>,
    ndim: usize,
}

impl Sequence {
    /// Create a sequence from a row-major buffer with `ndim` columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::DimensionMismatch`] | `ndim` is zero or does not divide `values.len()` |
    pub fn new(values: Vec<f64>, ndim: usize) -> Result<Self, DtwError> {
        check_shape(values.len(), ndim)?;
        Ok(Self { values, ndim })
    }

    /// Create a one-dimensional sequence.
    #[must_use]
    pub fn univariate(values: Vec<f64>) -> Self {
        Self { values, ndim: 1 }
    }

    /// Create a sequence from a list of rows, each holding one value per dimension.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySequence`] | `rows` is empty |
    /// | [`DtwError::DimensionMismatch`] | Rows differ in width or are zero-width |
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, DtwError> {
        let ndim = rows.first().map(Vec::len).ok_or(DtwError::EmptySequence)?;
        let mut values = Vec::with_capacity(rows.len() * ndim);
        for row in rows {
            if row.len() != ndim {
                return Err(DtwError::DimensionMismatch {
                    what: "row width",
                    expected: ndim,
                    got: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Self::new(values, ndim)
    }

    /// Borrow this sequence as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> SequenceView<'_> {
        SequenceView::new_unchecked(&self.values, self.ndim)
    }

    /// Number of dimensions per row.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of rows including padding.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.len() / self.ndim
    }

    /// Return row `i` as a slice of `ndim` values.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.ndim..(i + 1) * self.ndim]
    }

    /// Return the raw row-major buffer.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume and return the raw row-major buffer.
    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Return a copy extended with NaN rows up to `n_rows` rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::DimensionMismatch`] | The sequence already has more than `n_rows` rows |
    pub fn padded_to(&self, n_rows: usize) -> Result<Self, DtwError> {
        if n_rows < self.n_rows() {
            return Err(DtwError::DimensionMismatch {
                what: "padded length",
                expected: n_rows,
                got: self.n_rows(),
            });
        }
        let mut values = self.values.clone();
        values.resize(n_rows * self.ndim, f64::NAN);
        Ok(Self {
            values,
            ndim: self.ndim,
        })
    }
}

/// Borrowed view into a sequence. May include trailing padding.
#[derive(Debug, Clone, Copy)]
pub struct SequenceView<'a> {
    values: &'a [f64],
    ndim: usize,
}

impl<'a> SequenceView<'a> {
    /// Create a view over a row-major buffer with `ndim` columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::DimensionMismatch`] | `ndim` is zero or does not divide `values.len()` |
    pub fn new(values: &'a [f64], ndim: usize) -> Result<Self, DtwError> {
        check_shape(values.len(), ndim)?;
        Ok(Self { values, ndim })
    }

    /// Create a view without shape validation. For buffers already checked.
    pub(crate) fn new_unchecked(values: &'a [f64], ndim: usize) -> Self {
        debug_assert!(ndim > 0 && values.len() % ndim == 0);
        Self { values, ndim }
    }

    /// Number of dimensions per row.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of rows including padding.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.len() / self.ndim
    }

    /// Return the underlying row-major slice.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.values
    }

    /// Return row `i` as a slice of `ndim` values.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &'a [f64] {
        &self.values[i * self.ndim..(i + 1) * self.ndim]
    }

    /// Return the prefix up to (not including) the first all-NaN row.
    ///
    /// Every row after the first padding row must be padding as well.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InconsistentPadding`] | A row is partially NaN, or data follows padding |
    pub fn strip_padding(&self) -> Result<SequenceView<'a>, DtwError> {
        let mut end: Option<usize> = None;
        for r in 0..self.n_rows() {
            let n_nan = self.row(r).iter().filter(|v| v.is_nan()).count();
            match (n_nan, end) {
                (0, None) => {}
                (n, None) if n == self.ndim => end = Some(r),
                (n, Some(_)) if n == self.ndim => {}
                _ => return Err(DtwError::InconsistentPadding { row: r }),
            }
        }
        let len = end.unwrap_or_else(|| self.n_rows());
        Ok(Self::new_unchecked(&self.values[..len * self.ndim], self.ndim))
    }

    /// Number of leading non-padded rows.
    ///
    /// # Errors
    ///
    /// Propagates [`DtwError::InconsistentPadding`] from [`strip_padding`][Self::strip_padding].
    pub fn semantic_length(&self) -> Result<usize, DtwError> {
        Ok(self.strip_padding()?.n_rows())
    }

    /// Return a copy with the non-padded prefix reversed and the padding kept in place.
    ///
    /// # Errors
    ///
    /// Propagates [`DtwError::InconsistentPadding`] from [`strip_padding`][Self::strip_padding].
    pub fn reversed(&self) -> Result<Sequence, DtwError> {
        let body = self.strip_padding()?;
        let mut values = Vec::with_capacity(self.values.len());
        for r in (0..body.n_rows()).rev() {
            values.extend_from_slice(body.row(r));
        }
        values.resize(self.values.len(), f64::NAN);
        Ok(Sequence {
            values,
            ndim: self.ndim,
        })
    }

    /// Copy the viewed rows into an owned [`Sequence`].
    #[must_use]
    pub fn to_sequence(&self) -> Sequence {
        Sequence {
            values: self.values.to_vec(),
            ndim: self.ndim,
        }
    }
}

fn check_shape(len: usize, ndim: usize) -> Result<(), DtwError> {
    if ndim == 0 {
        return Err(DtwError::DimensionMismatch {
            what: "sequence dimensionality",
            expected: 1,
            got: 0,
        });
    }
    if len % ndim != 0 {
        return Err(DtwError::DimensionMismatch {
            what: "sequence buffer length",
            expected: len - len % ndim,
            got: len,
        });
    }
    Ok(())
}
