//! Band constraint types for DTW computation.

use std::fmt;
use std::ops::Range;

use crate::error::DtwError;

/// Constraint on the DTW warping window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BandConstraint {
    /// No constraint: the full cost matrix is computed.
    #[default]
    Unconstrained,

    /// Slanted band of width `k`: cell `(i, j)` of an `n × m` alignment is
    /// admitted when `|i/n - j/m| <= k / max(n, m)`.
    ///
    /// For equal lengths this is the Sakoe-Chiba band `|i - j| <= k`; `k = 0`
    /// degenerates to the pure diagonal. For unequal lengths a narrow band can
    /// exclude the last cell, in which case no warping path exists.
    SlantedBand(usize),
}

impl BandConstraint {
    /// Build a slanted band from a signed width, as read from user input.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InvalidConstraint`] | `k` is negative |
    pub fn slanted_band(k: i64) -> Result<Self, DtwError> {
        usize::try_from(k)
            .map(Self::SlantedBand)
            .map_err(|_| DtwError::InvalidConstraint { k })
    }

    /// Return the admitted columns of `row` in an `n_rows × n_cols` cost matrix.
    ///
    /// The slanted rule is evaluated exactly in integers as
    /// `|i·m - j·n| · max(n, m) <= k·n·m`. The admitted set of a row is always
    /// contiguous but may be empty; empty matrices yield an empty range.
    #[must_use]
    pub fn column_range(&self, row: usize, n_rows: usize, n_cols: usize) -> Range<usize> {
        if n_rows == 0 || n_cols == 0 {
            return 0..0;
        }
        let k = match self {
            Self::Unconstrained => return 0..n_cols,
            Self::SlantedBand(k) => *k as u128,
        };
        let (i, n, m) = (row as u128, n_rows as u128, n_cols as u128);
        let longer = n.max(m);
        let slack = k.saturating_mul(n * m);
        let centre = i * m * longer;
        let step = n * longer;

        // j·n·L in [centre - slack, centre + slack]
        let lo = centre.saturating_sub(slack).div_ceil(step);
        let hi = centre.saturating_add(slack) / step;
        let lo = usize::try_from(lo).map_or(n_cols, |lo| lo.min(n_cols));
        let end = usize::try_from(hi).map_or(n_cols, |hi| hi.saturating_add(1).min(n_cols));
        lo..end.max(lo)
    }

    /// Return the widest column range across all rows of an `n × m` matrix.
    #[must_use]
    pub fn band_width(&self, n: usize, m: usize) -> usize {
        match self {
            Self::Unconstrained if n > 0 => m,
            _ => (0..n)
                .map(|i| self.column_range(i, n, m).len())
                .max()
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for BandConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconstrained => f.write_str("none"),
            Self::SlantedBand(k) => write!(f, "slanted_band({k})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(c: BandConstraint, n: usize, m: usize) -> Vec<(usize, usize)> {
        (0..n)
            .flat_map(|i| c.column_range(i, n, m).map(move |j| (i, j)))
            .collect()
    }

    #[test]
    fn unconstrained_full_range() {
        let c = BandConstraint::Unconstrained;
        assert_eq!(c.column_range(0, 10, 10), 0..10);
        assert_eq!(c.column_range(5, 10, 7), 0..7);
    }

    #[test]
    fn zero_band_equal_lengths_is_diagonal() {
        let c = BandConstraint::SlantedBand(0);
        for i in 0..7 {
            assert_eq!(c.column_range(i, 7, 7), i..i + 1);
        }
    }

    #[test]
    fn equal_lengths_match_sakoe_chiba() {
        let c = BandConstraint::SlantedBand(2);
        assert_eq!(c.column_range(5, 10, 10), 3..8);
        assert_eq!(c.column_range(0, 10, 10), 0..3);
        assert_eq!(c.column_range(9, 10, 10), 7..10);
    }

    #[test]
    fn wide_matrix_zero_band_keeps_exact_diagonal_cells() {
        let c = BandConstraint::SlantedBand(0);
        // 2 rows, 4 columns: only (0, 0) and (1, 2) lie on i/2 == j/4.
        assert_eq!(c.column_range(0, 2, 4), 0..1);
        assert_eq!(c.column_range(1, 2, 4), 2..3);
    }

    #[test]
    fn unequal_lengths_follow_normalised_distance_rule() {
        for k in 0..4usize {
            let c = BandConstraint::SlantedBand(k);
            for (n, m) in [(3, 8), (8, 3), (5, 3), (2, 9), (4, 7), (7, 12), (1, 5)] {
                let longer = n.max(m) as f64;
                let expected: Vec<(usize, usize)> = (0..n)
                    .flat_map(|i| (0..m).map(move |j| (i, j)))
                    .filter(|&(i, j)| {
                        let gap = (i as f64 / n as f64 - j as f64 / m as f64).abs();
                        gap <= k as f64 / longer + 1e-12
                    })
                    .collect();
                assert_eq!(cells(c, n, m), expected, "k={k}, n={n}, m={m}");
            }
        }
    }

    #[test]
    fn narrow_band_rows_match_hand_enumeration() {
        let c = BandConstraint::SlantedBand(2);
        assert_eq!(c.column_range(0, 3, 8), 0..3);
        assert_eq!(c.column_range(1, 3, 8), 1..5);
        assert_eq!(c.column_range(2, 3, 8), 4..8);

        let c = BandConstraint::SlantedBand(1);
        let rows: Vec<_> = (0..5).map(|i| c.column_range(i, 5, 3)).collect();
        assert_eq!(rows, [0..1, 0..2, 1..2, 2..3, 2..3]);
    }

    #[test]
    fn band_is_symmetric_under_transpose() {
        for k in 0..3 {
            let c = BandConstraint::SlantedBand(k);
            for (n, m) in [(3, 7), (5, 8), (4, 4), (2, 9)] {
                let wide = cells(c, n, m);
                let mut tall: Vec<(usize, usize)> =
                    cells(c, m, n).into_iter().map(|(i, j)| (j, i)).collect();
                tall.sort_unstable();
                assert_eq!(wide, tall, "k={k}, n={n}, m={m}");
            }
        }
    }

    #[test]
    fn equal_lengths_connect_corners() {
        for k in 0..3 {
            let c = BandConstraint::SlantedBand(k);
            for n in [1, 4, 9] {
                assert_eq!(c.column_range(0, n, n).start, 0);
                assert_eq!(c.column_range(n - 1, n, n).end, n);
            }
        }
    }

    #[test]
    fn zero_band_excludes_corner_of_unequal_lengths() {
        let c = BandConstraint::SlantedBand(0);
        assert!(!c.column_range(1, 2, 4).contains(&3));
        assert!(c.column_range(2, 3, 8).is_empty());
    }

    #[test]
    fn empty_dimensions_give_empty_ranges() {
        for c in [BandConstraint::Unconstrained, BandConstraint::SlantedBand(2)] {
            assert!(c.column_range(0, 0, 5).is_empty());
            assert!(c.column_range(0, 5, 0).is_empty());
            assert_eq!(c.band_width(0, 5), 0);
        }
    }

    #[test]
    fn band_width_zero_band() {
        assert_eq!(BandConstraint::SlantedBand(0).band_width(5, 5), 1);
        assert_eq!(BandConstraint::Unconstrained.band_width(5, 9), 9);
    }

    #[test]
    fn negative_width_rejected() {
        assert_eq!(
            BandConstraint::slanted_band(-1).unwrap_err(),
            DtwError::InvalidConstraint { k: -1 }
        );
        assert_eq!(
            BandConstraint::slanted_band(3).unwrap(),
            BandConstraint::SlantedBand(3)
        );
    }

    #[test]
    fn default_is_unconstrained() {
        assert_eq!(BandConstraint::default(), BandConstraint::Unconstrained);
    }
}
