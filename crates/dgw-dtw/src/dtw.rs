//! DTW distance computation.

use tracing::instrument;

use crate::constraint::BandConstraint;
use crate::cost::CostMatrix;
use crate::distance::DtwDistance;
use crate::error::DtwError;
use crate::metric::Metric;
use crate::path::{WarpingPath, WarpingStep};
use crate::scaling::{ScaledSequence, uniform_scale_to};
use crate::sequence::SequenceView;

const DIAG: u8 = 0;
const UP: u8 = 1;
const LEFT: u8 = 2;

/// Immutable DTW configuration. Thread-safe and copyable.
///
/// The defaults are the squared Euclidean metric, no band, no warping penalty,
/// no pre-scaling, the reverse trial enabled and length normalisation enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dtw {
    metric: Metric,
    constraint: BandConstraint,
    warping_penalty: f64,
    scale_first: bool,
    try_reverse: bool,
    normalise: bool,
}

impl Default for Dtw {
    fn default() -> Self {
        Self::new(Metric::default())
    }
}

/// Full result of [`Dtw::align`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Final (optionally normalised) distance.
    pub distance: DtwDistance,
    /// Accumulated cost matrix of the winning orientation.
    pub cost: CostMatrix,
    /// Optimal warping path in the original index space of both inputs.
    pub path: WarpingPath,
    /// True when the reverse trial produced the result.
    pub reversed: bool,
}

/// One operand after padding removal and optional up-scaling.
enum Operand<'a> {
    Raw(SequenceView<'a>),
    Scaled(ScaledSequence),
}

impl Operand<'_> {
    fn view(&self) -> SequenceView<'_> {
        match self {
            Self::Raw(v) => *v,
            Self::Scaled(s) => s.sequence.as_view(),
        }
    }

    fn original_index(&self, i: usize) -> usize {
        match self {
            Self::Raw(_) => i,
            Self::Scaled(s) => s.path[i],
        }
    }
}

struct Prepared<'a> {
    a: Operand<'a>,
    b: Operand<'a>,
    /// `max(|A|, |B|)` before scaling.
    norm_len: usize,
}

/// Banded accumulated-cost table with traceback directions.
///
/// Cell `(i, j)` lives at `i * bw + (j - starts[i])`.
struct BandedTable {
    n: usize,
    m: usize,
    bw: usize,
    starts: Vec<usize>,
    ends: Vec<usize>,
    cost: Vec<f64>,
    dirs: Vec<u8>,
}

impl BandedTable {
    fn at(&self, i: usize, j: usize) -> f64 {
        if j < self.starts[i] || j >= self.ends[i] {
            return f64::INFINITY;
        }
        self.cost[i * self.bw + j - self.starts[i]]
    }

    fn total(&self) -> f64 {
        self.at(self.n - 1, self.m - 1)
    }

    /// Walk the direction bytes back from the last cell.
    ///
    /// Fails when the last cell is unreachable or a step would leave the band.
    fn traceback(&self) -> Result<Vec<WarpingStep>, DtwError> {
        let unreachable = DtwError::NoAdmissiblePath {
            len_a: self.n,
            len_b: self.m,
        };
        if !self.total().is_finite() {
            return Err(unreachable);
        }
        let mut path = Vec::with_capacity(self.n + self.m);
        let (mut i, mut j) = (self.n - 1, self.m - 1);
        loop {
            path.push(WarpingStep { a: i, b: j });
            if i == 0 && j == 0 {
                break;
            }
            let (pi, pj) = match self.dirs[i * self.bw + j - self.starts[i]] {
                DIAG if i > 0 && j > 0 => (i - 1, j - 1),
                UP if i > 0 => (i - 1, j),
                LEFT if j > 0 => (i, j - 1),
                _ => return Err(unreachable),
            };
            if pj < self.starts[pi] || pj >= self.ends[pi] {
                return Err(unreachable);
            }
            (i, j) = (pi, pj);
        }
        path.reverse();
        Ok(path)
    }

    fn into_cost_matrix(self) -> CostMatrix {
        let mut dense = vec![f64::INFINITY; self.n * self.m];
        for i in 0..self.n {
            let (start, end) = (self.starts[i], self.ends[i]);
            let row = &self.cost[i * self.bw..i * self.bw + (end - start)];
            dense[i * self.m + start..i * self.m + end].copy_from_slice(row);
        }
        CostMatrix::from_dense(dense, self.n, self.m)
    }
}

impl Dtw {
    /// Create a DTW calculator with the given metric and default options.
    #[must_use]
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            constraint: BandConstraint::Unconstrained,
            warping_penalty: 0.0,
            scale_first: false,
            try_reverse: true,
            normalise: true,
        }
    }

    /// Set the band constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: BandConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Set the penalty added to every non-diagonal step.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InvalidWarpingPenalty`] | `penalty` is negative, NaN or infinite |
    pub fn with_warping_penalty(mut self, penalty: f64) -> Result<Self, DtwError> {
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(DtwError::InvalidWarpingPenalty { value: penalty });
        }
        self.warping_penalty = penalty;
        Ok(self)
    }

    /// Scale the shorter sequence up to the longer one before aligning.
    #[must_use]
    pub fn with_scale_first(mut self, scale_first: bool) -> Self {
        self.scale_first = scale_first;
        self
    }

    /// Also align the reversed first sequence and keep the cheaper result.
    #[must_use]
    pub fn with_try_reverse(mut self, try_reverse: bool) -> Self {
        self.try_reverse = try_reverse;
        self
    }

    /// Divide the final distance by `max(|A|, |B|)`.
    #[must_use]
    pub fn with_normalise(mut self, normalise: bool) -> Self {
        self.normalise = normalise;
        self
    }

    /// Return the local cost metric.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Return the band constraint configuration.
    #[must_use]
    pub fn constraint(&self) -> BandConstraint {
        self.constraint
    }

    /// Return the warping penalty.
    #[must_use]
    pub fn warping_penalty(&self) -> f64 {
        self.warping_penalty
    }

    /// Return whether the shorter sequence is scaled up first.
    #[must_use]
    pub fn scale_first(&self) -> bool {
        self.scale_first
    }

    /// Return whether the reverse orientation is tried.
    #[must_use]
    pub fn try_reverse(&self) -> bool {
        self.try_reverse
    }

    /// Return whether distances are length-normalised.
    #[must_use]
    pub fn normalise(&self) -> bool {
        self.normalise
    }

    /// Compute the DTW distance between two padded sequences.
    ///
    /// Uses a rolling two-row buffer rather than the full cost matrix. The
    /// result is bit-identical to the distance returned by [`align`][Dtw::align].
    /// When the band admits no path between the corners the distance is `+∞`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySequence`] | Either input has no non-padded rows |
    /// | [`DtwError::DimensionMismatch`] | Inputs differ in dimensionality |
    /// | [`DtwError::InconsistentPadding`] | Either input is malformed |
    #[instrument(level = "trace", skip(a, b))]
    pub fn distance(&self, a: SequenceView<'_>, b: SequenceView<'_>) -> Result<DtwDistance, DtwError> {
        let prepared = self.prepare(a, b)?;
        let (av, bv) = (prepared.a.view(), prepared.b.view());

        let mut best = self.accumulate_rolling(av, bv);
        if self.try_reverse {
            let reversed = av.reversed()?;
            let candidate = self.accumulate_rolling(reversed.as_view(), bv);
            if candidate < best {
                best = candidate;
            }
        }
        Ok(self.finish(best, prepared.norm_len))
    }

    /// Compute the DTW distance and optimal warping path between two sequences.
    ///
    /// # Errors
    ///
    /// Same as [`align`][Dtw::align].
    #[instrument(level = "trace", skip(a, b))]
    pub fn distance_and_path(
        &self,
        a: SequenceView<'_>,
        b: SequenceView<'_>,
    ) -> Result<(DtwDistance, WarpingPath), DtwError> {
        let alignment = self.align(a, b)?;
        Ok((alignment.distance, alignment.path))
    }

    /// Compute the distance, the accumulated cost matrix and the warping path.
    ///
    /// Allocates the banded cost table and a direction array for traceback.
    /// Runs in O(n * bw) time and space.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::EmptySequence`] | Either input has no non-padded rows |
    /// | [`DtwError::DimensionMismatch`] | Inputs differ in dimensionality |
    /// | [`DtwError::InconsistentPadding`] | Either input is malformed |
    /// | [`DtwError::NoAdmissiblePath`] | No orientation has a finite path inside the band |
    #[instrument(level = "trace", skip(a, b))]
    pub fn align(&self, a: SequenceView<'_>, b: SequenceView<'_>) -> Result<Alignment, DtwError> {
        let prepared = self.prepare(a, b)?;
        let (av, bv) = (prepared.a.view(), prepared.b.view());

        let mut table = self.accumulate_full(av, bv);
        let mut reversed = false;
        if self.try_reverse {
            let flipped = av.reversed()?;
            let candidate = self.accumulate_full(flipped.as_view(), bv);
            if candidate.total() < table.total() {
                table = candidate;
                reversed = true;
            }
        }

        let steps = table.traceback()?;
        let path = remap_path(&steps, &prepared, av.n_rows(), reversed);
        let distance = self.finish(table.total(), prepared.norm_len);

        Ok(Alignment {
            distance,
            cost: table.into_cost_matrix(),
            path,
            reversed,
        })
    }

    fn prepare<'a>(&self, a: SequenceView<'a>, b: SequenceView<'a>) -> Result<Prepared<'a>, DtwError> {
        let a = a.strip_padding()?;
        let b = b.strip_padding()?;
        if a.n_rows() == 0 || b.n_rows() == 0 {
            return Err(DtwError::EmptySequence);
        }
        if a.ndim() != b.ndim() {
            return Err(DtwError::DimensionMismatch {
                what: "sequence dimensionality",
                expected: a.ndim(),
                got: b.ndim(),
            });
        }

        let (len_a, len_b) = (a.n_rows(), b.n_rows());
        let norm_len = len_a.max(len_b);
        let (a, b) = if self.scale_first && len_a < len_b {
            (Operand::Scaled(uniform_scale_to(a, len_b)?), Operand::Raw(b))
        } else if self.scale_first && len_b < len_a {
            (Operand::Raw(a), Operand::Scaled(uniform_scale_to(b, len_a)?))
        } else {
            (Operand::Raw(a), Operand::Raw(b))
        };
        Ok(Prepared { a, b, norm_len })
    }

    fn finish(&self, total: f64, norm_len: usize) -> DtwDistance {
        DtwDistance::from_accumulated(total, self.normalise.then_some(norm_len))
    }

    /// Rolling two-row DTW. Computes only the accumulated cost at `(n-1, m-1)`.
    ///
    /// Each buffer holds the band of one row; `prev_start..prev_end` is the
    /// column range stored in `prev`. Out-of-band reads yield `+∞`.
    fn accumulate_rolling(&self, a: SequenceView<'_>, b: SequenceView<'_>) -> f64 {
        let n = a.n_rows();
        let m = b.n_rows();
        let bw = self.constraint.band_width(n, m);
        let penalty = self.warping_penalty;

        let mut prev = vec![f64::INFINITY; bw];
        let mut curr = vec![f64::INFINITY; bw];
        let (mut prev_start, mut prev_end) = (0usize, 0usize);

        for i in 0..n {
            let range = self.constraint.column_range(i, n, m);
            let start = range.start;

            for j in range.clone() {
                let c = self.metric.cost(a.row(i), b.row(j));
                let local = j - start;

                if i == 0 && j == 0 {
                    curr[local] = c;
                    continue;
                }

                let left = if j > start { curr[local - 1] } else { f64::INFINITY };
                let up = if j >= prev_start && j < prev_end {
                    prev[j - prev_start]
                } else {
                    f64::INFINITY
                };
                let diag = if j > prev_start && j <= prev_end {
                    prev[j - 1 - prev_start]
                } else {
                    f64::INFINITY
                };

                curr[local] = c + diag.min(up + penalty).min(left + penalty);
            }

            prev_start = start;
            prev_end = range.end;
            std::mem::swap(&mut prev, &mut curr);
        }

        // After the final swap `prev` holds the last row.
        if (prev_start..prev_end).contains(&(m - 1)) {
            prev[m - 1 - prev_start]
        } else {
            f64::INFINITY
        }
    }

    /// Full banded DTW that keeps every row and a direction byte per cell.
    ///
    /// Ties prefer the diagonal. A tie between the two off-diagonal moves steps
    /// toward the `i = j` line: it decrements the larger index, and `i` when
    /// both are equal.
    fn accumulate_full(&self, a: SequenceView<'_>, b: SequenceView<'_>) -> BandedTable {
        let n = a.n_rows();
        let m = b.n_rows();
        let bw = self.constraint.band_width(n, m);
        let penalty = self.warping_penalty;

        let mut starts = Vec::with_capacity(n);
        let mut ends = Vec::with_capacity(n);
        for i in 0..n {
            let range = self.constraint.column_range(i, n, m);
            starts.push(range.start);
            ends.push(range.end);
        }

        let mut table = BandedTable {
            n,
            m,
            bw,
            starts,
            ends,
            cost: vec![f64::INFINITY; n * bw],
            dirs: vec![DIAG; n * bw],
        };

        for i in 0..n {
            let (start, end) = (table.starts[i], table.ends[i]);
            for j in start..end {
                let c = self.metric.cost(a.row(i), b.row(j));
                let idx = i * bw + j - start;

                if i == 0 && j == 0 {
                    table.cost[idx] = c;
                    continue;
                }

                let left = if j > start { table.cost[idx - 1] } else { f64::INFINITY };
                let (up, diag) = if i > 0 {
                    let up = table.at(i - 1, j);
                    let diag = if j > 0 { table.at(i - 1, j - 1) } else { f64::INFINITY };
                    (up, diag)
                } else {
                    (f64::INFINITY, f64::INFINITY)
                };
                let up = up + penalty;
                let left = left + penalty;

                let (best, dir) = if diag <= up && diag <= left {
                    (diag, DIAG)
                } else if up < left {
                    (up, UP)
                } else if left < up {
                    (left, LEFT)
                } else if i >= j {
                    (up, UP)
                } else {
                    (left, LEFT)
                };

                table.cost[idx] = c + best;
                table.dirs[idx] = dir;
            }
        }

        table
    }
}

/// Map a traceback path from the DP index space back to the caller's inputs.
///
/// Undoes the reversal of the first sequence, then the scaling of either
/// sequence. Scaling can map neighbouring steps onto the same cell; such
/// repeats are dropped.
fn remap_path(steps: &[WarpingStep], prepared: &Prepared<'_>, n_dp: usize, reversed: bool) -> WarpingPath {
    let mut out: Vec<WarpingStep> = Vec::with_capacity(steps.len());
    for step in steps {
        let a = if reversed { n_dp - 1 - step.a } else { step.a };
        let mapped = WarpingStep {
            a: prepared.a.original_index(a),
            b: prepared.b.original_index(step.b),
        };
        if out.last() != Some(&mapped) {
            out.push(mapped);
        }
    }
    WarpingPath::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    fn seq(values: &[f64]) -> Sequence {
        Sequence::univariate(values.to_vec())
    }

    fn plain() -> Dtw {
        Dtw::new(Metric::SqEuclidean)
            .with_try_reverse(false)
            .with_normalise(false)
    }

    #[test]
    fn identical_sequences_distance_zero() {
        let s = seq(&[1.0, 2.0, 3.0]);
        let d = plain().distance(s.as_view(), s.as_view()).unwrap();
        assert_eq!(d.value(), 0.0);
    }

    #[test]
    fn hand_computed_2x2() {
        // C[0][0] = 1, C[0][1] = 1, C[1][0] = 1, C[1][1] = 1 + 1 = 2
        let a = seq(&[0.0, 1.0]);
        let b = seq(&[1.0, 0.0]);
        let d = plain().distance(a.as_view(), b.as_view()).unwrap();
        assert_eq!(d.value(), 2.0);
    }

    #[test]
    fn single_element_sequences() {
        let a = seq(&[5.0]);
        let b = seq(&[3.0]);
        let d = plain().distance(a.as_view(), b.as_view()).unwrap();
        assert_eq!(d.value(), 4.0);
    }

    #[test]
    fn rolling_matches_full_table() {
        let a = seq(&[1.0, 3.0, 5.0, 2.0, 0.5]);
        let b = seq(&[2.0, 4.0, 1.0]);
        for dtw in [
            plain(),
            plain().with_constraint(BandConstraint::SlantedBand(1)),
            plain().with_warping_penalty(0.7).unwrap(),
            plain().with_try_reverse(true).with_normalise(true),
        ] {
            let d = dtw.distance(a.as_view(), b.as_view()).unwrap();
            let full = dtw.align(a.as_view(), b.as_view()).unwrap();
            assert_eq!(d.value().to_bits(), full.distance.value().to_bits(), "{dtw:?}");
        }
    }

    #[test]
    fn band_distance_geq_unconstrained() {
        let a = seq(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        let b = seq(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let free = plain().distance(a.as_view(), b.as_view()).unwrap();
        let banded = plain()
            .with_constraint(BandConstraint::SlantedBand(1))
            .distance(a.as_view(), b.as_view())
            .unwrap();
        assert!(banded.value() >= free.value());
    }

    #[test]
    fn penalty_discourages_warping() {
        // Free alignment warps to reach zero cost; a large penalty forces the diagonal.
        let a = seq(&[0.0, 0.0, 1.0]);
        let b = seq(&[0.0, 1.0, 1.0]);
        let free = plain().distance(a.as_view(), b.as_view()).unwrap();
        assert_eq!(free.value(), 0.0);
        let (d, path) = plain()
            .with_warping_penalty(10.0)
            .unwrap()
            .distance_and_path(a.as_view(), b.as_view())
            .unwrap();
        assert_eq!(d.value(), 1.0);
        assert_eq!(path.a_indices(), vec![0, 1, 2]);
        assert_eq!(path.b_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn negative_penalty_rejected() {
        assert!(matches!(
            Dtw::default().with_warping_penalty(-1.0),
            Err(DtwError::InvalidWarpingPenalty { .. })
        ));
        assert!(Dtw::default().with_warping_penalty(f64::NAN).is_err());
    }

    #[test]
    fn padding_is_ignored() {
        let a = seq(&[1.0, 2.0, f64::NAN, f64::NAN]);
        let b = seq(&[1.0, 2.0]);
        let d = plain().distance(a.as_view(), b.as_view()).unwrap();
        assert_eq!(d.value(), 0.0);
    }

    #[test]
    fn empty_sequence_rejected() {
        let a = seq(&[f64::NAN]);
        let b = seq(&[1.0]);
        assert_eq!(
            plain().distance(a.as_view(), b.as_view()).unwrap_err(),
            DtwError::EmptySequence
        );
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let a = Sequence::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let b = seq(&[1.0]);
        assert!(matches!(
            plain().distance(a.as_view(), b.as_view()),
            Err(DtwError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn normalise_divides_by_longer_length() {
        let a = seq(&[0.0, 0.0]);
        let b = seq(&[1.0, 1.0, 1.0, 1.0]);
        let raw = plain().distance(a.as_view(), b.as_view()).unwrap();
        let norm = plain()
            .with_normalise(true)
            .distance(a.as_view(), b.as_view())
            .unwrap();
        assert_eq!(raw.value(), 4.0);
        assert_eq!(norm.value(), 1.0);
    }

    #[test]
    fn normalise_uses_pre_scale_length() {
        let a = seq(&[0.0, 0.0]);
        let b = seq(&[1.0, 1.0, 1.0, 1.0]);
        let d = plain()
            .with_scale_first(true)
            .with_normalise(true)
            .distance(a.as_view(), b.as_view())
            .unwrap();
        assert_eq!(d.value(), 1.0);
    }

    #[test]
    fn scale_first_maps_path_back_to_original_indices() {
        let a = seq(&[1.0, 5.0]);
        let b = seq(&[1.0, 1.0, 5.0, 5.0]);
        let (d, path) = plain()
            .with_scale_first(true)
            .with_constraint(BandConstraint::SlantedBand(0))
            .distance_and_path(a.as_view(), b.as_view())
            .unwrap();
        assert_eq!(d.value(), 0.0);
        assert_eq!(path.a_indices(), vec![0, 0, 1, 1]);
        assert_eq!(path.b_indices(), vec![0, 1, 2, 3]);
        assert!(path.spans(2, 4));
    }

    #[test]
    fn scale_first_equal_lengths_bypasses_scaling() {
        let a = seq(&[1.0, 2.0, 3.0]);
        let b = seq(&[1.0, 2.0, 4.0]);
        let scaled = plain().with_scale_first(true);
        assert_eq!(
            scaled.distance(a.as_view(), b.as_view()).unwrap(),
            plain().distance(a.as_view(), b.as_view()).unwrap()
        );
    }

    #[test]
    fn reverse_trial_keeps_forward_on_ties() {
        let s = seq(&[2.0, 2.0, 2.0]);
        let alignment = plain()
            .with_try_reverse(true)
            .align(s.as_view(), s.as_view())
            .unwrap();
        assert!(!alignment.reversed);
    }

    #[test]
    fn tie_between_axes_moves_toward_diagonal() {
        // Constant sequences: every cell costs 0, so the diagonal wins
        // until one index is exhausted, then the path runs along the other axis.
        let a = seq(&[1.0, 1.0, 1.0, 1.0]);
        let b = seq(&[1.0, 1.0]);
        let (_, path) = plain().distance_and_path(a.as_view(), b.as_view()).unwrap();
        assert_eq!(path.a_indices(), vec![0, 1, 2, 3]);
        assert_eq!(path.b_indices(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn cost_matrix_marks_out_of_band_cells() {
        let a = seq(&[1.0, 2.0, 3.0]);
        let alignment = plain()
            .with_constraint(BandConstraint::SlantedBand(0))
            .align(a.as_view(), a.as_view())
            .unwrap();
        assert_eq!(alignment.cost.get(0, 0), 0.0);
        assert_eq!(alignment.cost.get(0, 2), f64::INFINITY);
        assert_eq!(alignment.cost.total(), 0.0);
    }

    #[test]
    fn unreachable_corner_is_infinite_distance_and_align_error() {
        // 2 x 4 with k = 0 admits only (0, 0) and (1, 2).
        let a = seq(&[1.0, 2.0]);
        let b = seq(&[1.0, 1.0, 2.0, 2.0]);
        let dtw = plain().with_constraint(BandConstraint::SlantedBand(0));
        assert_eq!(dtw.distance(a.as_view(), b.as_view()).unwrap().value(), f64::INFINITY);
        assert_eq!(
            dtw.align(a.as_view(), b.as_view()).unwrap_err(),
            DtwError::NoAdmissiblePath { len_a: 2, len_b: 4 }
        );
        assert!(dtw.distance_and_path(a.as_view(), b.as_view()).is_err());
    }

    #[test]
    fn narrow_band_on_unequal_lengths() {
        let a = seq(&[1.0, 2.0, 1.0]);
        let b = seq(&[2.0, 3.0, 2.0, 0.0, 2.0, 3.0, 0.0, 3.0]);
        let dtw = plain().with_constraint(BandConstraint::SlantedBand(2));
        let alignment = dtw.align(a.as_view(), b.as_view()).unwrap();
        assert_eq!(alignment.distance.value(), 15.0);
        assert_eq!(dtw.distance(a.as_view(), b.as_view()).unwrap().value(), 15.0);
        assert!(alignment.path.spans(3, 8));
        for step in &alignment.path {
            let range = BandConstraint::SlantedBand(2).column_range(step.a, 3, 8);
            assert!(range.contains(&step.b), "{step:?} left the band");
        }
    }

    #[test]
    fn warping_path_continuity() {
        let a = seq(&[1.0, 5.0, 2.0, 8.0, 3.0]);
        let b = seq(&[2.0, 4.0, 7.0]);
        let (_, path) = plain().distance_and_path(a.as_view(), b.as_view()).unwrap();
        assert!(path.spans(5, 3));
        let rebuilt = WarpingPath::from_indices(&path.a_indices(), &path.b_indices());
        assert!(rebuilt.is_ok());
    }
}
