//! Dense `[N × Lmax × D]` dataset of padded sequences keyed by region id.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::DtwError;
use crate::sequence::{Sequence, SequenceView};

/// Stable external identifier of a genomic region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(String);

impl RegionId {
    /// Create a region id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for RegionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Whether `log(1 + x)` has been applied to the dataset values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatasetScale {
    /// Values as ingested.
    #[default]
    Raw,
    /// Values passed through `log(1 + x)` exactly once.
    LogScaled,
}

/// Points of interest: `region → dataset name → sorted bin indices`.
///
/// Carried alongside the dataset for the outer layer; never read by the
/// distance or clustering code.
pub type PointsOfInterest = BTreeMap<RegionId, BTreeMap<String, Vec<usize>>>;

/// Immutable collection of N sequences sharing dimensionality D and padded to
/// a common length `Lmax`.
#[derive(Debug, Clone)]
pub struct Dataset {
    ids: Vec<RegionId>,
    positions: HashMap<RegionId, usize>,
    names: Vec<String>,
    values: Vec<f64>,
    lengths: Vec<usize>,
    max_len: usize,
    scale: DatasetScale,
    points_of_interest: Option<PointsOfInterest>,
}

impl Dataset {
    /// Build a dataset from per-region sequences, padding each to the longest
    /// semantic length with NaN rows.
    ///
    /// `names` labels the D columns and must have one entry per dimension.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::DimensionMismatch`] | Id and sequence counts differ, or a sequence's D differs from `names.len()` |
    /// | [`DtwError::DuplicateRegionId`] | An id appears twice |
    /// | [`DtwError::EmptySequence`] | A sequence has no non-padded rows |
    /// | [`DtwError::InconsistentPadding`] | A sequence is malformed |
    pub fn from_sequences(
        ids: Vec<RegionId>,
        names: Vec<String>,
        sequences: &[Sequence],
    ) -> Result<Self, DtwError> {
        if ids.len() != sequences.len() {
            return Err(DtwError::DimensionMismatch {
                what: "region id count",
                expected: sequences.len(),
                got: ids.len(),
            });
        }
        let ndim = names.len();
        let mut bodies = Vec::with_capacity(sequences.len());
        for s in sequences {
            if s.ndim() != ndim {
                return Err(DtwError::DimensionMismatch {
                    what: "dataset names",
                    expected: s.ndim(),
                    got: ndim,
                });
            }
            let body = s.as_view().strip_padding()?;
            if body.n_rows() == 0 {
                return Err(DtwError::EmptySequence);
            }
            bodies.push(body);
        }

        let max_len = bodies.iter().map(SequenceView::n_rows).max().unwrap_or(0);
        let mut values = Vec::with_capacity(bodies.len() * max_len * ndim);
        for body in &bodies {
            values.extend_from_slice(body.as_slice());
            values.resize(values.len() + (max_len - body.n_rows()) * ndim, f64::NAN);
        }
        let lengths = bodies.iter().map(SequenceView::n_rows).collect();

        Self::assemble(ids, names, values, lengths, max_len)
    }

    /// Build a dataset from a dense row-major `[N × max_len × D]` buffer with
    /// NaN padding, where `N = ids.len()` and `D = names.len()`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::DimensionMismatch`] | `names` is empty, or the buffer length is not `N * max_len * D` |
    /// | [`DtwError::DuplicateRegionId`] | An id appears twice |
    /// | [`DtwError::EmptySequence`] | A region has no non-padded rows |
    /// | [`DtwError::InconsistentPadding`] | A region is malformed |
    pub fn from_buffer(
        ids: Vec<RegionId>,
        names: Vec<String>,
        values: Vec<f64>,
        max_len: usize,
    ) -> Result<Self, DtwError> {
        let ndim = names.len();
        if ndim == 0 {
            return Err(DtwError::DimensionMismatch {
                what: "dataset names",
                expected: 1,
                got: 0,
            });
        }
        let expected = ids.len() * max_len * ndim;
        if values.len() != expected {
            return Err(DtwError::DimensionMismatch {
                what: "dataset buffer length",
                expected,
                got: values.len(),
            });
        }

        let stride = max_len * ndim;
        let mut lengths = Vec::with_capacity(ids.len());
        for k in 0..ids.len() {
            let view = SequenceView::new(&values[k * stride..(k + 1) * stride], ndim)?;
            let len = view.semantic_length()?;
            if len == 0 {
                return Err(DtwError::EmptySequence);
            }
            lengths.push(len);
        }

        Self::assemble(ids, names, values, lengths, max_len)
    }

    fn assemble(
        ids: Vec<RegionId>,
        names: Vec<String>,
        values: Vec<f64>,
        lengths: Vec<usize>,
        max_len: usize,
    ) -> Result<Self, DtwError> {
        let mut positions = HashMap::with_capacity(ids.len());
        for (k, id) in ids.iter().enumerate() {
            if positions.insert(id.clone(), k).is_some() {
                return Err(DtwError::DuplicateRegionId { id: id.to_string() });
            }
        }
        debug!(
            regions = ids.len(),
            ndim = names.len(),
            max_len,
            "dataset assembled"
        );
        Ok(Self {
            ids,
            positions,
            names,
            values,
            lengths,
            max_len,
            scale: DatasetScale::Raw,
            points_of_interest: None,
        })
    }

    /// Apply `log(1 + x)` to every non-padded value.
    ///
    /// This is a one-way transition from [`DatasetScale::Raw`] to
    /// [`DatasetScale::LogScaled`]. Regions are processed in parallel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::AlreadyLogScaled`] | The dataset is already log-scaled |
    /// | [`DtwError::LogScaleDomain`] | A value is `<= -1` |
    #[instrument(skip(self), fields(regions = self.ids.len()))]
    pub fn log_scaled(mut self) -> Result<Self, DtwError> {
        if self.scale == DatasetScale::LogScaled {
            return Err(DtwError::AlreadyLogScaled);
        }
        let ndim = self.names.len();
        let stride = self.max_len * ndim;
        if stride > 0 {
            self.values
                .par_chunks_mut(stride)
                .enumerate()
                .try_for_each(|(region, block)| {
                    for (k, v) in block.iter_mut().enumerate() {
                        if v.is_nan() {
                            continue;
                        }
                        if *v <= -1.0 {
                            return Err(DtwError::LogScaleDomain {
                                region,
                                row: k / ndim,
                                value: *v,
                            });
                        }
                        *v = v.ln_1p();
                    }
                    Ok(())
                })?;
        }
        self.scale = DatasetScale::LogScaled;
        Ok(self)
    }

    /// Attach a points-of-interest map.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::UnknownRegion`] | The map names a region not in the dataset |
    pub fn with_points_of_interest(mut self, poi: PointsOfInterest) -> Result<Self, DtwError> {
        if let Some(unknown) = poi.keys().find(|id| !self.positions.contains_key(*id)) {
            return Err(DtwError::UnknownRegion {
                id: unknown.to_string(),
            });
        }
        self.points_of_interest = Some(poi);
        Ok(self)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Return true if the dataset has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of dimensions (datasets) per row.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.names.len()
    }

    /// Padded length shared by every region.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Region ids in dataset order.
    #[must_use]
    pub fn ids(&self) -> &[RegionId] {
        &self.ids
    }

    /// Dataset (column) names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Current scale state.
    #[must_use]
    pub fn scale(&self) -> DatasetScale {
        self.scale
    }

    /// Attached points of interest, if any.
    #[must_use]
    pub fn points_of_interest(&self) -> Option<&PointsOfInterest> {
        self.points_of_interest.as_ref()
    }

    /// Position of `id` in dataset order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::UnknownRegion`] | `id` is not in the dataset |
    pub fn position(&self, id: &str) -> Result<usize, DtwError> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| DtwError::UnknownRegion { id: id.to_string() })
    }

    /// Padded sequence of the region at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn sequence(&self, index: usize) -> SequenceView<'_> {
        let stride = self.max_len * self.ndim();
        SequenceView::new_unchecked(&self.values[index * stride..(index + 1) * stride], self.ndim())
    }

    /// Semantic (unpadded) length of the region at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn semantic_length(&self, index: usize) -> usize {
        self.lengths[index]
    }

    /// Iterate over `(id, padded sequence)` in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, SequenceView<'_>)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(|(k, id)| (id, self.sequence(k)))
    }

    /// The dense `[N × Lmax × D]` buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<RegionId> {
        names.iter().map(|&n| RegionId::from(n)).collect()
    }

    fn small() -> Dataset {
        Dataset::from_sequences(
            ids(&["r1", "r2"]),
            vec!["signal".to_string()],
            &[
                Sequence::univariate(vec![1.0, 2.0, 3.0]),
                Sequence::univariate(vec![4.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn from_sequences_pads_to_longest() {
        let ds = small();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.max_len(), 3);
        assert_eq!(ds.semantic_length(1), 1);
        let padded = ds.sequence(1);
        assert_eq!(padded.n_rows(), 3);
        assert_eq!(padded.row(0), &[4.0]);
        assert!(padded.row(2)[0].is_nan());
    }

    #[test]
    fn position_lookup() {
        let ds = small();
        assert_eq!(ds.position("r2").unwrap(), 1);
        assert_eq!(
            ds.position("missing").unwrap_err(),
            DtwError::UnknownRegion {
                id: "missing".to_string()
            }
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let result = Dataset::from_sequences(
            ids(&["a", "a"]),
            vec!["x".to_string()],
            &[Sequence::univariate(vec![1.0]), Sequence::univariate(vec![2.0])],
        );
        assert!(matches!(result, Err(DtwError::DuplicateRegionId { .. })));
    }

    #[test]
    fn empty_region_rejected() {
        let result = Dataset::from_sequences(
            ids(&["a"]),
            vec!["x".to_string()],
            &[Sequence::univariate(vec![f64::NAN])],
        );
        assert_eq!(result.unwrap_err(), DtwError::EmptySequence);
    }

    #[test]
    fn dimension_must_match_names() {
        let result = Dataset::from_sequences(
            ids(&["a"]),
            vec!["x".to_string(), "y".to_string()],
            &[Sequence::univariate(vec![1.0])],
        );
        assert!(matches!(result, Err(DtwError::DimensionMismatch { .. })));
    }

    #[test]
    fn from_buffer_reads_lengths() {
        let ds = Dataset::from_buffer(
            ids(&["a", "b"]),
            vec!["x".to_string()],
            vec![1.0, 2.0, f64::NAN, 3.0, 4.0, 5.0],
            3,
        )
        .unwrap();
        assert_eq!(ds.semantic_length(0), 2);
        assert_eq!(ds.semantic_length(1), 3);
    }

    #[test]
    fn from_buffer_rejects_wrong_length() {
        let result = Dataset::from_buffer(ids(&["a"]), vec!["x".to_string()], vec![1.0; 4], 3);
        assert!(matches!(result, Err(DtwError::DimensionMismatch { .. })));
    }

    #[test]
    fn log_scaled_is_one_way() {
        let ds = small().log_scaled().unwrap();
        assert_eq!(ds.scale(), DatasetScale::LogScaled);
        assert!((ds.sequence(0).row(0)[0] - 2.0_f64.ln()).abs() < 1e-12);
        assert!(ds.sequence(1).row(2)[0].is_nan());
        assert_eq!(ds.log_scaled().unwrap_err(), DtwError::AlreadyLogScaled);
    }

    #[test]
    fn log_scaled_rejects_out_of_domain_values() {
        let ds = Dataset::from_sequences(
            ids(&["a"]),
            vec!["x".to_string()],
            &[Sequence::univariate(vec![0.0, -1.0])],
        )
        .unwrap();
        assert_eq!(
            ds.log_scaled().unwrap_err(),
            DtwError::LogScaleDomain {
                region: 0,
                row: 1,
                value: -1.0
            }
        );
    }

    #[test]
    fn points_of_interest_must_reference_known_regions() {
        let mut poi = PointsOfInterest::new();
        poi.insert(RegionId::from("r1"), BTreeMap::from([("signal".to_string(), vec![0, 2])]));
        let ds = small().with_points_of_interest(poi.clone()).unwrap();
        assert_eq!(ds.points_of_interest(), Some(&poi));

        let mut bad = PointsOfInterest::new();
        bad.insert(RegionId::from("nope"), BTreeMap::new());
        assert!(matches!(
            small().with_points_of_interest(bad),
            Err(DtwError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn iter_follows_dataset_order() {
        let ds = small();
        let order: Vec<&str> = ds.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["r1", "r2"]);
    }
}
