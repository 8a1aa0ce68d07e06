//! Complete-linkage agglomeration over a condensed distance matrix.

use dgw_dtw::DistanceMatrix;
use tracing::{info, instrument};

use crate::error::ClusterError;

/// One agglomeration step: clusters `left` and `right` merged at `distance`
/// into a new cluster of `size` leaves.
///
/// Ids `0..n` are leaves; the cluster created by row `r` has id `n + r`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Smaller child id.
    pub left: usize,
    /// Larger child id.
    pub right: usize,
    /// Merge height.
    pub distance: f64,
    /// Number of leaves under the new cluster.
    pub size: usize,
}

/// Standard `[n-1 × 4]` agglomerative linkage, rows ordered by merge distance.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageMatrix {
    n_leaves: usize,
    merges: Vec<Merge>,
}

impl LinkageMatrix {
    /// Run complete linkage over `distances`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::TooFewRegions`] | The matrix covers fewer than 2 items |
    /// | [`ClusterError::NonFiniteDistance`] | A distance is NaN or infinite |
    #[instrument(skip(distances), fields(n = distances.len()))]
    pub fn complete(distances: &DistanceMatrix) -> Result<Self, ClusterError> {
        let n = distances.len();
        if n < 2 {
            return Err(ClusterError::TooFewRegions { n });
        }
        if let Some((index, &value)) = distances
            .as_slice()
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite())
        {
            return Err(ClusterError::NonFiniteDistance { index, value });
        }

        let mut condensed = distances.as_slice().to_vec();
        let dendrogram = kodama::linkage(&mut condensed, n, kodama::Method::Complete);
        let merges = dendrogram
            .steps()
            .iter()
            .map(|step| Merge {
                left: step.cluster1.min(step.cluster2),
                right: step.cluster1.max(step.cluster2),
                distance: step.dissimilarity,
                size: step.size,
            })
            .collect();

        let linkage = Self { n_leaves: n, merges };
        linkage.validate()?;
        info!(
            leaves = n,
            height = linkage.merges.last().map_or(0.0, |m| m.distance),
            "complete linkage built"
        );
        Ok(linkage)
    }

    /// Rebuild a linkage from persisted `[left, right, distance, count]` rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::TooFewRegions`] | `n_leaves < 2` |
    /// | [`ClusterError::InvalidLinkage`] | Wrong row count, non-integral or out-of-range ids, a cluster merged twice, a non-finite or negative distance, or a count that is not the sum of its children |
    pub fn from_rows(n_leaves: usize, rows: &[[f64; 4]]) -> Result<Self, ClusterError> {
        if n_leaves < 2 {
            return Err(ClusterError::TooFewRegions { n: n_leaves });
        }
        if rows.len() != n_leaves - 1 {
            return Err(ClusterError::InvalidLinkage {
                row: rows.len(),
                reason: "row count must be one less than the leaf count",
            });
        }
        let mut merges = Vec::with_capacity(rows.len());
        for (row, &[a, b, distance, count]) in rows.iter().enumerate() {
            let (Some(a), Some(b), Some(size)) = (as_index(a), as_index(b), as_index(count)) else {
                return Err(ClusterError::InvalidLinkage {
                    row,
                    reason: "ids and counts must be non-negative integers",
                });
            };
            merges.push(Merge {
                left: a.min(b),
                right: a.max(b),
                distance,
                size,
            });
        }
        let linkage = Self { n_leaves, merges };
        linkage.validate()?;
        Ok(linkage)
    }

    fn validate(&self) -> Result<(), ClusterError> {
        let n = self.n_leaves;
        let mut sizes = vec![1usize; n];
        let mut merged = vec![false; 2 * n - 1];
        for (row, m) in self.merges.iter().enumerate() {
            let created = n + row;
            let invalid = |reason| ClusterError::InvalidLinkage { row, reason };
            if m.left == m.right || m.right >= created {
                return Err(invalid("child id must refer to an earlier cluster"));
            }
            if merged[m.left] || merged[m.right] {
                return Err(invalid("cluster merged more than once"));
            }
            if !m.distance.is_finite() || m.distance < 0.0 {
                return Err(invalid("distance must be finite and non-negative"));
            }
            let size = sizes[m.left] + sizes[m.right];
            if m.size != size {
                return Err(invalid("count does not match the children"));
            }
            merged[m.left] = true;
            merged[m.right] = true;
            sizes.push(size);
        }
        Ok(())
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Merge steps in row order.
    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Rows as `[left, right, distance, count]`.
    #[must_use]
    pub fn to_rows(&self) -> Vec<[f64; 4]> {
        self.merges
            .iter()
            .map(|m| [m.left as f64, m.right as f64, m.distance, m.size as f64])
            .collect()
    }
}

fn as_index(v: f64) -> Option<usize> {
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0).then_some(v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(n: usize, data: Vec<f64>) -> DistanceMatrix {
        DistanceMatrix::from_condensed(n, data).unwrap()
    }

    #[test]
    fn four_points_on_a_line() {
        // Points at 0, 1, 5, 6: pairs (0,1) and (2,3) merge first, then the two pairs.
        let d = matrix(4, vec![1.0, 5.0, 6.0, 4.0, 5.0, 1.0]);
        let z = LinkageMatrix::complete(&d).unwrap();
        let rows = z.to_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], 1.0);
        assert_eq!(rows[1][2], 1.0);
        assert_eq!(rows[2], [4.0, 5.0, 6.0, 4.0]);
        let first_pairs: Vec<(usize, usize)> = z.merges()[..2].iter().map(|m| (m.left, m.right)).collect();
        assert!(first_pairs.contains(&(0, 1)));
        assert!(first_pairs.contains(&(2, 3)));
    }

    #[test]
    fn complete_linkage_uses_maximum_distance() {
        // 0-1 closest; 2 is at distance 2 from 0 but 10 from 1.
        let d = matrix(3, vec![1.0, 2.0, 10.0]);
        let z = LinkageMatrix::complete(&d).unwrap();
        assert_eq!(z.merges()[0], Merge { left: 0, right: 1, distance: 1.0, size: 2 });
        assert_eq!(z.merges()[1], Merge { left: 2, right: 3, distance: 10.0, size: 3 });
    }

    #[test]
    fn root_counts_every_leaf() {
        let d = matrix(5, (0..10).map(|k| 1.0 + k as f64).collect());
        let z = LinkageMatrix::complete(&d).unwrap();
        assert_eq!(z.merges().last().unwrap().size, 5);
    }

    #[test]
    fn non_finite_distances_rejected() {
        let d = matrix(3, vec![1.0, f64::NAN, 2.0]);
        assert!(matches!(
            LinkageMatrix::complete(&d),
            Err(ClusterError::NonFiniteDistance { index: 1, .. })
        ));
    }

    #[test]
    fn single_leaf_rejected() {
        let d = matrix(1, vec![]);
        assert!(matches!(
            LinkageMatrix::complete(&d),
            Err(ClusterError::TooFewRegions { n: 1 })
        ));
    }

    #[test]
    fn from_rows_round_trips_a_built_linkage() {
        let d = matrix(4, vec![1.0, 5.0, 6.0, 4.0, 5.0, 1.0]);
        let z = LinkageMatrix::complete(&d).unwrap();
        assert_eq!(LinkageMatrix::from_rows(4, &z.to_rows()).unwrap(), z);
    }

    #[test]
    fn from_rows_rejects_bad_counts() {
        let rows = [[0.0, 1.0, 1.0, 3.0], [2.0, 3.0, 2.0, 3.0]];
        assert!(matches!(
            LinkageMatrix::from_rows(3, &rows),
            Err(ClusterError::InvalidLinkage { row: 0, .. })
        ));
    }

    #[test]
    fn from_rows_rejects_reused_clusters() {
        let rows = [[0.0, 1.0, 1.0, 2.0], [0.0, 2.0, 2.0, 2.0]];
        assert!(matches!(
            LinkageMatrix::from_rows(3, &rows),
            Err(ClusterError::InvalidLinkage { row: 1, .. })
        ));
    }

    #[test]
    fn from_rows_rejects_forward_references() {
        let rows = [[0.0, 3.0, 1.0, 2.0], [1.0, 2.0, 2.0, 2.0]];
        assert!(matches!(
            LinkageMatrix::from_rows(3, &rows),
            Err(ClusterError::InvalidLinkage { row: 0, .. })
        ));
    }
}
