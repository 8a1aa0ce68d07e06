//! Bottom-up prototype reduction over the cluster tree.

use std::collections::BTreeMap;

use dgw_dtw::{Dataset, Dtw, DtwError, Sequence, SequenceView, WarpingPath, uniform_shrink_to};
use tracing::{debug, info, instrument};

use crate::config::PrototypingMethod;
use crate::error::ClusterError;
use crate::tree::{ClusterTree, NodeId, NodeKind};

/// A prototype together with the number of regions it summarises.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPrototype {
    /// Unpadded prototype sequence.
    pub sequence: Sequence,
    /// Leaf count of the subtree.
    pub weight: usize,
}

impl WeightedPrototype {
    /// Leaf prototype: the region's rows without padding, weight 1.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::InconsistentPadding`] | `sequence` is malformed |
    pub fn leaf(sequence: SequenceView<'_>) -> Result<Self, DtwError> {
        Ok(Self {
            sequence: sequence.strip_padding()?.to_sequence(),
            weight: 1,
        })
    }
}

/// Emit the blended sequence along `path` before shrinking.
///
/// Every step blends `a[i]` and `b[j]` with the subtree weights (or equally
/// for [`PrototypingMethod::StandardUnweighted`]). Under
/// [`PrototypingMethod::Psa`] the sample is repeated: the first step and
/// diagonal steps `round((wa + wb) / 2)` times, a step that only advances
/// in `b` `wa` times, one that only advances in `a` `wb` times.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DtwError::InvalidPath`] | A step indexes outside `a` or `b` |
/// | [`DtwError::DimensionMismatch`] | `a` and `b` differ in dimensionality |
pub fn blend_along_path(
    a: &WeightedPrototype,
    b: &WeightedPrototype,
    path: &WarpingPath,
    method: PrototypingMethod,
) -> Result<Sequence, DtwError> {
    let ndim = a.sequence.ndim();
    if b.sequence.ndim() != ndim {
        return Err(DtwError::DimensionMismatch {
            what: "prototype dimensionality",
            expected: ndim,
            got: b.sequence.ndim(),
        });
    }
    let (wa, wb) = match method {
        PrototypingMethod::StandardUnweighted => (1.0, 1.0),
        _ => (a.weight as f64, b.weight as f64),
    };
    let total = wa + wb;
    let diagonal_repeats = (total / 2.0).round_ties_even() as usize;

    let mut values = Vec::with_capacity(path.len() * ndim);
    let mut blended = vec![0.0; ndim];
    let mut previous = None;
    for step in path {
        if step.a >= a.sequence.n_rows() || step.b >= b.sequence.n_rows() {
            return Err(DtwError::InvalidPath {
                reason: "step indexes outside the prototypes",
            });
        }
        for ((out, &x), &y) in blended
            .iter_mut()
            .zip(a.sequence.row(step.a))
            .zip(b.sequence.row(step.b))
        {
            *out = (wa * x + wb * y) / total;
        }

        let repeats = match (method, previous) {
            (PrototypingMethod::Psa, Some((prev_a, _))) if prev_a == step.a => a.weight,
            (PrototypingMethod::Psa, Some((_, prev_b))) if prev_b == step.b => b.weight,
            (PrototypingMethod::Psa, _) => diagonal_repeats,
            _ => 1,
        };
        for _ in 0..repeats.max(1) {
            values.extend_from_slice(&blended);
        }
        previous = Some((step.a, step.b));
    }
    Sequence::new(values, ndim)
}

/// Merge two child prototypes into their parent's prototype.
///
/// Aligns `a` to `b` with `dtw`, blends along the path and shrinks the result
/// to `max(|a|, |b|)` rows. The parent weight is the sum of both weights.
///
/// # Errors
///
/// Propagates kernel, blending and shrinking failures.
pub fn merge_pair(
    a: &WeightedPrototype,
    b: &WeightedPrototype,
    dtw: &Dtw,
    method: PrototypingMethod,
) -> Result<WeightedPrototype, DtwError> {
    let (_, path) = dtw.distance_and_path(a.sequence.as_view(), b.sequence.as_view())?;
    let blended = blend_along_path(a, b, &path, method)?;
    let target = a.sequence.n_rows().max(b.sequence.n_rows());
    Ok(WeightedPrototype {
        sequence: uniform_shrink_to(blended.as_view(), target)?,
        weight: a.weight + b.weight,
    })
}

enum Visit {
    Expand(NodeId),
    Reduce(NodeId),
}

/// Compute the prototype of every internal node.
///
/// Walks the tree with an explicit stack, so depth is bounded only by memory.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::UnknownNode`] | The tree references a missing node |
/// | [`ClusterError::Dtw`] | A leaf is malformed or a merge fails |
#[instrument(skip_all, fields(leaves = tree.n_leaves(), method = %method))]
pub fn compute_prototypes(
    tree: &ClusterTree,
    dataset: &Dataset,
    dtw: &Dtw,
    method: PrototypingMethod,
) -> Result<BTreeMap<NodeId, Sequence>, ClusterError> {
    let mut prototypes = BTreeMap::new();
    let mut values: Vec<WeightedPrototype> = Vec::new();
    let mut visits = vec![Visit::Expand(tree.root())];

    while let Some(visit) = visits.pop() {
        match visit {
            Visit::Expand(id) => match tree.node(id)?.kind() {
                NodeKind::Leaf { index, .. } => {
                    values.push(WeightedPrototype::leaf(dataset.sequence(*index))?);
                }
                NodeKind::Internal { left, right, .. } => {
                    visits.push(Visit::Reduce(id));
                    visits.push(Visit::Expand(*right));
                    visits.push(Visit::Expand(*left));
                }
            },
            Visit::Reduce(id) => {
                let (Some(right), Some(left)) = (values.pop(), values.pop()) else {
                    return Err(ClusterError::UnknownNode { id: id.index() });
                };
                let merged = merge_pair(&left, &right, dtw, method)?;
                debug!(node = %id, len = merged.sequence.n_rows(), weight = merged.weight, "prototype reduced");
                prototypes.insert(id, merged.sequence.clone());
                values.push(merged);
            }
        }
    }

    info!(prototypes = prototypes.len(), "prototypes computed");
    Ok(prototypes)
}
