//! Path engine: warping paths from every leaf onto the prototypes of its ancestors.

use std::collections::BTreeMap;

use dgw_dtw::{Dataset, Dtw, Parallelism, RegionId, Sequence, SequenceView, WarpingPath, WorkerPool};
use tracing::{debug, info, instrument};

use crate::error::ClusterError;
use crate::tree::{ClusterTree, NodeId, NodeKind};

/// Warping paths keyed by `node → region → path onto the node's prototype`.
pub type PathMap = BTreeMap<NodeId, BTreeMap<RegionId, WarpingPath>>;

/// Compute the warping path from each leaf under each of `nodes` onto that
/// node's prototype.
///
/// A leaf node's prototype is its own unpadded sequence. Internal nodes are
/// looked up in `prototypes`. Work items `(leaf, node)` are spread over
/// `parallelism` workers; answers are gathered on the calling thread.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::UnknownNode`] | A node is missing from the tree or has no prototype |
/// | [`ClusterError::Engine`] | A DTW call failed or a worker panicked |
#[instrument(skip_all, fields(nodes = nodes.len(), workers = parallelism.get()))]
pub fn compute_paths(
    tree: &ClusterTree,
    dataset: &Dataset,
    prototypes: &BTreeMap<NodeId, Sequence>,
    dtw: &Dtw,
    parallelism: Parallelism,
    nodes: &[NodeId],
) -> Result<PathMap, ClusterError> {
    let mut items: Vec<(usize, NodeId, SequenceView<'_>)> = Vec::new();
    for &node in nodes {
        let target = match tree.node(node)?.kind() {
            NodeKind::Leaf { index, .. } => dataset.sequence(*index),
            NodeKind::Internal { .. } => prototypes
                .get(&node)
                .ok_or(ClusterError::UnknownNode { id: node.index() })?
                .as_view(),
        };
        items.extend(tree.leaves_under(node)?.into_iter().map(|leaf| (leaf, node, target)));
    }
    let total = items.len();
    debug!(total, "scheduling leaf-to-prototype alignments");

    let mut paths = PathMap::new();
    WorkerPool::new(parallelism).run(
        items,
        |(leaf, node, target)| {
            let (_, path) = dtw.distance_and_path(dataset.sequence(leaf), target)?;
            Ok((leaf, node, path))
        },
        |(leaf, node, path)| {
            paths
                .entry(node)
                .or_default()
                .insert(dataset.ids()[leaf].clone(), path);
        },
    )?;

    info!(paths = total, "warping paths computed");
    Ok(paths)
}
