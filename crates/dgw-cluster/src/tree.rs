//! Immutable binary cluster tree folded from a linkage matrix.

use std::fmt;

use dgw_dtw::{DtwError, RegionId};

use crate::error::ClusterError;
use crate::linkage::LinkageMatrix;

/// Node identifier. Leaves are `0..n`, the node created by linkage row `r` is `n + r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap a raw node id.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Raw node id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A single region.
    Leaf {
        /// External region id.
        region: RegionId,
        /// Position of the region in the dataset.
        index: usize,
    },
    /// A merge of two subtrees.
    Internal {
        /// Smaller child id.
        left: NodeId,
        /// Larger child id.
        right: NodeId,
        /// Merge height.
        distance: f64,
    },
}

/// A node of the cluster tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    size: usize,
}

impl Node {
    /// Leaves are `0..n`; the node created by linkage row `r` is `n + r`.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Leaf payload or child links.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Number of leaves in the subtree.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// True for the nodes that stand for a single region.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Merge height; leaves sit at 0.
    #[must_use]
    pub fn distance(&self) -> f64 {
        match self.kind {
            NodeKind::Leaf { .. } => 0.0,
            NodeKind::Internal { distance, .. } => distance,
        }
    }

    /// `(left, right)` for internal nodes.
    #[must_use]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Internal { left, right, .. } => Some((left, right)),
        }
    }

    /// Region id for leaves.
    #[must_use]
    pub fn region(&self) -> Option<&RegionId> {
        match &self.kind {
            NodeKind::Leaf { region, .. } => Some(region),
            NodeKind::Internal { .. } => None,
        }
    }
}

/// Binary tree with `n` leaves and `n - 1` internal nodes, indexed by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTree {
    n_leaves: usize,
    nodes: Vec<Node>,
}

impl ClusterTree {
    /// Fold `linkage` into a tree whose leaf `k` is named `ids[k]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::Dtw`] | `ids.len()` differs from the linkage leaf count |
    pub fn from_linkage(linkage: &LinkageMatrix, ids: &[RegionId]) -> Result<Self, ClusterError> {
        let n = linkage.n_leaves();
        if ids.len() != n {
            return Err(DtwError::DimensionMismatch {
                what: "region id count",
                expected: n,
                got: ids.len(),
            }
            .into());
        }

        let mut nodes: Vec<Node> = ids
            .iter()
            .enumerate()
            .map(|(index, region)| Node {
                id: NodeId(index),
                kind: NodeKind::Leaf {
                    region: region.clone(),
                    index,
                },
                size: 1,
            })
            .collect();
        nodes.reserve(linkage.merges().len());
        for (row, merge) in linkage.merges().iter().enumerate() {
            nodes.push(Node {
                id: NodeId(n + row),
                kind: NodeKind::Internal {
                    left: NodeId(merge.left),
                    right: NodeId(merge.right),
                    distance: merge.distance,
                },
                size: merge.size,
            });
        }
        Ok(Self { n_leaves: n, nodes })
    }

    /// Number of regions.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// The last node created, spanning every leaf.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(self.nodes.len() - 1)
    }

    /// Look up a node.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::UnknownNode`] | `id` is not in the tree |
    pub fn node(&self, id: NodeId) -> Result<&Node, ClusterError> {
        self.nodes
            .get(id.0)
            .ok_or(ClusterError::UnknownNode { id: id.0 })
    }

    /// All nodes, leaves first, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// Internal nodes in creation order.
    pub fn internal_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes[self.n_leaves..].iter()
    }

    /// Dataset indices of the leaves under `id`, left to right.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::UnknownNode`] | `id` is not in the tree |
    pub fn leaves_under(&self, id: NodeId) -> Result<Vec<usize>, ClusterError> {
        let mut leaves = Vec::with_capacity(self.node(id)?.size);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.node(current)?.kind {
                NodeKind::Leaf { index, .. } => leaves.push(index),
                NodeKind::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        Ok(leaves)
    }

    /// Dendrogram leaf order: dataset indices left to right under the root.
    #[must_use]
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut leaves = Vec::with_capacity(self.n_leaves);
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            match self.nodes[current.0].kind {
                NodeKind::Leaf { index, .. } => leaves.push(index),
                NodeKind::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        leaves
    }

    /// Roots of the maximal subtrees whose merge distance is `<= t`.
    ///
    /// Sorted by subtree size descending, then by id ascending.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidThreshold`] | `t` is negative or NaN |
    pub fn cut(&self, t: f64) -> Result<Vec<NodeId>, ClusterError> {
        if t.is_nan() || t < 0.0 {
            return Err(ClusterError::InvalidThreshold { t });
        }
        let mut roots = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            match node.children() {
                Some((left, right)) if node.distance() > t => {
                    stack.push(right);
                    stack.push(left);
                }
                _ => roots.push(current),
            }
        }
        roots.sort_by(|a, b| {
            self.nodes[b.0]
                .size
                .cmp(&self.nodes[a.0].size)
                .then(a.cmp(b))
        });
        Ok(roots)
    }

    /// Smallest threshold whose cut yields at most `k` clusters.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidClusterCount`] | `k` is zero |
    pub fn threshold_for_n_clusters(&self, k: usize) -> Result<f64, ClusterError> {
        if k == 0 {
            return Err(ClusterError::InvalidClusterCount { k });
        }
        let n = self.n_leaves;
        if k >= n {
            return Ok(0.0);
        }
        let mut heights: Vec<f64> = self.internal_nodes().map(Node::distance).collect();
        heights.sort_by(f64::total_cmp);
        Ok(heights[n - k - 1])
    }
}
