//! The clustering driver: distances, linkage, tree and lazily derived
//! prototypes and warping paths.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use dgw_dtw::{Dataset, DistanceMatrix, DtwError, Sequence, pairwise_distances};
use tracing::{info, instrument};

use crate::assignments::ClusterAssignments;
use crate::config::ClusteringConfig;
use crate::error::ClusterError;
use crate::linkage::LinkageMatrix;
use crate::projection::{PathMap, compute_paths};
use crate::prototype::compute_prototypes;
use crate::tree::{ClusterTree, NodeId, NodeKind};

/// A fitted complete-linkage hierarchy over a dataset.
///
/// Prototypes and paths are computed on first request and cached; the
/// distances, linkage and tree are fixed at construction.
#[derive(Debug)]
pub struct HierarchicalClustering {
    dataset: Dataset,
    config: ClusteringConfig,
    distances: DistanceMatrix,
    linkage: LinkageMatrix,
    tree: ClusterTree,
    prototypes: OnceLock<BTreeMap<NodeId, Sequence>>,
    paths: OnceLock<PathMap>,
}

impl HierarchicalClustering {
    /// Compute pairwise distances with the configured kernel and build the hierarchy.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::IncompatibleMeanConfig`] | `config` fails validation |
    /// | [`ClusterError::TooFewRegions`] | The dataset has fewer than 2 regions |
    /// | [`ClusterError::Engine`] | The pairwise engine failed |
    /// | [`ClusterError::NonFiniteDistance`] | A distance came out NaN or infinite |
    #[instrument(skip_all, fields(regions = dataset.len(), metric = %config.dtw().metric()))]
    pub fn fit(dataset: Dataset, config: ClusteringConfig) -> Result<Self, ClusterError> {
        config.validate()?;
        if dataset.len() < 2 {
            return Err(ClusterError::TooFewRegions { n: dataset.len() });
        }
        let distances = pairwise_distances(&dataset, config.dtw(), config.parallelism())?;
        Self::from_distances(dataset, config, distances)
    }

    /// Build the hierarchy from a precomputed distance matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::IncompatibleMeanConfig`] | `config` fails validation |
    /// | [`ClusterError::TooFewRegions`] | The dataset has fewer than 2 regions |
    /// | [`ClusterError::Dtw`] | `distances` does not cover the dataset |
    /// | [`ClusterError::NonFiniteDistance`] | A distance is NaN or infinite |
    pub fn from_distances(
        dataset: Dataset,
        config: ClusteringConfig,
        distances: DistanceMatrix,
    ) -> Result<Self, ClusterError> {
        config.validate()?;
        if dataset.len() < 2 {
            return Err(ClusterError::TooFewRegions { n: dataset.len() });
        }
        if distances.len() != dataset.len() {
            return Err(DtwError::DimensionMismatch {
                what: "distance matrix size",
                expected: dataset.len(),
                got: distances.len(),
            }
            .into());
        }
        let linkage = LinkageMatrix::complete(&distances)?;
        let tree = ClusterTree::from_linkage(&linkage, dataset.ids())?;
        info!(regions = dataset.len(), "hierarchy built");
        Ok(Self {
            dataset,
            config,
            distances,
            linkage,
            tree,
            prototypes: OnceLock::new(),
            paths: OnceLock::new(),
        })
    }

    /// The clustered regions.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Kernel, prototyping scheme and worker count used for this run.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Condensed pairwise distances.
    #[must_use]
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Complete-linkage merges in row order.
    #[must_use]
    pub fn linkage(&self) -> &LinkageMatrix {
        &self.linkage
    }

    /// The linkage folded into a tree with region ids on the leaves.
    #[must_use]
    pub fn tree(&self) -> &ClusterTree {
        &self.tree
    }

    /// Prototypes of every internal node, computed on first call.
    ///
    /// # Errors
    ///
    /// Propagates failures of the prototype reduction. Nothing is cached on failure.
    pub fn prototypes(&self) -> Result<&BTreeMap<NodeId, Sequence>, ClusterError> {
        if let Some(prototypes) = self.prototypes.get() {
            return Ok(prototypes);
        }
        let computed = compute_prototypes(
            &self.tree,
            &self.dataset,
            self.config.dtw(),
            self.config.prototyping_method(),
        )?;
        Ok(self.prototypes.get_or_init(|| computed))
    }

    /// Prototype of any node; a leaf's prototype is its unpadded sequence.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::UnknownNode`] | `id` is not in the tree |
    /// | [`ClusterError::Dtw`] | The prototype reduction failed |
    pub fn prototype(&self, id: NodeId) -> Result<Sequence, ClusterError> {
        match self.tree.node(id)?.kind() {
            NodeKind::Leaf { index, .. } => Ok(self.dataset.sequence(*index).strip_padding()?.to_sequence()),
            NodeKind::Internal { .. } => self
                .prototypes()?
                .get(&id)
                .cloned()
                .ok_or(ClusterError::UnknownNode { id: id.index() }),
        }
    }

    /// Warping paths from every leaf onto every ancestor's prototype,
    /// computed on first call.
    ///
    /// # Errors
    ///
    /// Propagates prototype and path engine failures. Nothing is cached on failure.
    pub fn paths(&self) -> Result<&PathMap, ClusterError> {
        if let Some(paths) = self.paths.get() {
            return Ok(paths);
        }
        let nodes: Vec<NodeId> = self.tree.internal_nodes().map(|node| node.id()).collect();
        let computed = self.compute_paths_for(&nodes)?;
        Ok(self.paths.get_or_init(|| computed))
    }

    /// Paths for a subset of nodes. Served from the cache when [`paths`](Self::paths)
    /// already ran and every node is internal; computed otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`paths`](Self::paths), plus [`ClusterError::UnknownNode`].
    pub fn paths_for(&self, nodes: &[NodeId]) -> Result<PathMap, ClusterError> {
        if let Some(cached) = self.paths.get()
            && nodes.iter().all(|id| cached.contains_key(id))
        {
            return Ok(nodes
                .iter()
                .filter_map(|id| cached.get(id).map(|paths| (*id, paths.clone())))
                .collect());
        }
        self.compute_paths_for(nodes)
    }

    fn compute_paths_for(&self, nodes: &[NodeId]) -> Result<PathMap, ClusterError> {
        let needs_prototypes = nodes
            .iter()
            .any(|&id| self.tree.node(id).is_ok_and(|node| !node.is_leaf()));
        let empty = BTreeMap::new();
        let prototypes = if needs_prototypes { self.prototypes()? } else { &empty };
        compute_paths(
            &self.tree,
            &self.dataset,
            prototypes,
            self.config.dtw(),
            self.config.parallelism(),
            nodes,
        )
    }

    /// Flat clusters: maximal subtrees with merge distance `<= t`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidThreshold`] | `t` is negative or NaN |
    pub fn cut(&self, t: f64) -> Result<ClusterAssignments<'_>, ClusterError> {
        let roots = self.tree.cut(t)?;
        ClusterAssignments::new(self, roots)
    }

    /// Cut at [`threshold_for_n_clusters(k)`](Self::threshold_for_n_clusters).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidClusterCount`] | `k` is zero |
    pub fn cut_n_clusters(&self, k: usize) -> Result<ClusterAssignments<'_>, ClusterError> {
        self.cut(self.threshold_for_n_clusters(k)?)
    }

    /// Smallest threshold whose cut yields at most `k` clusters.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidClusterCount`] | `k` is zero |
    pub fn threshold_for_n_clusters(&self, k: usize) -> Result<f64, ClusterError> {
        self.tree.threshold_for_n_clusters(k)
    }
}
