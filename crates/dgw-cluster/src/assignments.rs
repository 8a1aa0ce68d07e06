//! Flat clusters obtained by cutting the tree.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use dgw_dtw::{RegionId, Sequence};

use crate::error::ClusterError;
use crate::hierarchy::HierarchicalClustering;
use crate::tree::NodeId;

/// The clusters produced by one cut, largest first.
#[derive(Debug)]
pub struct ClusterAssignments<'a> {
    clusters: Vec<Cluster<'a>>,
}

impl<'a> ClusterAssignments<'a> {
    pub(crate) fn new(owner: &'a HierarchicalClustering, roots: Vec<NodeId>) -> Result<Self, ClusterError> {
        let clusters = roots
            .into_iter()
            .map(|root| Cluster::new(owner, root))
            .collect::<Result<_, _>>()?;
        Ok(Self { clusters })
    }

    /// Number of clusters.
    #[must_use]
    pub fn n(&self) -> usize {
        self.clusters.len()
    }

    /// Map every region to its 1-based cluster index.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<RegionId, usize> {
        self.clusters
            .iter()
            .enumerate()
            .flat_map(|(k, cluster)| cluster.regions().map(move |id| (id.clone(), k + 1)))
            .collect()
    }

    /// Root ids in cluster order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.clusters.iter().map(Cluster::root).collect()
    }

    /// Clusters, largest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Cluster<'a>> {
        self.clusters.iter()
    }
}

impl<'s, 'a> IntoIterator for &'s ClusterAssignments<'a> {
    type Item = &'s Cluster<'a>;
    type IntoIter = std::slice::Iter<'s, Cluster<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// One flat cluster: a subtree of the hierarchy.
///
/// The prototype and projected member data are computed on first access.
#[derive(Debug)]
pub struct Cluster<'a> {
    owner: &'a HierarchicalClustering,
    root: NodeId,
    members: Vec<usize>,
    prototype: OnceLock<Sequence>,
    projected: OnceLock<Vec<(RegionId, Sequence)>>,
}

impl<'a> Cluster<'a> {
    fn new(owner: &'a HierarchicalClustering, root: NodeId) -> Result<Self, ClusterError> {
        Ok(Self {
            owner,
            root,
            members: owner.tree().leaves_under(root)?,
            prototype: OnceLock::new(),
            projected: OnceLock::new(),
        })
    }

    /// Tree node the cluster hangs from.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of member regions.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Dataset indices of the members, in left-to-right leaf order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.members
    }

    /// Member region ids, in left-to-right leaf order.
    pub fn regions(&self) -> impl Iterator<Item = &'a RegionId> + '_ {
        let ids = self.owner.dataset().ids();
        self.members.iter().map(move |&k| &ids[k])
    }

    /// The prototype at the cluster root.
    ///
    /// # Errors
    ///
    /// Propagates failures of the prototype reduction.
    pub fn prototype(&self) -> Result<&Sequence, ClusterError> {
        if let Some(prototype) = self.prototype.get() {
            return Ok(prototype);
        }
        let computed = self.owner.prototype(self.root)?;
        Ok(self.prototype.get_or_init(|| computed))
    }

    /// Every member projected onto the prototype's index space along its
    /// warping path, in member order.
    ///
    /// A singleton cluster projects onto itself.
    ///
    /// # Errors
    ///
    /// Propagates prototype, path engine and projection failures.
    pub fn projected_data(&self) -> Result<&[(RegionId, Sequence)], ClusterError> {
        if let Some(projected) = self.projected.get() {
            return Ok(projected);
        }
        let target_len = self.prototype()?.n_rows();
        let paths = self.owner.paths_for(&[self.root])?;
        let dataset = self.owner.dataset();
        let mut projected = Vec::with_capacity(self.members.len());
        for &k in &self.members {
            let id = &dataset.ids()[k];
            let path = paths
                .get(&self.root)
                .and_then(|per_region| per_region.get(id))
                .ok_or(ClusterError::UnknownNode { id: self.root.index() })?;
            projected.push((id.clone(), path.project(dataset.sequence(k), target_len)?));
        }
        Ok(self.projected.get_or_init(|| projected))
    }
}
