//! Hierarchical shape clustering on top of the DGW DTW kernel.
//!
//! Builds a complete-linkage tree from pairwise DTW distances, folds it
//! bottom-up into per-node prototypes, and aligns every region onto the
//! prototypes of its ancestors.

mod assignments;
mod config;
mod error;
mod hierarchy;
mod linkage;
mod projection;
mod prototype;
mod tree;

pub use assignments::{Cluster, ClusterAssignments};
pub use config::{ClusteringConfig, ParsePrototypingMethodError, PrototypingMethod};
pub use error::ClusterError;
pub use hierarchy::HierarchicalClustering;
pub use linkage::{LinkageMatrix, Merge};
pub use projection::{PathMap, compute_paths};
pub use prototype::{WeightedPrototype, blend_along_path, compute_prototypes, merge_pair};
pub use tree::{ClusterTree, Node, NodeId, NodeKind};
