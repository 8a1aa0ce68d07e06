//! JSON artifact writer for distances, linkage, prototypes, paths and cuts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dgw_cluster::{ClusterAssignments, HierarchicalClustering, LinkageMatrix, NodeId, PathMap};
use dgw_dtw::{DistanceMatrix, RegionId, Sequence};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::experiment::ExperimentName;

/// Writes clustering artifacts to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_{artifact}.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the artifact with the given suffix.
    #[must_use]
    pub fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(self.experiment.artifact_file(suffix))
    }

    /// Write the condensed distance vector to `{experiment}_distances.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] or [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_distances(&self, ids: &[RegionId], distances: &DistanceMatrix) -> Result<PathBuf, IoError> {
        let artifact = DistancesArtifact {
            experiment: self.experiment.as_str(),
            regions: ids.iter().map(RegionId::as_str).collect(),
            distances: distances.as_slice(),
        };
        self.write_json("distances", &artifact)
    }

    /// Write the `[n-1 × 4]` linkage matrix to `{experiment}_linkage.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] or [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_linkage(&self, linkage: &LinkageMatrix) -> Result<PathBuf, IoError> {
        let artifact = LinkageArtifact {
            experiment: self.experiment.to_string(),
            n_leaves: linkage.n_leaves(),
            rows: linkage.to_rows(),
        };
        self.write_json("linkage", &artifact)
    }

    /// Write internal-node prototypes as `[L × D]` arrays to `{experiment}_prototypes.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] or [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(prototypes = prototypes.len()))]
    pub fn write_prototypes(
        &self,
        datasets: &[String],
        prototypes: &BTreeMap<NodeId, Sequence>,
    ) -> Result<PathBuf, IoError> {
        let artifact = PrototypesArtifact {
            experiment: self.experiment.as_str(),
            datasets,
            prototypes: prototypes
                .iter()
                .map(|(id, sequence)| (id.index(), sequence.values().chunks(sequence.ndim()).collect()))
                .collect(),
        };
        self.write_json("prototypes", &artifact)
    }

    /// Write warping paths as int32 `(i, j)` arrays to `{experiment}_paths.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::IndexOverflow`] | An index exceeds `i32::MAX` |
    /// | [`IoError::Json`] / [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(nodes = paths.len()))]
    pub fn write_paths(&self, paths: &PathMap) -> Result<PathBuf, IoError> {
        let mut nodes = BTreeMap::new();
        for (id, per_region) in paths {
            let mut entries = BTreeMap::new();
            for (region, path) in per_region {
                entries.insert(
                    region.as_str(),
                    PathEntry {
                        i: to_int32(&path.a_indices())?,
                        j: to_int32(&path.b_indices())?,
                    },
                );
            }
            nodes.insert(id.index(), entries);
        }
        let artifact = PathsArtifact {
            experiment: self.experiment.as_str(),
            paths: nodes,
        };
        self.write_json("paths", &artifact)
    }

    /// Write a flat cut to `{experiment}_assignments.json`.
    ///
    /// Cluster indices are 1-based and follow the cut order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] or [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(clusters = assignments.n()))]
    pub fn write_assignments(&self, threshold: f64, assignments: &ClusterAssignments<'_>) -> Result<PathBuf, IoError> {
        let flat = assignments.flatten();
        let artifact = AssignmentsArtifact {
            experiment: self.experiment.as_str(),
            threshold,
            n_clusters: assignments.n(),
            assignments: flat.iter().map(|(id, &k)| (id.as_str(), k)).collect(),
            clusters: assignments
                .iter()
                .enumerate()
                .map(|(k, cluster)| ClusterEntry {
                    index: k + 1,
                    root: cluster.root().index(),
                    size: cluster.size(),
                    regions: cluster.regions().map(RegionId::as_str).collect(),
                })
                .collect(),
        };
        self.write_json("assignments", &artifact)
    }

    /// Write every artifact of a fitted hierarchy and one cut.
    ///
    /// Triggers prototype and path computation if they have not run yet.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Cluster`] if prototypes or paths fail, otherwise
    /// the errors of the individual writers.
    #[instrument(skip_all)]
    pub fn write_hierarchy(
        &self,
        hc: &HierarchicalClustering,
        threshold: f64,
        assignments: &ClusterAssignments<'_>,
    ) -> Result<Vec<PathBuf>, IoError> {
        let written = vec![
            self.write_distances(hc.dataset().ids(), hc.distances())?,
            self.write_linkage(hc.linkage())?,
            self.write_prototypes(hc.dataset().names(), hc.prototypes()?)?,
            self.write_paths(hc.paths()?)?,
            self.write_assignments(threshold, assignments)?,
        ];
        info!(files = written.len(), "artifacts written");
        Ok(written)
    }

    fn write_json<T: Serialize>(&self, suffix: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(suffix);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Json {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), "{suffix} written");
        Ok(path)
    }
}

/// Load a linkage matrix written by [`ResultWriter::write_linkage`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::Json`] | File is not a linkage artifact |
/// | [`IoError::Cluster`] | The rows do not form a valid linkage |
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_linkage(path: &Path) -> Result<LinkageMatrix, IoError> {
    let content = fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let artifact: LinkageArtifact = serde_json::from_str(&content).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(LinkageMatrix::from_rows(artifact.n_leaves, &artifact.rows)?)
}

fn to_int32(indices: &[usize]) -> Result<Vec<i32>, IoError> {
    indices
        .iter()
        .map(|&value| i32::try_from(value).map_err(|_| IoError::IndexOverflow { value }))
        .collect()
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct DistancesArtifact<'a> {
    experiment: &'a str,
    regions: Vec<&'a str>,
    distances: &'a [f64],
}

#[derive(Serialize, Deserialize)]
struct LinkageArtifact {
    experiment: String,
    n_leaves: usize,
    rows: Vec<[f64; 4]>,
}

#[derive(Serialize)]
struct PrototypesArtifact<'a> {
    experiment: &'a str,
    datasets: &'a [String],
    prototypes: BTreeMap<usize, Vec<&'a [f64]>>,
}

#[derive(Serialize)]
struct PathsArtifact<'a> {
    experiment: &'a str,
    paths: BTreeMap<usize, BTreeMap<&'a str, PathEntry>>,
}

#[derive(Serialize)]
struct PathEntry {
    i: Vec<i32>,
    j: Vec<i32>,
}

#[derive(Serialize)]
struct AssignmentsArtifact<'a> {
    experiment: &'a str,
    threshold: f64,
    n_clusters: usize,
    assignments: BTreeMap<&'a str, usize>,
    clusters: Vec<ClusterEntry<'a>>,
}

#[derive(Serialize)]
struct ClusterEntry<'a> {
    index: usize,
    root: usize,
    size: usize,
    regions: Vec<&'a str>,
}
