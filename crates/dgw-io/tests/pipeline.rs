//! End-to-end integration tests: CSV -> hierarchy -> JSON -> deserialize.

use std::fs;
use std::path::{Path, PathBuf};

use dgw_cluster::{ClusteringConfig, HierarchicalClustering, PrototypingMethod};
use dgw_dtw::{Dtw, Metric, Parallelism, RegionId, pairwise_distances};
use dgw_io::{DatasetReader, ExperimentName, IoError, PointsOfInterestReader, ResultWriter, read_linkage};
use serde_json::Value;
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn hierarchy_round_trip() {
    // 1. Read CSV: three shape groups (sharp peak, early plateau, late rise).
    let dataset = DatasetReader::new(&fixture_path("peaks_9.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(dataset.len(), 9);
    assert_eq!(dataset.max_len(), 8);
    assert_eq!(dataset.semantic_length(2), 5);

    // 2. Cluster and cut into 3 groups.
    let dtw = Dtw::new(Metric::SqEuclidean).with_try_reverse(false);
    let config = ClusteringConfig::new(dtw).with_prototyping_method(PrototypingMethod::Psa);
    let hc = HierarchicalClustering::fit(dataset, config).unwrap();
    let threshold = hc.threshold_for_n_clusters(3).unwrap();
    let assignments = hc.cut(threshold).unwrap();
    assert_eq!(assignments.n(), 3);

    // 3. Write every artifact.
    let dir = TempDir::new().unwrap();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("peaks").unwrap()).unwrap();
    let written = writer.write_hierarchy(&hc, threshold, &assignments).unwrap();
    assert_eq!(written.len(), 5);
    for suffix in ["distances", "linkage", "prototypes", "paths", "assignments"] {
        assert!(dir.path().join(format!("peaks_{suffix}.json")).is_file(), "missing {suffix}");
    }

    // 4. Deserialize back and verify.
    let distances = load_json(&dir.path().join("peaks_distances.json"));
    assert_eq!(distances["experiment"], "peaks");
    assert_eq!(distances["distances"].as_array().unwrap().len(), 36);
    assert_eq!(distances["regions"][0], "chr1:1000-1800");

    let linkage = load_json(&dir.path().join("peaks_linkage.json"));
    let rows = linkage["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[7][3].as_f64().unwrap(), 9.0);
    assert_eq!(read_linkage(&dir.path().join("peaks_linkage.json")).unwrap(), *hc.linkage());

    let prototypes = load_json(&dir.path().join("peaks_prototypes.json"));
    let by_node = prototypes["prototypes"].as_object().unwrap();
    assert_eq!(by_node.len(), 8);
    for (node, rows) in by_node {
        let node: usize = node.parse().unwrap();
        assert!((9..17).contains(&node));
        assert!(rows.as_array().unwrap().iter().all(|row| row.as_array().unwrap().len() == 1));
    }

    let paths = load_json(&dir.path().join("peaks_paths.json"));
    let root_paths = paths["paths"]["16"].as_object().unwrap();
    assert_eq!(root_paths.len(), 9);
    for (region, entry) in root_paths {
        let i = entry["i"].as_array().unwrap();
        let j = entry["j"].as_array().unwrap();
        assert_eq!(i.len(), j.len(), "{region}");
        assert_eq!(i[0].as_i64().unwrap(), 0);
        assert_eq!(j[0].as_i64().unwrap(), 0);
    }

    let cut = load_json(&dir.path().join("peaks_assignments.json"));
    assert_eq!(cut["n_clusters"].as_u64().unwrap(), 3);
    let labels = cut["assignments"].as_object().unwrap();
    assert_eq!(labels.len(), 9);
    let groups = [
        ["chr1:1000-1800", "chr1:5000-5800", "chr2:300-900"],
        ["chr2:7000-7800", "chr3:100-700", "chr3:900-1500"],
        ["chr4:10-610", "chr4:2000-2800", "chr5:400-1000"],
    ];
    let mut seen = Vec::new();
    for group in groups {
        let label = labels[group[0]].as_u64().unwrap();
        for region in group {
            assert_eq!(labels[region].as_u64().unwrap(), label, "{region} left its group");
        }
        seen.push(label);
    }
    seen.sort_unstable();
    assert_eq!(seen, [1, 2, 3]);
}

#[test]
fn multivariate_distances_only() {
    let dataset = DatasetReader::new(&fixture_path("two_marks.csv")).read().unwrap();
    assert_eq!(dataset.ndim(), 2);
    assert_eq!(dataset.names(), ["H3K4me3", "H3K27ac"]);

    let distances = pairwise_distances(&dataset, &Dtw::new(Metric::Cosine), Parallelism::single()).unwrap();
    let dir = TempDir::new().unwrap();
    let writer = ResultWriter::new(dir.path(), ExperimentName::new("marks").unwrap()).unwrap();
    let path = writer.write_distances(dataset.ids(), &distances).unwrap();

    let content = load_json(&path);
    let values: Vec<f64> = content["distances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|d| d.is_finite() && *d >= 0.0));
}

#[test]
fn points_of_interest_attach_to_dataset() {
    let dataset = DatasetReader::new(&fixture_path("peaks_9.csv")).read().unwrap();
    let poi = PointsOfInterestReader::new(&fixture_path("poi.csv")).read().unwrap();
    let dataset = dataset.with_points_of_interest(poi).unwrap();
    let attached = dataset.points_of_interest().unwrap();
    assert_eq!(attached[&RegionId::from("chr1:1000-1800")]["H3K4me3"], [3]);
}

#[test]
fn reader_fixture_files_match_expected_errors() {
    let read = |name: &str| DatasetReader::new(&fixture_path(name)).read();

    let result = read("empty.csv");
    assert!(matches!(result, Err(IoError::EmptyDataset { .. })), "empty.csv: {result:?}");

    let result = read("jagged.csv");
    assert!(
        matches!(result, Err(IoError::InconsistentRowLength { row_index: 1, .. })),
        "jagged.csv: {result:?}"
    );

    let result = read("nan.csv");
    assert!(matches!(result, Err(IoError::NonFiniteValue { .. })), "nan.csv: {result:?}");

    let result = read("inf.csv");
    assert!(matches!(result, Err(IoError::NonFiniteValue { .. })), "inf.csv: {result:?}");

    let result = read("duplicate_rows.csv");
    assert!(matches!(result, Err(IoError::DuplicateRow { .. })), "duplicate_rows.csv: {result:?}");

    let result = read("missing_dataset.csv");
    assert!(
        matches!(result, Err(IoError::MissingDatasetRow { .. })),
        "missing_dataset.csv: {result:?}"
    );
}
