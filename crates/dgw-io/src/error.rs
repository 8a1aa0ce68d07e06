//! I/O error types for dgw-io.

use std::path::PathBuf;

use dgw_cluster::ClusterError;
use dgw_dtw::DtwError;

/// Errors from file I/O, CSV parsing, dataset assembly and artifact serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header does not start with the expected key columns.
    #[error("header of {path} must start with {expected}")]
    BadHeader {
        /// Path to the CSV file.
        path: PathBuf,
        /// The expected leading columns.
        expected: &'static str,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has more cells than the header.
    #[error("row {row_index} of {path} has {got} columns, header has {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell is NaN, infinite or not a number.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based column index (excluding key columns).
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a bin index is not a non-negative integer.
    #[error("invalid bin index in {path}: row {row_index}, raw value \"{raw}\"")]
    InvalidBin {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when an empty cell is followed by a value; padding must be trailing.
    #[error("gap in {path}: row {row_index} has an empty cell before column {col_index}")]
    InteriorGap {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based column index of the value after the gap.
        col_index: usize,
    },

    /// Returned when the same `(region, dataset)` pair appears twice.
    #[error("duplicate row for region \"{region}\", dataset \"{dataset}\" in {path}: rows {first_row} and {second_row}")]
    DuplicateRow {
        /// Path to the CSV file.
        path: PathBuf,
        /// Region id.
        region: String,
        /// Dataset name.
        dataset: String,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when a region has no row for one of the datasets.
    #[error("region \"{region}\" has no row for dataset \"{dataset}\" in {path}")]
    MissingDatasetRow {
        /// Path to the CSV file.
        path: PathBuf,
        /// Region id.
        region: String,
        /// Dataset name.
        dataset: String,
    },

    /// Returned when the datasets of one region have different lengths.
    #[error("region \"{region}\" in {path}: dataset \"{dataset}\" has {got} bins, expected {expected}")]
    RegionLengthMismatch {
        /// Path to the CSV file.
        path: PathBuf,
        /// Region id.
        region: String,
        /// Dataset name.
        dataset: String,
        /// Length of the region's first dataset.
        expected: usize,
        /// Length of this dataset.
        got: usize,
    },

    /// Returned when the parsed values do not form a valid dataset.
    #[error("invalid dataset in {path}")]
    InvalidDataset {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying validation error.
        source: DtwError,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be encoded or decoded as JSON.
    #[error("JSON error in {path}")]
    Json {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    /// Returned when a path index does not fit the int32 artifact format.
    #[error("path index {value} does not fit in int32")]
    IndexOverflow {
        /// The offending index.
        value: usize,
    },

    /// Wraps a clustering failure raised while gathering artifacts.
    #[error("clustering error: {0}")]
    Cluster(#[from] ClusterError),
}
