//! CSV readers for signal tracks and points of interest.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use dgw_dtw::{Dataset, PointsOfInterest, RegionId, Sequence};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads a wide signal-track CSV into a [`Dataset`].
///
/// Expected CSV format:
/// - Header `region_id,dataset,0,1,...,n`
/// - One row per `(region, dataset)` pair; every region needs a row for
///   every dataset, and all of a region's rows have the same length
/// - Trailing empty cells are padding, so regions may differ in length
///
/// Regions and datasets keep the order of their first appearance.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::BadHeader`] | Header does not start with `region_id,dataset` |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has more cells than the header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::InteriorGap`] | An empty cell is followed by a value |
/// | [`IoError::DuplicateRow`] | Same `(region, dataset)` pair appears twice |
/// | [`IoError::MissingDatasetRow`] | A region lacks a row for some dataset |
/// | [`IoError::RegionLengthMismatch`] | A region's datasets differ in length |
/// | [`IoError::InvalidDataset`] | A region has no values at all |
pub struct DatasetReader {
    path: PathBuf,
}

struct TrackRow {
    row_index: usize,
    values: Vec<f64>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let mut rdr = open_csv(&self.path)?;
        let header = rdr.headers().map_err(|e| csv_error(&self.path, e))?;
        if header.get(0) != Some("region_id") || header.get(1) != Some("dataset") {
            return Err(IoError::BadHeader {
                path: self.path.clone(),
                expected: "region_id,dataset",
            });
        }
        let expected_cols = header.len();
        debug!(bins = expected_cols - 2, "read CSV header");

        let mut regions: Vec<String> = Vec::new();
        let mut region_index: HashMap<String, usize> = HashMap::new();
        let mut datasets: Vec<String> = Vec::new();
        let mut dataset_index: HashMap<String, usize> = HashMap::new();
        let mut tracks: HashMap<(usize, usize), TrackRow> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            if record.len() > expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let region = record.get(0).unwrap_or("");
            let dataset = record.get(1).unwrap_or("");
            let r = *region_index.entry(region.to_string()).or_insert_with(|| {
                regions.push(region.to_string());
                regions.len() - 1
            });
            let d = *dataset_index.entry(dataset.to_string()).or_insert_with(|| {
                datasets.push(dataset.to_string());
                datasets.len() - 1
            });

            let values = self.parse_cells(row_index, record.iter().skip(2))?;
            if let Some(first) = tracks.get(&(r, d)) {
                return Err(IoError::DuplicateRow {
                    path: self.path.clone(),
                    region: region.to_string(),
                    dataset: dataset.to_string(),
                    first_row: first.row_index,
                    second_row: row_index,
                });
            }
            tracks.insert((r, d), TrackRow { row_index, values });
        }

        if regions.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let ndim = datasets.len();
        let mut sequences = Vec::with_capacity(regions.len());
        for (r, region) in regions.iter().enumerate() {
            let mut columns = Vec::with_capacity(ndim);
            for (d, dataset) in datasets.iter().enumerate() {
                let track = tracks.get(&(r, d)).ok_or_else(|| IoError::MissingDatasetRow {
                    path: self.path.clone(),
                    region: region.clone(),
                    dataset: dataset.clone(),
                })?;
                columns.push(&track.values);
            }
            let len = columns[0].len();
            if let Some((d, column)) = columns.iter().enumerate().find(|(_, c)| c.len() != len) {
                return Err(IoError::RegionLengthMismatch {
                    path: self.path.clone(),
                    region: region.clone(),
                    dataset: datasets[d].clone(),
                    expected: len,
                    got: column.len(),
                });
            }

            let mut values = Vec::with_capacity(len * ndim);
            for t in 0..len {
                values.extend(columns.iter().map(|column| column[t]));
            }
            sequences.push(Sequence::new(values, ndim).map_err(|e| self.invalid(e))?);
        }

        let ids = regions.into_iter().map(RegionId::new).collect();
        let dataset = Dataset::from_sequences(ids, datasets, &sequences).map_err(|e| self.invalid(e))?;
        info!(
            regions = dataset.len(),
            datasets = dataset.ndim(),
            max_len = dataset.max_len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse value cells; trailing empty cells are dropped as padding.
    fn parse_cells<'r>(
        &self,
        row_index: usize,
        cells: impl Iterator<Item = &'r str>,
    ) -> Result<Vec<f64>, IoError> {
        let mut values = Vec::new();
        let mut gap_at = None;
        for (col_index, raw) in cells.enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                gap_at.get_or_insert(col_index);
                continue;
            }
            if gap_at.is_some() {
                return Err(IoError::InteriorGap {
                    path: self.path.clone(),
                    row_index,
                    col_index,
                });
            }
            let value: f64 = raw
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| IoError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    col_index,
                    raw: raw.to_string(),
                })?;
            values.push(value);
        }
        Ok(values)
    }

    fn invalid(&self, source: dgw_dtw::DtwError) -> IoError {
        IoError::InvalidDataset {
            path: self.path.clone(),
            source,
        }
    }
}

/// Reads points of interest from a long CSV with header `region_id,dataset,bin`.
///
/// Bins are collected per region and dataset, sorted and deduplicated.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::BadHeader`] | Header is not `region_id,dataset,bin` |
/// | [`IoError::InvalidBin`] | A bin is not a non-negative integer |
pub struct PointsOfInterestReader {
    path: PathBuf,
}

impl PointsOfInterestReader {
    /// Create a reader for the points-of-interest CSV at `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read the file into `region → dataset → bins`, bins sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// See the table on [`PointsOfInterestReader`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<PointsOfInterest, IoError> {
        let mut rdr = open_csv(&self.path)?;
        let header = rdr.headers().map_err(|e| csv_error(&self.path, e))?;
        if header.iter().collect::<Vec<_>>() != ["region_id", "dataset", "bin"] {
            return Err(IoError::BadHeader {
                path: self.path.clone(),
                expected: "region_id,dataset,bin",
            });
        }

        let mut poi = PointsOfInterest::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            let raw = record.get(2).unwrap_or("").trim();
            let bin: usize = raw.parse().map_err(|_| IoError::InvalidBin {
                path: self.path.clone(),
                row_index,
                raw: raw.to_string(),
            })?;
            poi.entry(RegionId::new(record.get(0).unwrap_or("")))
                .or_default()
                .entry(record.get(1).unwrap_or("").to_string())
                .or_default()
                .push(bin);
        }
        for bins in poi.values_mut().flat_map(|per_dataset| per_dataset.values_mut()) {
            bins.sort_unstable();
            bins.dedup();
        }
        info!(regions = poi.len(), "points of interest loaded");
        Ok(poi)
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    // flexible(true) lets rows end early (trailing padding) and lets our own
    // InconsistentRowLength check fire for rows that run long.
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}
