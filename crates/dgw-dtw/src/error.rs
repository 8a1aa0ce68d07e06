//! Error types for sequence handling, DTW computation and the worker engines.

/// Errors from sequence validation, scaling and DTW computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DtwError {
    /// Returned when a sequence has zero non-padded rows.
    #[error("sequence must have at least one non-padded row")]
    EmptySequence,

    /// Returned when a row has NaN in some but not all dimensions, or when
    /// data follows the first all-NaN padding row.
    #[error("inconsistent NaN padding at row {row}")]
    InconsistentPadding {
        /// Zero-based row index of the offending row.
        row: usize,
    },

    /// Returned when `uniform_scale_to` is asked to produce a shorter sequence.
    #[error("cannot scale a sequence of length {length} down to {target}")]
    ShrinkNotAllowed {
        /// Requested length.
        target: usize,
        /// Semantic length of the input.
        length: usize,
    },

    /// Returned when `uniform_shrink_to` is asked to produce a longer sequence.
    #[error("cannot shrink a sequence of length {length} up to {target}")]
    ExpandNotAllowed {
        /// Requested length.
        target: usize,
        /// Semantic length of the input.
        length: usize,
    },

    /// Returned when buffer sizes or dimensionalities disagree.
    #[error("dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being checked.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when a slanted band width is negative.
    #[error("slanted band width must be non-negative, got {k}")]
    InvalidConstraint {
        /// The rejected band width.
        k: i64,
    },

    /// Returned when the warping penalty is negative or not finite.
    #[error("warping penalty must be a finite non-negative number, got {value}")]
    InvalidWarpingPenalty {
        /// The rejected penalty.
        value: f64,
    },

    /// Returned when a warping path is malformed.
    #[error("invalid warping path: {reason}")]
    InvalidPath {
        /// Short description of the violated rule.
        reason: &'static str,
    },

    /// Returned when the band admits no warping path from `(0, 0)` to the
    /// last cell, or the accumulated cost there is not finite.
    #[error("no warping path joins the corners of a {len_a} x {len_b} alignment")]
    NoAdmissiblePath {
        /// Rows of the aligned first sequence.
        len_a: usize,
        /// Rows of the aligned second sequence.
        len_b: usize,
    },

    /// Returned when the same region id is supplied twice.
    #[error("duplicate region id \"{id}\"")]
    DuplicateRegionId {
        /// The duplicated id.
        id: String,
    },

    /// Returned when a region id is not present in the dataset.
    #[error("unknown region id \"{id}\"")]
    UnknownRegion {
        /// The id that was looked up.
        id: String,
    },

    /// Returned when `log_scaled` is applied to an already log-scaled dataset.
    #[error("dataset is already log-scaled")]
    AlreadyLogScaled,

    /// Returned when a value cannot be passed through `log(1 + x)`.
    #[error("value {value} at region {region}, row {row} is outside the domain of log(1 + x)")]
    LogScaleDomain {
        /// Region index.
        region: usize,
        /// Row within the region.
        row: usize,
        /// The offending value.
        value: f64,
    },
}

/// Errors from the parallel pairwise and path engines.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Returned when the requested worker count is zero or exceeds the CPU count.
    #[error("parallelism must be between 1 and {available}, got {requested}")]
    InvalidParallelism {
        /// Requested worker count.
        requested: usize,
        /// Number of CPUs available.
        available: usize,
    },

    /// A worker failed while processing a unit of work.
    #[error("worker {worker} failed: {source}")]
    WorkerFailure {
        /// Index of the failing worker.
        worker: usize,
        /// The error raised on the worker.
        #[source]
        source: DtwError,
    },

    /// A worker panicked while processing a unit of work.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the panicking worker.
        worker: usize,
    },

    /// Wraps a DTW error raised on the coordinating thread.
    #[error(transparent)]
    Dtw(#[from] DtwError),
}
