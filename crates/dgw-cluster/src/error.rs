use dgw_dtw::{DtwError, EngineError};

/// Errors from linkage, tree, prototype and path operations.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Returned when fewer than two regions are clustered.
    #[error("need at least 2 regions to build a hierarchy, got {n}")]
    TooFewRegions {
        /// Number of regions provided.
        n: usize,
    },

    /// Returned when a target cluster count is zero.
    #[error("cluster count must be at least 1, got {k}")]
    InvalidClusterCount {
        /// The rejected count.
        k: usize,
    },

    /// Returned when a cut threshold is negative or NaN.
    #[error("cut threshold must be a non-negative number, got {t}")]
    InvalidThreshold {
        /// The rejected threshold.
        t: f64,
    },

    /// Returned when the condensed distance vector holds NaN or an infinity.
    #[error("distance at condensed index {index} is not finite ({value})")]
    NonFiniteDistance {
        /// Position in the condensed vector.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when a persisted linkage matrix is malformed.
    #[error("invalid linkage at row {row}: {reason}")]
    InvalidLinkage {
        /// Zero-based row index.
        row: usize,
        /// Short description of the violated rule.
        reason: &'static str,
    },

    /// Returned when `mean` prototyping is paired with anything other than
    /// `slanted_band(0)` and `scale_first`.
    #[error("mean prototyping requires slanted_band(0) and scale_first=true")]
    IncompatibleMeanConfig,

    /// Returned when a node id does not exist in the tree.
    #[error("node {id} is not in the tree")]
    UnknownNode {
        /// The missing node id.
        id: usize,
    },

    /// Wraps a DTW error raised on the calling thread.
    #[error("DTW error: {0}")]
    Dtw(#[from] DtwError),

    /// Wraps an error raised by the worker pool.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
