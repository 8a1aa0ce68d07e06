//! Sequence utilities, the DTW kernel and the parallel pairwise engine.
//!
//! Pure math library with no I/O. Sequences are row-major `[L × D]` blocks of
//! `f64` with trailing all-NaN rows as padding. The kernel supports several
//! local metrics, a slanted band constraint, a warping penalty, optional
//! up-scaling of the shorter input, a reverse-orientation trial and length
//! normalisation.

mod constraint;
mod cost;
mod dataset;
mod distance;
mod dtw;
mod error;
mod matrix;
mod metric;
mod pairwise;
mod path;
mod pool;
mod scaling;
mod sequence;

pub use constraint::BandConstraint;
pub use cost::CostMatrix;
pub use dataset::{Dataset, DatasetScale, PointsOfInterest, RegionId};
pub use distance::DtwDistance;
pub use dtw::{Alignment, Dtw};
pub use error::{DtwError, EngineError};
pub use matrix::{DistanceMatrix, condensed_index, condensed_len, pair_at};
pub use metric::{Metric, ParseMetricError};
pub use pairwise::pairwise_distances;
pub use path::{WarpingPath, WarpingStep};
pub use pool::{Parallelism, WorkerPool};
pub use scaling::{ScaledSequence, uniform_scale_to, uniform_shrink_to};
pub use sequence::{Sequence, SequenceView};
