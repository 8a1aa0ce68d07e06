//! File I/O, validation, and serialization for the DGW pipeline.

mod error;
mod experiment;
mod reader;
mod writer;

pub use error::IoError;
pub use experiment::ExperimentName;
pub use reader::{DatasetReader, PointsOfInterestReader};
pub use writer::{ResultWriter, read_linkage};
