//! Run configuration: DTW kernel, prototyping scheme and worker count.

use std::fmt;
use std::str::FromStr;

use dgw_dtw::{BandConstraint, Dtw, Metric, Parallelism};

use crate::error::ClusterError;

/// Scheme used to merge two child prototypes into their parent's prototype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrototypingMethod {
    /// Prioritised Shape Averaging: blended samples are repeated according to
    /// the subtree weights before shrinking.
    Psa,
    /// One weighted blend per path step.
    #[default]
    Standard,
    /// One unweighted blend per path step; every subtree counts equally.
    StandardUnweighted,
    /// Plain mean. Runs as [`Standard`](Self::Standard) under a
    /// `slanted_band(0)` + `scale_first` kernel, see
    /// [`ClusteringConfig::mean_prototyping`].
    Mean,
}

impl PrototypingMethod {
    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Psa => "psa",
            Self::Standard => "standard",
            Self::StandardUnweighted => "standard-unweighted",
            Self::Mean => "mean",
        }
    }
}

impl fmt::Display for PrototypingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown prototyping method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown prototyping method \"{0}\" (expected psa, standard, standard-unweighted or mean)")]
pub struct ParsePrototypingMethodError(String);

impl FromStr for PrototypingMethod {
    type Err = ParsePrototypingMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "psa" => Ok(Self::Psa),
            "standard" => Ok(Self::Standard),
            "standard-unweighted" => Ok(Self::StandardUnweighted),
            "mean" => Ok(Self::Mean),
            other => Err(ParsePrototypingMethodError(other.to_string())),
        }
    }
}

/// Configuration for a hierarchical clustering run.
///
/// # Defaults
///
/// | Parameter            | Default                          |
/// |----------------------|----------------------------------|
/// | `prototyping_method` | `PrototypingMethod::Standard`    |
/// | `parallelism`        | `Parallelism::available()`       |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringConfig {
    pub(crate) dtw: Dtw,
    pub(crate) prototyping_method: PrototypingMethod,
    pub(crate) parallelism: Parallelism,
}

impl ClusteringConfig {
    /// Create a configuration around a DTW kernel.
    #[must_use]
    pub fn new(dtw: Dtw) -> Self {
        Self {
            dtw,
            prototyping_method: PrototypingMethod::default(),
            parallelism: Parallelism::available(),
        }
    }

    /// Build the `mean` configuration: a `slanted_band(0)` kernel with
    /// `scale_first` enabled and otherwise default options.
    #[must_use]
    pub fn mean_prototyping(metric: Metric) -> Self {
        let dtw = Dtw::new(metric)
            .with_constraint(BandConstraint::SlantedBand(0))
            .with_scale_first(true);
        Self::new(dtw).with_prototyping_method(PrototypingMethod::Mean)
    }

    /// Set the prototyping scheme.
    #[must_use]
    pub fn with_prototyping_method(mut self, method: PrototypingMethod) -> Self {
        self.prototyping_method = method;
        self
    }

    /// Set the number of worker threads for the pairwise and path engines.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Check that the options are compatible with each other.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::IncompatibleMeanConfig`] | `mean` without `slanted_band(0)` and `scale_first` |
    pub fn validate(&self) -> Result<(), ClusterError> {
        let mean_ready = self.dtw.constraint() == BandConstraint::SlantedBand(0) && self.dtw.scale_first();
        if self.prototyping_method == PrototypingMethod::Mean && !mean_ready {
            return Err(ClusterError::IncompatibleMeanConfig);
        }
        Ok(())
    }

    /// Return the DTW kernel.
    #[must_use]
    pub fn dtw(&self) -> &Dtw {
        &self.dtw
    }

    /// Return the prototyping scheme.
    #[must_use]
    pub fn prototyping_method(&self) -> PrototypingMethod {
        self.prototyping_method
    }

    /// Return the worker count.
    #[must_use]
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }
}
