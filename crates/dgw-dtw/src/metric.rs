//! Local (per-cell) distance between two sequence rows.

use std::fmt;
use std::str::FromStr;

/// Local cost metric between two rows of equal dimensionality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Sum of squared differences.
    #[default]
    SqEuclidean,
    /// Square root of the sum of squared differences.
    Euclidean,
    /// `1 - cos(a, b)`. Undefined (NaN) when either row is the zero vector.
    Cosine,
}

impl Metric {
    /// Distance between rows `a` and `b`.
    ///
    /// Both slices must have the same length. Callers must not pass zero rows to
    /// [`Metric::Cosine`]; `log(1 + x)` scaled signal never contains them.
    #[inline]
    #[must_use]
    pub fn cost(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::SqEuclidean => sq_euclidean(a, b),
            Self::Euclidean => sq_euclidean(a, b).sqrt(),
            Self::Cosine => {
                let mut dot = 0.0;
                let mut norm_a = 0.0;
                let mut norm_b = 0.0;
                for (x, y) in a.iter().zip(b) {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
            }
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SqEuclidean => "sqeuclidean",
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
        }
    }
}

#[inline]
fn sq_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric \"{0}\" (expected sqeuclidean, euclidean or cosine)")]
pub struct ParseMetricError(String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqeuclidean" => Ok(Self::SqEuclidean),
            "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            other => Err(ParseMetricError(other.to_string())),
        }
    }
}
