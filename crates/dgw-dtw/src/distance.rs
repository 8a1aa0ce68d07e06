//! DTW distance value returned by the kernel.

use std::cmp::Ordering;
use std::fmt;

/// A DTW distance, keeping the accumulated cost it was derived from.
///
/// When length normalisation is on, [`value`](Self::value) is the accumulated
/// cost divided by the longer input's unscaled length; otherwise the two agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtwDistance {
    value: f64,
    accumulated: f64,
}

impl DtwDistance {
    /// Build from the cost at the last cell, dividing by `norm_len` if given.
    pub(crate) fn from_accumulated(accumulated: f64, norm_len: Option<usize>) -> Self {
        let value = match norm_len {
            Some(len) => accumulated / len as f64,
            None => accumulated,
        };
        Self { value, accumulated }
    }

    /// The reported distance.
    #[must_use]
    pub fn value(self) -> f64 {
        self.value
    }

    /// Accumulated cost before normalisation.
    #[must_use]
    pub fn accumulated(self) -> f64 {
        self.accumulated
    }

    /// Total ordering on the reported value using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

impl PartialOrd for DtwDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for DtwDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.value)
    }
}

impl From<DtwDistance> for f64 {
    fn from(d: DtwDistance) -> Self {
        d.value
    }
}
