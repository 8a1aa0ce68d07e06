//! Validated experiment names used as artifact file prefixes.

use std::fmt;
use std::str::FromStr;

use crate::IoError;

/// Longest accepted name; leaves room for the artifact suffix in a
/// 255-byte file name.
const MAX_LEN: usize = 200;

/// Prefix shared by every artifact file of one run.
///
/// Restricted to `[a-zA-Z0-9_-]+` so it is always a single safe path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

impl ExperimentName {
    /// Validate `name` as an artifact prefix.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty, longer
    /// than 200 bytes, or contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, IoError> {
        let name = name.into();
        let valid = (1..=MAX_LEN).contains(&name.len()) && name.chars().all(is_name_char);
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// The name as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name `{experiment}_{suffix}.json`.
    #[must_use]
    pub fn artifact_file(&self, suffix: &str) -> String {
        format!("{}_{suffix}.json", self.0)
    }
}

impl FromStr for ExperimentName {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
