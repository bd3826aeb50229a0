//! Applied update records

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single manifest change that has actually been written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Name of the updated package
    pub package_name: String,
    /// Version string before the rewrite
    pub old_version: String,
    /// Version string after the rewrite
    pub new_version: String,
}

impl UpdateResult {
    /// Creates a new update record
    pub fn new(
        package_name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
        }
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.package_name, self.old_version, self.new_version
        )
    }
}
