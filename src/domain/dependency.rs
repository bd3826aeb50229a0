//! Dependency information structures

use super::PackageVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared dependency: a package name with its pinned version
///
/// Two values are considered the same dependency only when both name and
/// version match; cross-group dedup tracks names alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyDetails {
    /// Package name as declared in the manifest
    pub name: String,
    /// Currently declared version
    pub version: PackageVersion,
}

impl DependencyDetails {
    /// Creates a new dependency
    pub fn new(name: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Returns a copy of this dependency with the version replaced
    pub fn with_version(&self, version: PackageVersion) -> Self {
        Self {
            name: self.name.clone(),
            version,
        }
    }
}

impl fmt::Display for DependencyDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
