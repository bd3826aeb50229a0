//! Project adapters for the supported ecosystems
//!
//! This module provides:
//! - The `ProjectAdapter` contract the orchestrator drives
//! - A strategy table resolving adapters by ecosystem tag
//! - The .NET/NuGet adapter (csproj and friends)
//! - The npm adapter (package.json)

mod client;
mod npm;
mod nuget;

pub use client::HttpClient;
pub use npm::NpmAdapter;
pub use nuget::NuGetAdapter;

use crate::config::{EcosystemKind, Project};
use crate::domain::{DependencyDetails, UpdateResult};
use crate::error::{AdapterError, ConfigError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ecosystem-specific collaborator for reading and rewriting project files
/// and querying registries
#[async_trait]
pub trait ProjectAdapter: Send + Sync {
    /// The ecosystem this adapter handles
    fn ecosystem(&self) -> EcosystemKind;

    /// Finds all project files under a directory, in a stable order
    fn project_files(&self, search_path: &Path) -> Result<Vec<PathBuf>, AdapterError>;

    /// Parses the given files and unions the declared dependencies,
    /// deduplicated by (name, version)
    async fn extract_all_packages(
        &self,
        files: &[PathBuf],
    ) -> Result<HashSet<DependencyDetails>, AdapterError>;

    /// Queries the project's configured sources for available versions
    ///
    /// An unreachable source or a package unknown to one source is skipped
    /// with a warning; the remaining sources still contribute candidates.
    /// Having no sources configured at all is a hard error.
    async fn versions(
        &self,
        package: &DependencyDetails,
        project: &Project,
    ) -> Result<Vec<DependencyDetails>, AdapterError>;

    /// Rewrites declarations matching the given dependencies to their new
    /// versions, preserving file formatting
    ///
    /// Returns one record per changed declaration; files without a matching
    /// change are not rewritten.
    fn apply_updates(
        &self,
        project: &Project,
        files: &[PathBuf],
        to_update: &HashSet<DependencyDetails>,
    ) -> Result<Vec<UpdateResult>, AdapterError>;
}

/// Strategy table resolving a `ProjectAdapter` by ecosystem tag
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<EcosystemKind, Arc<dyn ProjectAdapter>>,
}

impl AdapterRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with all built-in adapters wired up
    pub fn with_builtins() -> Result<Self, AdapterError> {
        let client = HttpClient::new()?;
        let mut registry = Self::new();
        registry.register(Arc::new(NuGetAdapter::new(client.clone())));
        registry.register(Arc::new(NpmAdapter::new(client)));
        Ok(registry)
    }

    /// Registers an adapter under its own ecosystem tag
    pub fn register(&mut self, adapter: Arc<dyn ProjectAdapter>) {
        self.adapters.insert(adapter.ecosystem(), adapter);
    }

    /// Looks up the adapter for an ecosystem
    pub fn get(&self, kind: EcosystemKind) -> Result<Arc<dyn ProjectAdapter>, ConfigError> {
        self.adapters
            .get(&kind)
            .cloned()
            .ok_or(ConfigError::AdapterNotRegistered {
                ecosystem: kind.to_string(),
            })
    }
}

/// Registry version strings with a prerelease marker are never offered
pub(crate) fn is_prerelease(version: &str) -> bool {
    version.contains('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_builtins_resolves_all_ecosystems() {
        let registry = AdapterRegistry::with_builtins().unwrap();
        assert!(registry.get(EcosystemKind::DotNet).is_ok());
        assert!(registry.get(EcosystemKind::Npm).is_ok());
    }

    #[test]
    fn test_empty_registry_reports_missing_adapter() {
        let registry = AdapterRegistry::new();
        let err = registry.get(EcosystemKind::Npm).err().unwrap();
        assert!(format!("{}", err).contains("npm"));
    }

    #[test]
    fn test_registered_adapter_is_keyed_by_its_ecosystem() {
        let client = HttpClient::new().unwrap();
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(NpmAdapter::new(client)));
        assert!(registry.get(EcosystemKind::Npm).is_ok());
        assert!(registry.get(EcosystemKind::DotNet).is_err());
    }

    #[test]
    fn test_is_prerelease() {
        assert!(is_prerelease("2.0.0-beta.1"));
        assert!(is_prerelease("19.3.0-canary-52684925"));
        assert!(!is_prerelease("2.0.0"));
    }
}
