//! Repository providers
//!
//! This module provides:
//! - The `RepositoryProvider` contract for branch, commit and pull-request
//!   handling
//! - The deterministic update-branch naming rule shared by all providers
//! - The Azure DevOps provider

mod azure_devops;

pub use azure_devops::AzureDevOps;

use crate::config::{RepositoryKind, UpdaterConfig};
use crate::domain::UpdateResult;
use crate::error::RepositoryError;
use async_trait::async_trait;
use std::path::Path;

/// Host-specific collaborator manipulating branches, commits and pull
/// requests
///
/// Implementations must be idempotent against re-runs: committing with a
/// clean working tree and submitting a pull request that already exists are
/// successful no-ops.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Discards local changes, fetches, and checks out the configured target
    /// branch; fails when that branch does not exist upstream
    fn clean_and_switch_to_default_branch(&self, repo_path: &Path) -> Result<(), RepositoryError>;

    /// Checks out the update branch for a (project, group) pair, creating it
    /// from the default branch when absent
    fn switch_to_update_branch(
        &self,
        repo_path: &Path,
        project_name: &str,
        group: &str,
    ) -> Result<(), RepositoryError>;

    /// Stages all changes, commits and pushes; a clean working tree is a
    /// no-op
    fn commit_changes(
        &self,
        repo_path: &Path,
        project_name: &str,
        group: &str,
    ) -> Result<(), RepositoryError>;

    /// Opens a pull request for the update branch unless an equivalent one
    /// is already open
    async fn submit_pull_request(
        &self,
        updates: &[UpdateResult],
        project_name: &str,
        group: &str,
    ) -> Result<(), RepositoryError>;
}

/// Creates the provider selected by the configuration
pub fn create_provider(
    config: &UpdaterConfig,
) -> Result<Box<dyn RepositoryProvider>, RepositoryError> {
    match config.repository_type {
        RepositoryKind::AzureDevOps => {
            Ok(Box::new(AzureDevOps::new(config.azure_dev_ops.clone())?))
        }
    }
}

/// Derives the update branch name for a (project, group) pair
///
/// The name is `prefix/project/group` lowercased, with `.` mapped to `/` and
/// `*` mapped to `asterix`, so every configurable group pattern yields a
/// valid git ref.
pub fn update_branch_name(prefix: &str, project_name: &str, group: &str) -> String {
    format!("{}/{}/{}", prefix, project_name, group)
        .to_lowercase()
        .replace('.', "/")
        .replace('*', "asterix")
}
