//! Update orchestration engine
//!
//! Drives the sequential control loop over configured projects: for each
//! directory and each group, switch to the update branch, filter candidate
//! dependencies, resolve target versions through the per-entry cache, rewrite
//! manifests and run the commit / pull-request sequence. Strictly
//! single-threaded: the working copy and its checked-out branch are shared
//! mutable state, so groups are processed one at a time.

use crate::config::{Project, UpdaterConfig};
use crate::domain::{DependencyDetails, PackageVersion};
use crate::ecosystems::{AdapterRegistry, ProjectAdapter};
use crate::error::AppError;
use crate::repository::RepositoryProvider;
use crate::update::{filter_packages, select_target, VersionCache};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The update orchestrator
pub struct Updater {
    config: UpdaterConfig,
    adapters: AdapterRegistry,
    provider: Box<dyn RepositoryProvider>,
    repository_path: PathBuf,
}

impl Updater {
    /// Creates a new orchestrator over the given collaborators
    pub fn new(
        config: UpdaterConfig,
        adapters: AdapterRegistry,
        provider: Box<dyn RepositoryProvider>,
        repository_path: PathBuf,
    ) -> Self {
        Self {
            config,
            adapters,
            provider,
            repository_path,
        }
    }

    /// Processes every configured project entry in order
    ///
    /// Any collaborator error aborts the run; commits and pull requests
    /// already pushed for earlier groups remain in place.
    pub async fn run(&self) -> Result<(), AppError> {
        self.provider
            .clean_and_switch_to_default_branch(&self.repository_path)?;

        for project in &self.config.projects {
            let adapter = self.adapters.get(project.kind)?;
            // lookup results are shared across the entry's directories and
            // groups, then discarded with the cache when the entry ends
            let mut cache = VersionCache::new();
            for directory in &project.directories {
                self.process_directory(project, adapter.as_ref(), &mut cache, directory)
                    .await?;
            }
        }

        // the run always ends on the default branch, even when the last
        // group produced nothing to commit
        self.provider
            .clean_and_switch_to_default_branch(&self.repository_path)?;
        Ok(())
    }

    async fn process_directory(
        &self,
        project: &Project,
        adapter: &dyn ProjectAdapter,
        cache: &mut VersionCache,
        directory: &Path,
    ) -> Result<(), AppError> {
        let files = adapter.project_files(directory)?;
        let project_name = resolve_project_name(project, directory);
        let all_packages = adapter.extract_all_packages(&files).await?;
        debug!(
            "found packages {:?} in projects {:?}",
            all_packages, files
        );

        let mut already_processed: HashSet<String> = HashSet::new();
        for group in &project.groups {
            self.provider
                .switch_to_update_branch(&self.repository_path, &project_name, group)?;

            let candidates = filter_packages(&all_packages, &already_processed, group, project);
            if candidates.is_empty() {
                continue;
            }
            debug!("filtered packages {:?}", candidates);

            let to_update = self
                .resolve_updates(&candidates, adapter, project, cache)
                .await?;
            // claimed before the write happens: a dependency belongs to at
            // most one group per directory even if the rewrite is a no-op
            already_processed.extend(to_update.iter().map(|package| package.name.clone()));
            if to_update.is_empty() {
                continue;
            }

            let updates = adapter.apply_updates(project, &files, &to_update)?;
            if updates.is_empty() {
                continue;
            }
            info!("updated packages {:?}", updates);

            self.provider
                .commit_changes(&self.repository_path, &project_name, group)?;
            self.provider
                .submit_pull_request(&updates, &project_name, group)
                .await?;
            self.provider
                .clean_and_switch_to_default_branch(&self.repository_path)?;
        }

        Ok(())
    }

    /// Resolves the target version for each candidate, consulting the cache
    /// before the adapter
    async fn resolve_updates(
        &self,
        candidates: &[DependencyDetails],
        adapter: &dyn ProjectAdapter,
        project: &Project,
        cache: &mut VersionCache,
    ) -> Result<HashSet<DependencyDetails>, AppError> {
        let mut to_update = HashSet::new();
        for package in candidates {
            debug!("processing {}", package);
            let versions = self
                .cached_versions(package, adapter, project, cache)
                .await?;
            let available: Vec<PackageVersion> =
                versions.iter().map(|candidate| candidate.version).collect();

            let Some(target) =
                select_target(&available, package.version, project.version_policy)
            else {
                warn!("{} unable to find in sources", package.name);
                continue;
            };
            if target == package.version {
                info!("{} no new version found", package.name);
                continue;
            }

            info!("{} new version {} available", package.name, target);
            to_update.insert(package.with_version(target));
        }
        Ok(to_update)
    }

    async fn cached_versions(
        &self,
        package: &DependencyDetails,
        adapter: &dyn ProjectAdapter,
        project: &Project,
        cache: &mut VersionCache,
    ) -> Result<Vec<DependencyDetails>, AppError> {
        if let Some(hit) = cache.get(&package.name) {
            return Ok(hit.to_vec());
        }
        let fetched = adapter.versions(package, project).await?;
        cache.insert(package.name.clone(), fetched.clone());
        Ok(fetched)
    }
}

/// The effective project name for a directory
///
/// Per-directory projects take the directory's leaf name, everything else
/// uses the configured name.
fn resolve_project_name(project: &Project, directory: &Path) -> String {
    if !project.each_directory_as_separate {
        return project.name.clone();
    }
    directory
        .file_name()
        .map(|leaf| leaf.to_string_lossy().into_owned())
        .unwrap_or_else(|| directory.display().to_string())
}
