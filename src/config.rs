//! Configuration model, defaults and startup validation
//!
//! The configuration is bound from a JSON file. Defaults are applied after
//! loading (`apply_defaults`), then the whole tree is validated before the
//! orchestrator starts; every validation problem is fatal.

use crate::error::ConfigError;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported project ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcosystemKind {
    DotNet,
    Npm,
}

impl EcosystemKind {
    /// Default registry sources used when none are configured
    pub fn default_sources(&self) -> Vec<String> {
        match self {
            EcosystemKind::DotNet => vec!["https://api.nuget.org/v3/index.json".to_string()],
            EcosystemKind::Npm => vec!["https://registry.npmjs.org".to_string()],
        }
    }
}

impl fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcosystemKind::DotNet => write!(f, "dotnet"),
            EcosystemKind::Npm => write!(f, "npm"),
        }
    }
}

/// How large a version jump a project accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    #[default]
    Major,
    Minor,
    Patch,
}

/// Supported version-control hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepositoryKind {
    AzureDevOps,
}

/// One configured project entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Ecosystem handled by this entry
    #[serde(rename = "type")]
    pub kind: EcosystemKind,

    /// Version-selection policy
    #[serde(default)]
    pub version_policy: UpdatePolicy,

    /// Project name used in branches and pull requests
    #[serde(default)]
    pub name: String,

    /// Use each directory's leaf name as the project name instead
    #[serde(default)]
    pub each_directory_as_separate: bool,

    /// Directories scanned for project files, in order
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// Registry/source locators queried for versions
    #[serde(default)]
    pub dependency_configurations: Vec<String>,

    /// Glob patterns splitting dependencies into branch/PR units
    #[serde(default)]
    pub groups: Vec<String>,

    /// If non-empty, only dependencies matching one of these patterns
    #[serde(default)]
    pub include: Vec<String>,

    /// Dependencies matching any of these patterns are skipped
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Project {
    /// Fills in defaulted fields that were omitted from the config file
    pub fn apply_defaults(&mut self) {
        if self.groups.is_empty() {
            self.groups = vec!["*".to_string()];
        }
        if self.dependency_configurations.is_empty() {
            self.dependency_configurations = self.kind.default_sources();
        }
    }

    /// Validates this entry, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directories.is_empty() {
            return Err(ConfigError::NoDirectories {
                project: self.label(),
            });
        }

        for directory in &self.directories {
            if !directory.is_dir() {
                return Err(ConfigError::DirectoryNotFound {
                    project: self.label(),
                    path: directory.clone(),
                });
            }
        }

        if !self.each_directory_as_separate && self.name.is_empty() {
            return Err(ConfigError::MissingProjectName);
        }

        if self.each_directory_as_separate && !self.name.is_empty() {
            return Err(ConfigError::ProjectNameConflict {
                project: self.label(),
            });
        }

        for pattern in self
            .groups
            .iter()
            .chain(self.include.iter())
            .chain(self.exclude.iter())
        {
            if let Err(err) = Pattern::new(pattern) {
                return Err(ConfigError::InvalidPattern {
                    project: self.label(),
                    pattern: pattern.clone(),
                    message: err.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Name used in error messages; per-directory projects have none
    fn label(&self) -> String {
        if self.name.is_empty() {
            self.directories
                .first()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "<unnamed>".to_string())
        } else {
            self.name.clone()
        }
    }
}

/// Azure DevOps host settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDevOpsConfig {
    /// Committer name
    #[serde(default)]
    pub username: String,

    /// Committer email
    #[serde(default)]
    pub email: String,

    /// Personal access token used for the REST API
    #[serde(default)]
    pub pat: String,

    /// Azure DevOps organization
    #[serde(default)]
    pub organization: String,

    /// Azure DevOps project
    #[serde(default)]
    pub project: String,

    /// Repository name within the project
    #[serde(default)]
    pub repository: String,

    /// Work item to link to created pull requests
    #[serde(default)]
    pub work_item_id: Option<u64>,

    /// Branch pull requests target
    #[serde(default = "default_target_branch")]
    pub target_branch_name: String,

    /// Prefix for update branches
    #[serde(default = "default_branch_prefix")]
    pub branch_name: String,

    /// Set created pull requests to auto-complete
    #[serde(default = "default_auto_complete")]
    pub auto_complete: bool,
}

fn default_target_branch() -> String {
    "dev".to_string()
}

fn default_branch_prefix() -> String {
    "updateDependencies".to_string()
}

fn default_auto_complete() -> bool {
    true
}

impl AzureDevOpsConfig {
    /// Validates that all required host fields are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("username", &self.username),
            ("email", &self.email),
            ("organization", &self.organization),
            ("project", &self.project),
            ("repository", &self.repository),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ConfigError::MissingHostField { field });
            }
        }
        Ok(())
    }
}

/// Root configuration tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdaterConfig {
    /// Which repository host to drive
    pub repository_type: RepositoryKind,

    /// Azure DevOps settings, required when the host is Azure DevOps
    #[serde(default)]
    pub azure_dev_ops: AzureDevOpsConfig,

    /// Projects to process, in order
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl UpdaterConfig {
    /// Loads the configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Applies defaults to every project entry
    pub fn apply_defaults(&mut self) {
        for project in &mut self.projects {
            project.apply_defaults();
        }
    }

    /// Validates the whole tree, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.projects.is_empty() {
            return Err(ConfigError::NoProjects);
        }

        let mut names: Vec<&str> = self
            .projects
            .iter()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort_unstable();
        names.dedup();
        let named_count = self
            .projects
            .iter()
            .filter(|p| !p.name.is_empty())
            .count();
        if names.len() != named_count {
            return Err(ConfigError::DuplicateProjectNames);
        }

        match self.repository_type {
            RepositoryKind::AzureDevOps => self.azure_dev_ops.validate()?,
        }

        for project in &self.projects {
            project.validate()?;
        }

        Ok(())
    }
}
