//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: fatal configuration problems, reported before or at startup
//! - AdapterError: manifest IO/parse failures and hard registry errors
//! - RepositoryError: git and pull-request backend failures
//!
//! Per-dependency lookup misses and single-source outages are not errors;
//! they are logged and skipped where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Project adapter related errors
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Repository provider related errors
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors related to configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// No projects configured
    #[error("at least one project must be configured")]
    NoProjects,

    /// Two projects share the same name
    #[error("projects must have unique names")]
    DuplicateProjectNames,

    /// A project has no directories
    #[error("project '{project}': directories cannot be empty")]
    NoDirectories { project: String },

    /// A configured directory does not exist
    #[error("project '{project}': directory not found: {path}")]
    DirectoryNotFound { project: String, path: PathBuf },

    /// Neither a name nor per-directory naming was configured
    #[error("project name must be provided when eachDirectoryAsSeparate is not set")]
    MissingProjectName,

    /// Both a name and per-directory naming were configured
    #[error("project '{project}': name must not be provided when eachDirectoryAsSeparate is set")]
    ProjectNameConflict { project: String },

    /// A group/include/exclude pattern is not a valid glob
    #[error("project '{project}': invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        project: String,
        pattern: String,
        message: String,
    },

    /// A required host configuration field is missing
    #[error("{field} must be provided in the Azure DevOps configuration")]
    MissingHostField { field: &'static str },

    /// No adapter is wired for the requested ecosystem
    #[error("no adapter registered for ecosystem '{ecosystem}'")]
    AdapterNotRegistered { ecosystem: String },
}

/// Errors raised by project adapters
#[derive(Error, Debug)]
pub enum AdapterError {
    /// File system failure while scanning or rewriting project files
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A project file could not be parsed
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A project has no dependency sources to query
    #[error("no dependency sources configured for '{package}'")]
    NoSourcesConfigured { package: String },

    /// The registry rejected or failed a request
    #[error("failed to fetch '{package}' from {registry}: {message}")]
    Registry {
        package: String,
        registry: String,
        message: String,
    },

    /// The registry does not know the package
    #[error("package '{package}' not found in {registry}")]
    PackageNotFound { package: String, registry: String },

    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {message}")]
    HttpClient { message: String },
}

/// Errors raised by repository providers
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The git binary could not be spawned
    #[error("failed to run git: {source}")]
    GitSpawn {
        #[source]
        source: std::io::Error,
    },

    /// A git command exited with a failure status
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    /// The configured default branch does not exist
    #[error("branch '{branch}' doesn't exist")]
    BranchNotFound { branch: String },

    /// A host API call failed
    #[error("pull request API call failed: {message}")]
    Api { message: String },

    /// The host rejected the configured credentials
    #[error("invalid credentials for the repository host")]
    InvalidCredentials,
}

impl AdapterError {
    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AdapterError::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AdapterError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new Registry error
    pub fn registry(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AdapterError::Registry {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }
}

impl RepositoryError {
    /// Creates a new Git error from a failed command
    pub fn git(command: impl Into<String>, message: impl Into<String>) -> Self {
        RepositoryError::Git {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a new Api error
    pub fn api(message: impl Into<String>) -> Self {
        RepositoryError::Api {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_directory_not_found() {
        let err = ConfigError::DirectoryNotFound {
            project: "Backend".to_string(),
            path: PathBuf::from("/missing"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Backend"));
        assert!(msg.contains("/missing"));
    }

    #[test]
    fn test_config_error_missing_host_field() {
        let err = ConfigError::MissingHostField { field: "username" };
        assert!(format!("{}", err).contains("username must be provided"));
    }

    #[test]
    fn test_adapter_error_registry() {
        let err = AdapterError::registry("Serilog", "https://api.nuget.org", "HTTP 500");
        let msg = format!("{}", err);
        assert!(msg.contains("Serilog"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn test_adapter_error_no_sources() {
        let err = AdapterError::NoSourcesConfigured {
            package: "Serilog".to_string(),
        };
        assert!(format!("{}", err).contains("no dependency sources configured"));
    }

    #[test]
    fn test_repository_error_git() {
        let err = RepositoryError::git("push", "remote rejected");
        let msg = format!("{}", err);
        assert!(msg.contains("git push failed"));
        assert!(msg.contains("remote rejected"));
    }

    #[test]
    fn test_repository_error_branch_not_found() {
        let err = RepositoryError::BranchNotFound {
            branch: "dev".to_string(),
        };
        assert!(format!("{}", err).contains("branch 'dev' doesn't exist"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::NoProjects.into();
        assert!(format!("{}", app_err).contains("at least one project"));
    }

    #[test]
    fn test_app_error_from_adapter_error() {
        let app_err: AppError = AdapterError::parse("/a.csproj", "broken").into();
        assert!(format!("{}", app_err).contains("failed to parse"));
    }

    #[test]
    fn test_app_error_from_repository_error() {
        let app_err: AppError = RepositoryError::api("HTTP 401").into();
        assert!(format!("{}", app_err).contains("HTTP 401"));
    }
}
