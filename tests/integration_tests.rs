//! Integration tests for depbot
//!
//! These tests verify:
//! - Configuration loading, defaulting and validation through the library
//! - Binary-level exit behavior for configuration errors

use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, body).unwrap();
    path
}

fn valid_config_json(project_dir: &Path) -> String {
    format!(
        r#"{{
  "repositoryType": "azureDevOps",
  "azureDevOps": {{
    "username": "bot",
    "email": "bot@example.com",
    "pat": "secret",
    "organization": "org",
    "project": "proj",
    "repository": "repo"
  }},
  "projects": [
    {{
      "type": "dotnet",
      "versionPolicy": "minor",
      "name": "Backend",
      "directories": ["{}"]
    }}
  ]
}}"#,
        project_dir.display()
    )
}

mod config_loading {
    use super::*;
    use depbot::config::{EcosystemKind, UpdaterConfig};

    #[test]
    fn test_valid_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join("backend");
        fs::create_dir(&project_dir).unwrap();
        let config_path = write_config(dir.path(), &valid_config_json(&project_dir));

        let mut config = UpdaterConfig::from_file(&config_path).unwrap();
        config.apply_defaults();
        config.validate().unwrap();

        let project = &config.projects[0];
        assert_eq!(project.kind, EcosystemKind::DotNet);
        // defaults kick in for omitted fields
        assert_eq!(project.groups, vec!["*"]);
        assert_eq!(
            project.dependency_configurations,
            vec!["https://api.nuget.org/v3/index.json"]
        );
    }

    #[test]
    fn test_missing_directory_fails_validation() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let config_path = write_config(dir.path(), &valid_config_json(&missing));

        let mut config = UpdaterConfig::from_file(&config_path).unwrap();
        config.apply_defaults();
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("directory not found"));
    }

    #[test]
    fn test_unknown_repository_type_fails_parsing() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(dir.path(), r#"{"repositoryType": "gitlab"}"#);
        assert!(UpdaterConfig::from_file(&config_path).is_err());
    }
}

mod binary_exit_codes {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;

    #[test]
    fn test_missing_config_file_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        Command::cargo_bin("depbot")
            .unwrap()
            .current_dir(dir.path())
            .arg("--config")
            .arg("does-not-exist.json")
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read config file"));
    }

    #[test]
    fn test_malformed_config_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(dir.path(), "{ not json");

        Command::cargo_bin("depbot")
            .unwrap()
            .arg("--config")
            .arg(&config_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to parse config file"));
    }

    #[test]
    fn test_empty_projects_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            dir.path(),
            r#"{
  "repositoryType": "azureDevOps",
  "azureDevOps": {
    "username": "bot",
    "email": "bot@example.com",
    "organization": "org",
    "project": "proj",
    "repository": "repo"
  },
  "projects": []
}"#,
        );

        Command::cargo_bin("depbot")
            .unwrap()
            .arg("--config")
            .arg(&config_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("at least one project"));
    }

    #[test]
    fn test_missing_host_field_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join("backend");
        fs::create_dir(&project_dir).unwrap();
        let config_path = write_config(
            dir.path(),
            &valid_config_json(&project_dir).replace(r#""organization": "org","#, ""),
        );

        Command::cargo_bin("depbot")
            .unwrap()
            .arg("--config")
            .arg(&config_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "organization must be provided",
            ));
    }

    #[test]
    fn test_repository_failure_exits_nonzero() {
        // a valid config pointed at a directory that is not a git checkout
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join("backend");
        fs::create_dir(&project_dir).unwrap();
        let config_path = write_config(dir.path(), &valid_config_json(&project_dir));

        Command::cargo_bin("depbot")
            .unwrap()
            .arg("--config")
            .arg(&config_path)
            .arg("--repo-path")
            .arg(dir.path())
            .assert()
            .failure();
    }
}
