//! npm project adapter
//!
//! Scans package.json files, extracts `dependencies` and `devDependencies`
//! and queries npm-compatible registries at `{source}/{package}`. Rewrites
//! preserve the file's formatting and any `^`/`~` range prefix.

use super::{is_prerelease, HttpClient, ProjectAdapter};
use crate::config::{EcosystemKind, Project};
use crate::domain::{DependencyDetails, PackageVersion, UpdateResult};
use crate::error::AdapterError;
use async_trait::async_trait;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Manifest sections holding updatable declarations
const DEPENDENCY_SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];

/// Adapter for Node.js projects backed by npm registries
pub struct NpmAdapter {
    client: HttpClient,
}

/// npm package metadata response
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    versions: HashMap<String, Value>,
}

impl NpmAdapter {
    /// Creates a new npm adapter
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetches the stable versions of one package from one registry
    async fn versions_from_source(
        &self,
        source: &str,
        package: &str,
    ) -> Result<Vec<PackageVersion>, AdapterError> {
        let url = format!("{}/{}", source.trim_end_matches('/'), package);
        let response: NpmPackageResponse = self.client.get_json(&url, package, source).await?;

        Ok(response
            .versions
            .keys()
            .filter(|version| !is_prerelease(version))
            .filter_map(|version| version.parse().ok())
            .collect())
    }
}

#[async_trait]
impl ProjectAdapter for NpmAdapter {
    fn ecosystem(&self) -> EcosystemKind {
        EcosystemKind::Npm
    }

    fn project_files(&self, search_path: &Path) -> Result<Vec<PathBuf>, AdapterError> {
        let root = Pattern::escape(&search_path.display().to_string());
        let pattern = format!("{}/**/package.json", root);
        let entries =
            glob::glob(&pattern).map_err(|err| AdapterError::parse(search_path, err.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    // installed packages carry their own manifests
                    if !path.components().any(|c| c.as_os_str() == "node_modules") {
                        files.push(path);
                    }
                }
                Err(err) => {
                    let path = err.path().to_path_buf();
                    return Err(AdapterError::io(path, err.into_error()));
                }
            }
        }
        files.sort();
        Ok(files)
    }

    async fn extract_all_packages(
        &self,
        files: &[PathBuf],
    ) -> Result<HashSet<DependencyDetails>, AdapterError> {
        let mut packages = HashSet::new();
        for file in files {
            let content =
                fs::read_to_string(file).map_err(|source| AdapterError::io(file, source))?;
            packages.extend(parse_manifest(&content, file)?);
        }
        Ok(packages)
    }

    async fn versions(
        &self,
        package: &DependencyDetails,
        project: &Project,
    ) -> Result<Vec<DependencyDetails>, AdapterError> {
        if project.dependency_configurations.is_empty() {
            return Err(AdapterError::NoSourcesConfigured {
                package: package.name.clone(),
            });
        }

        let mut found = HashSet::new();
        for source in &project.dependency_configurations {
            match self.versions_from_source(source, &package.name).await {
                Ok(versions) => found.extend(versions),
                Err(err) => warn!("skipping source {source}: {err}"),
            }
        }

        Ok(found
            .into_iter()
            .map(|version| package.with_version(version))
            .collect())
    }

    fn apply_updates(
        &self,
        _project: &Project,
        files: &[PathBuf],
        to_update: &HashSet<DependencyDetails>,
    ) -> Result<Vec<UpdateResult>, AdapterError> {
        let mut results = Vec::new();
        for file in files {
            results.extend(update_manifest(file, to_update)?);
        }
        Ok(results)
    }
}

/// Extracts declared dependencies from a package.json document
///
/// Range specs this bot cannot pin down to a version (`*`, `>=1.0`, tags)
/// are skipped with a warning.
fn parse_manifest(content: &str, path: &Path) -> Result<HashSet<DependencyDetails>, AdapterError> {
    let manifest: Value =
        serde_json::from_str(content).map_err(|err| AdapterError::parse(path, err.to_string()))?;

    let mut packages = HashSet::new();
    for section in DEPENDENCY_SECTIONS {
        let Some(entries) = manifest.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, spec) in entries {
            let Some(spec) = spec.as_str() else { continue };
            match strip_range_prefix(spec).parse::<PackageVersion>() {
                Ok(version) => {
                    packages.insert(DependencyDetails::new(name.clone(), version));
                }
                Err(_) => warn!(
                    "skipping {} in {}: unsupported version spec '{}'",
                    name,
                    path.display(),
                    spec
                ),
            }
        }
    }

    Ok(packages)
}

/// Rewrites the version of declarations named in `to_update`
///
/// The `^`/`~` prefix of the original spec is kept; the file is rewritten
/// only when at least one declaration changed.
fn update_manifest(
    path: &Path,
    to_update: &HashSet<DependencyDetails>,
) -> Result<Vec<UpdateResult>, AdapterError> {
    let content = fs::read_to_string(path).map_err(|source| AdapterError::io(path, source))?;

    let mut results = Vec::new();
    let mut updated = content;
    for package in to_update {
        let expression = format!(
            r#"("{}"\s*:\s*")([\^~]?)([^"]*)(")"#,
            regex::escape(&package.name)
        );
        let declaration =
            Regex::new(&expression).map_err(|err| AdapterError::parse(path, err.to_string()))?;
        let new_version = package.version.to_string();

        let rewritten = declaration
            .replace_all(&updated, |caps: &regex::Captures| {
                let old_version = &caps[3];
                if old_version == new_version {
                    return caps[0].to_string();
                }
                results.push(UpdateResult::new(
                    package.name.clone(),
                    old_version,
                    new_version.clone(),
                ));
                format!("{}{}{}{}", &caps[1], &caps[2], new_version, &caps[4])
            })
            .into_owned();
        updated = rewritten;
    }

    if results.is_empty() {
        return Ok(results);
    }

    info!("updating manifest {}", path.display());
    fs::write(path, updated).map_err(|source| AdapterError::io(path, source))?;
    Ok(results)
}

fn strip_range_prefix(spec: &str) -> &str {
    spec.trim_start_matches(['^', '~'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE_MANIFEST: &str = r#"{
  "name": "sample",
  "dependencies": {
    "lodash": "^4.17.20",
    "express": "4.18.2"
  },
  "devDependencies": {
    "jest": "~29.6.0",
    "experimental": "*"
  }
}
"#;

    fn adapter() -> NpmAdapter {
        NpmAdapter::new(HttpClient::new().unwrap())
    }

    #[test]
    fn test_parse_manifest() {
        let packages = parse_manifest(SAMPLE_MANIFEST, Path::new("package.json")).unwrap();
        assert_eq!(packages.len(), 3);
        assert!(packages.contains(&DependencyDetails::new(
            "lodash",
            PackageVersion::new(4, 17, 20)
        )));
        assert!(packages.contains(&DependencyDetails::new(
            "express",
            PackageVersion::new(4, 18, 2)
        )));
        assert!(packages.contains(&DependencyDetails::new(
            "jest",
            PackageVersion::new(29, 6, 0)
        )));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_manifest("{", Path::new("package.json")).is_err());
    }

    #[test]
    fn test_project_files_skips_node_modules() {
        let dir = TempDir::new().unwrap();
        let vendored = dir.path().join("node_modules").join("lodash");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(dir.path().join("package.json"), SAMPLE_MANIFEST).unwrap();
        fs::write(vendored.join("package.json"), "{}").unwrap();

        let files = adapter().project_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("package.json"));
    }

    #[test]
    fn test_update_preserves_prefix_and_formatting() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, SAMPLE_MANIFEST).unwrap();

        let mut to_update = HashSet::new();
        to_update.insert(DependencyDetails::new(
            "lodash",
            PackageVersion::new(4, 17, 21),
        ));

        let results = update_manifest(&file, &to_update).unwrap();
        assert_eq!(
            results,
            vec![UpdateResult::new("lodash", "4.17.20", "4.17.21")]
        );

        let rewritten = fs::read_to_string(&file).unwrap();
        assert!(rewritten.contains(r#""lodash": "^4.17.21""#));
        assert!(rewritten.contains(r#""express": "4.18.2""#));
        assert!(rewritten.contains(r#""jest": "~29.6.0""#));
    }

    #[test]
    fn test_update_skips_file_when_nothing_changes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, SAMPLE_MANIFEST).unwrap();

        let mut to_update = HashSet::new();
        to_update.insert(DependencyDetails::new(
            "express",
            PackageVersion::new(4, 18, 2),
        ));

        let results = update_manifest(&file, &to_update).unwrap();
        assert!(results.is_empty());
        assert_eq!(fs::read_to_string(&file).unwrap(), SAMPLE_MANIFEST);
    }

    #[test]
    fn test_strip_range_prefix() {
        assert_eq!(strip_range_prefix("^1.2.3"), "1.2.3");
        assert_eq!(strip_range_prefix("~1.2.3"), "1.2.3");
        assert_eq!(strip_range_prefix("1.2.3"), "1.2.3");
    }
}
