//! .NET project adapter
//!
//! Scans csproj-style project files, extracts `<PackageReference>` items and
//! queries the NuGet v3 flat container for available versions. Rewrites keep
//! the original file formatting by patching only the `Version` attribute of
//! matching references.

use super::{is_prerelease, HttpClient, ProjectAdapter};
use crate::config::{EcosystemKind, Project};
use crate::domain::{DependencyDetails, PackageVersion, UpdateResult};
use crate::error::AdapterError;
use async_trait::async_trait;
use glob::Pattern;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name patterns that may declare package references
const PROJECT_FILE_PATTERNS: [&str; 3] = ["*.csproj", "*.nfproj", "[Dd]irectory.[Bb]uild.props"];

/// Resource type prefix of the flat-container base address in a v3 service
/// index
const FLAT_CONTAINER_RESOURCE: &str = "PackageBaseAddress";

/// Adapter for .NET projects backed by NuGet feeds
pub struct NuGetAdapter {
    client: HttpClient,
}

impl NuGetAdapter {
    /// Creates a new NuGet adapter
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Resolves the flat-container base URL from a v3 service index
    async fn flat_container_base(&self, source: &str) -> Result<String, AdapterError> {
        let index: ServiceIndex = self.client.get_json(source, "", source).await?;
        index
            .resources
            .iter()
            .find(|resource| resource.resource_type.starts_with(FLAT_CONTAINER_RESOURCE))
            .map(|resource| {
                let mut base = resource.id.clone();
                if !base.ends_with('/') {
                    base.push('/');
                }
                base
            })
            .ok_or_else(|| {
                AdapterError::registry(
                    "",
                    source,
                    "service index has no PackageBaseAddress resource",
                )
            })
    }

    /// Fetches the stable versions of one package from one source
    async fn versions_from_source(
        &self,
        source: &str,
        package: &str,
    ) -> Result<Vec<PackageVersion>, AdapterError> {
        let base = self.flat_container_base(source).await?;
        let url = format!("{}{}/index.json", base, package.to_lowercase());
        let index: FlatContainerIndex = self.client.get_json(&url, package, source).await?;

        Ok(index
            .versions
            .iter()
            .filter(|version| !is_prerelease(version))
            .filter_map(|version| version.parse().ok())
            .collect())
    }
}

#[async_trait]
impl ProjectAdapter for NuGetAdapter {
    fn ecosystem(&self) -> EcosystemKind {
        EcosystemKind::DotNet
    }

    fn project_files(&self, search_path: &Path) -> Result<Vec<PathBuf>, AdapterError> {
        let root = Pattern::escape(&search_path.display().to_string());
        let mut files = Vec::new();
        for file_pattern in PROJECT_FILE_PATTERNS {
            let pattern = format!("{}/**/{}", root, file_pattern);
            let entries = glob::glob(&pattern)
                .map_err(|err| AdapterError::parse(search_path, err.to_string()))?;
            for entry in entries {
                match entry {
                    Ok(path) => files.push(path),
                    Err(err) => {
                        let path = err.path().to_path_buf();
                        return Err(AdapterError::io(path, err.into_error()));
                    }
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
            packages.extend(parse_package_references(&content, file)?);
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
            results.extend(update_project_file(file, to_update)?);
        }
        Ok(results)
    }
}

/// Extracts (name, version) pairs from `<PackageReference>` elements
///
/// References without both an `Include` and a `Version` attribute are
/// ignored; version values this bot cannot represent (ranges, MSBuild
/// variables) are skipped with a warning.
fn parse_package_references(
    content: &str,
    path: &Path,
) -> Result<HashSet<DependencyDetails>, AdapterError> {
    let mut reader = Reader::from_str(content);
    let mut packages = HashSet::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element))
                if element.name().as_ref() == b"PackageReference" =>
            {
                let mut name = None;
                let mut version = None;
                for attribute in element.attributes() {
                    let attribute =
                        attribute.map_err(|err| AdapterError::parse(path, err.to_string()))?;
                    let value = attribute
                        .unescape_value()
                        .map_err(|err| AdapterError::parse(path, err.to_string()))?;
                    match attribute.key.as_ref() {
                        b"Include" => name = Some(value.into_owned()),
                        b"Version" => version = Some(value.into_owned()),
                        _ => {}
                    }
                }

                if let (Some(name), Some(raw_version)) = (name, version) {
                    match raw_version.parse::<PackageVersion>() {
                        Ok(version) => {
                            packages.insert(DependencyDetails::new(name, version));
                        }
                        Err(_) => warn!(
                            "skipping {} in {}: unsupported version '{}'",
                            name,
                            path.display(),
                            raw_version
                        ),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(AdapterError::parse(path, err.to_string())),
        }
    }

    Ok(packages)
}

/// Rewrites the `Version` attribute of references named in `to_update`
///
/// The file is rewritten only when at least one declaration changed.
fn update_project_file(
    path: &Path,
    to_update: &HashSet<DependencyDetails>,
) -> Result<Vec<UpdateResult>, AdapterError> {
    let content = fs::read_to_string(path).map_err(|source| AdapterError::io(path, source))?;

    let mut results = Vec::new();
    let mut updated = content;
    for package in to_update {
        let expression = format!(
            r#"(<PackageReference[^>]*\bInclude="{}"[^>]*\bVersion=")([^"]*)(")"#,
            regex::escape(&package.name)
        );
        let reference = Regex::new(&expression)
            .map_err(|err| AdapterError::parse(path, err.to_string()))?;
        let new_version = package.version.to_string();

        let rewritten = reference
            .replace_all(&updated, |caps: &regex::Captures| {
                let old_version = &caps[2];
                if old_version == new_version {
                    return caps[0].to_string();
                }
                results.push(UpdateResult::new(
                    package.name.clone(),
                    old_version,
                    new_version.clone(),
                ));
                format!("{}{}{}", &caps[1], new_version, &caps[3])
            })
            .into_owned();
        updated = rewritten;
    }

    if results.is_empty() {
        return Ok(results);
    }

    info!("updating project file {}", path.display());
    fs::write(path, updated).map_err(|source| AdapterError::io(path, source))?;
    Ok(results)
}

/// NuGet v3 service index
#[derive(Debug, Deserialize)]
struct ServiceIndex {
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: String,
}

/// Flat-container version listing
#[derive(Debug, Deserialize)]
struct FlatContainerIndex {
    versions: Vec<String>,
}
