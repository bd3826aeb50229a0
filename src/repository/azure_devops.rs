//! Azure DevOps repository provider
//!
//! Branch and commit handling shells out to the git binary in the repository
//! working copy; pull requests, auto-completion and work-item linking go
//! through the Azure DevOps REST API with PAT authentication.

use super::{update_branch_name, RepositoryProvider};
use crate::config::AzureDevOpsConfig;
use crate::domain::UpdateResult;
use crate::error::RepositoryError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;
use tracing::info;

const COMMIT_MESSAGE: &str = "Bump dependencies";
const REMOTE_NAME: &str = "origin";
const API_VERSION: &str = "6.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider for repositories hosted on Azure DevOps
pub struct AzureDevOps {
    config: AzureDevOpsConfig,
    client: reqwest::Client,
}

/// Where a branch was found during lookup
enum BranchLocation {
    Local,
    Remote,
}

impl AzureDevOps {
    /// Creates a new provider for the given host configuration
    pub fn new(config: AzureDevOpsConfig) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("depbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| RepositoryError::api(err.to_string()))?;
        Ok(Self { config, client })
    }

    fn run_git(&self, repo_path: &Path, args: &[&str]) -> Result<Output, RepositoryError> {
        Command::new("git")
            .current_dir(repo_path)
            .args(args)
            .output()
            .map_err(|source| RepositoryError::GitSpawn { source })
    }

    fn git_ok(&self, repo_path: &Path, args: &[&str]) -> Result<(), RepositoryError> {
        let output = self.run_git(repo_path, args)?;
        if output.status.success() {
            return Ok(());
        }
        Err(RepositoryError::git(
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }

    fn git_stdout(&self, repo_path: &Path, args: &[&str]) -> Result<String, RepositoryError> {
        let output = self.run_git(repo_path, args)?;
        if !output.status.success() {
            return Err(RepositoryError::git(
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Ref lookup after a fetch: local branch, remote-only branch, or absent
    fn find_branch(
        &self,
        repo_path: &Path,
        branch: &str,
    ) -> Result<Option<BranchLocation>, RepositoryError> {
        let local = format!("refs/heads/{}", branch);
        if self.ref_exists(repo_path, &local)? {
            return Ok(Some(BranchLocation::Local));
        }
        let remote = format!("refs/remotes/{}/{}", REMOTE_NAME, branch);
        if self.ref_exists(repo_path, &remote)? {
            return Ok(Some(BranchLocation::Remote));
        }
        Ok(None)
    }

    fn ref_exists(&self, repo_path: &Path, reference: &str) -> Result<bool, RepositoryError> {
        let output = self.run_git(
            repo_path,
            &["rev-parse", "--verify", "--quiet", reference],
        )?;
        Ok(output.status.success())
    }

    fn pull_requests_url(&self) -> String {
        format!(
            "https://dev.azure.com/{}/{}/_apis/git/repositories/{}/pullrequests?api-version={}",
            self.config.organization, self.config.project, self.config.repository, API_VERSION
        )
    }

    fn pull_request_url(&self, id: u64) -> String {
        format!(
            "https://dev.azure.com/{}/{}/_apis/git/repositories/{}/pullrequests/{}?api-version={}",
            self.config.organization, self.config.project, self.config.repository, id, API_VERSION
        )
    }

    async fn pull_request_exists(
        &self,
        url: &str,
        source_ref: &str,
        target_ref: &str,
    ) -> Result<bool, RepositoryError> {
        let response = self
            .client
            .get(url)
            .basic_auth("", Some(&self.config.pat))
            .send()
            .await
            .map_err(|err| RepositoryError::api(err.to_string()))?;
        if !response.status().is_success() {
            return Err(RepositoryError::api(format!("HTTP {}", response.status())));
        }

        let open: PullRequestList = response
            .json()
            .await
            .map_err(|err| RepositoryError::api(err.to_string()))?;
        Ok(open
            .value
            .iter()
            .any(|pr| pr.source_ref_name == source_ref && pr.target_ref_name == target_ref))
    }

    async fn set_auto_complete(
        &self,
        pull_request: &PullRequestResponse,
    ) -> Result<(), RepositoryError> {
        info!("setting autocomplete for PR {}", pull_request.pull_request_id);
        let body = json!({
            "autoCompleteSetBy": pull_request.created_by.clone(),
            "completionOptions": {
                "deleteSourceBranch": true,
                "bypassPolicy": false,
                "mergeStrategy": "squash",
            },
        });
        let response = self
            .client
            .patch(self.pull_request_url(pull_request.pull_request_id))
            .basic_auth("", Some(&self.config.pat))
            .json(&body)
            .send()
            .await
            .map_err(|err| RepositoryError::api(err.to_string()))?;
        if !response.status().is_success() {
            return Err(RepositoryError::api(format!("HTTP {}", response.status())));
        }
        Ok(())
    }

    async fn link_work_item(
        &self,
        work_item_id: u64,
        pull_request: &PullRequestResponse,
    ) -> Result<(), RepositoryError> {
        info!(
            "linking work item {} to PR {}",
            work_item_id, pull_request.pull_request_id
        );
        let url = format!(
            "https://dev.azure.com/{}/{}/_apis/wit/workitems/{}?api-version={}",
            self.config.organization, self.config.project, work_item_id, API_VERSION
        );
        let patch = json!([{
            "op": "add",
            "path": "/relations/-",
            "value": {
                "rel": "ArtifactLink",
                "url": pull_request.artifact_id.clone(),
                "attributes": { "name": "Pull Request" },
            },
        }]);
        let response = self
            .client
            .patch(url)
            .basic_auth("", Some(&self.config.pat))
            .header("Content-Type", "application/json-patch+json")
            .json(&patch)
            .send()
            .await
            .map_err(|err| RepositoryError::api(err.to_string()))?;
        if !response.status().is_success() {
            return Err(RepositoryError::api(format!("HTTP {}", response.status())));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryProvider for AzureDevOps {
    fn clean_and_switch_to_default_branch(&self, repo_path: &Path) -> Result<(), RepositoryError> {
        let branch = &self.config.target_branch_name;
        info!("switching {} to branch {}", repo_path.display(), branch);

        self.git_ok(repo_path, &["fetch", REMOTE_NAME])?;
        self.git_ok(repo_path, &["reset", "--hard"])?;

        match self.find_branch(repo_path, branch)? {
            Some(BranchLocation::Local) => self.git_ok(repo_path, &["checkout", branch]),
            Some(BranchLocation::Remote) => {
                let remote_ref = format!("{}/{}", REMOTE_NAME, branch);
                self.git_ok(repo_path, &["checkout", "--track", &remote_ref])
            }
            None => Err(RepositoryError::BranchNotFound {
                branch: branch.clone(),
            }),
        }
    }

    fn switch_to_update_branch(
        &self,
        repo_path: &Path,
        project_name: &str,
        group: &str,
    ) -> Result<(), RepositoryError> {
        let branch = update_branch_name(&self.config.branch_name, project_name, group);
        info!("switching {} to branch {}", repo_path.display(), branch);

        self.git_ok(repo_path, &["fetch", REMOTE_NAME])?;
        match self.find_branch(repo_path, &branch)? {
            Some(BranchLocation::Local) => self.git_ok(repo_path, &["checkout", &branch]),
            Some(BranchLocation::Remote) => {
                let remote_ref = format!("{}/{}", REMOTE_NAME, branch);
                self.git_ok(repo_path, &["checkout", "--track", &remote_ref])
            }
            None => {
                info!("branch {} does not exist, creating", branch);
                self.git_ok(repo_path, &["checkout", "-b", &branch])
            }
        }
    }

    fn commit_changes(
        &self,
        repo_path: &Path,
        project_name: &str,
        group: &str,
    ) -> Result<(), RepositoryError> {
        let branch = update_branch_name(&self.config.branch_name, project_name, group);
        info!("committing {} to branch {}", repo_path.display(), branch);

        let status = self.git_stdout(repo_path, &["status", "--porcelain"])?;
        if status.trim().is_empty() {
            info!("no changes to commit");
            return Ok(());
        }

        self.git_ok(repo_path, &["add", "--all"])?;
        let user = format!("user.name={}", self.config.username);
        let email = format!("user.email={}", self.config.email);
        self.git_ok(
            repo_path,
            &["-c", &user, "-c", &email, "commit", "-m", COMMIT_MESSAGE],
        )?;
        self.git_ok(
            repo_path,
            &["push", "--set-upstream", REMOTE_NAME, &branch],
        )
    }

    async fn submit_pull_request(
        &self,
        updates: &[UpdateResult],
        project_name: &str,
        group: &str,
    ) -> Result<(), RepositoryError> {
        let branch = update_branch_name(&self.config.branch_name, project_name, group);
        let source_ref = format!("refs/heads/{}", branch);
        let target_ref = format!("refs/heads/{}", self.config.target_branch_name);
        let url = self.pull_requests_url();

        if self
            .pull_request_exists(&url, &source_ref, &target_ref)
            .await?
        {
            info!(
                "PR from {} to {} already exists, skipping",
                branch, self.config.target_branch_name
            );
            return Ok(());
        }

        info!("creating new PR");
        let body = PullRequestBody {
            source_ref_name: source_ref,
            target_ref_name: target_ref,
            title: format!("[AutoUpdate] Update dependencies - {}", project_name),
            description: pr_description(updates),
        };
        let response = self
            .client
            .post(&url)
            .basic_auth("", Some(&self.config.pat))
            .json(&body)
            .send()
            .await
            .map_err(|err| RepositoryError::api(err.to_string()))?;

        // Azure DevOps answers 203 with an HTML login page for a bad PAT
        if response.status() == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            return Err(RepositoryError::InvalidCredentials);
        }
        if !response.status().is_success() {
            return Err(RepositoryError::api(format!("HTTP {}", response.status())));
        }

        let created: PullRequestResponse = response
            .json()
            .await
            .map_err(|err| RepositoryError::api(err.to_string()))?;
        info!("new PR created {}", created.pull_request_id);

        if self.config.auto_complete {
            self.set_auto_complete(&created).await?;
        }
        if let Some(work_item_id) = self.config.work_item_id {
            self.link_work_item(work_item_id, &created).await?;
        }

        Ok(())
    }
}

/// Renders the pull request description from the applied updates
fn pr_description(updates: &[UpdateResult]) -> String {
    let mut description = String::from("Automated dependency update\n\nLog:\n");
    for update in updates {
        description.push_str(&format!(
            "Bump {}: {} -> {}\n",
            update.package_name, update.old_version, update.new_version
        ));
    }
    description
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestBody {
    source_ref_name: String,
    target_ref_name: String,
    title: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestResponse {
    pull_request_id: u64,
    #[serde(default)]
    created_by: serde_json::Value,
    #[serde(default)]
    artifact_id: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestList {
    #[serde(default)]
    value: Vec<PullRequestRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestRef {
    source_ref_name: String,
    target_ref_name: String,
}
