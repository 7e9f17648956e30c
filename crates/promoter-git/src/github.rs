//! GitHub REST client for pull requests and identity.

use std::path::Path;

use async_trait::async_trait;
use promoter_core::{CodeHost, NewPullRequest, PullRequestId, RemoteRepository, RepositoryInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "promoter";

/// GitHub API client.
pub struct GitHubClient {
    client: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl GitHubClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root, e.g. GitHub Enterprise.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<reqwest::Response, GitHubError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GitHubError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api(format!(
                "Failed to {} ({}): {}",
                action, status, text
            )));
        }
        Ok(response)
    }

    async fn json<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T, GitHubError> {
        self.send(builder, action)
            .await?
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))
    }

    fn repo_path(repo: &RemoteRepository) -> String {
        format!(
            "/repos/{}/{}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn find_pull_request(
        &self,
        repo: &RemoteRepository,
        branch: &str,
    ) -> promoter_core::Result<Option<PullRequestId>> {
        let head = format!("{}:{}", repo.owner, branch);
        let builder = self
            .request(
                reqwest::Method::GET,
                &format!("{}/pulls", Self::repo_path(repo)),
            )
            .query(&[("head", head.as_str()), ("state", "open")]);
        let pulls: Vec<PullRequest> = self.json(builder, "list pull requests").await?;
        debug!(repo = %repo, branch, found = pulls.len(), "Looked up pull requests");
        Ok(pulls.first().map(|p| p.number))
    }

    async fn create_pull_request(
        &self,
        repo: &RemoteRepository,
        request: &NewPullRequest,
    ) -> promoter_core::Result<PullRequestId> {
        let builder = self
            .request(
                reqwest::Method::POST,
                &format!("{}/pulls", Self::repo_path(repo)),
            )
            .json(&CreatePullRequest {
                title: &request.title,
                head: &request.head,
                base: &request.base,
                body: &request.body,
            });
        let pull: PullRequest = self.json(builder, "create pull request").await?;
        info!(repo = %repo, number = pull.number, head = %request.head, "Created pull request");
        Ok(pull.number)
    }

    async fn merge_pull_request(
        &self,
        repo: &RemoteRepository,
        number: PullRequestId,
    ) -> promoter_core::Result<()> {
        let builder = self
            .request(
                reqwest::Method::PUT,
                &format!("{}/pulls/{}/merge", Self::repo_path(repo), number),
            )
            .json(&serde_json::json!({}));
        let merge: MergeResponse = self.json(builder, "merge pull request").await?;
        if !merge.merged {
            return Err(GitHubError::Api(format!(
                "Pull request #{} was not merged: {}",
                number, merge.message
            ))
            .into());
        }
        info!(repo = %repo, number, "Merged pull request");
        Ok(())
    }

    async fn approve_pull_request(
        &self,
        repo: &RemoteRepository,
        number: PullRequestId,
        message: &str,
    ) -> promoter_core::Result<()> {
        let builder = self
            .request(
                reqwest::Method::POST,
                &format!("{}/pulls/{}/reviews", Self::repo_path(repo), number),
            )
            .json(&serde_json::json!({ "event": "APPROVE", "body": message }));
        self.send(builder, "approve pull request").await?;
        info!(repo = %repo, number, "Approved pull request");
        Ok(())
    }

    async fn repository_info(
        &self,
        repo: &RemoteRepository,
    ) -> promoter_core::Result<RepositoryInfo> {
        let builder = self.request(reqwest::Method::GET, &Self::repo_path(repo));
        let info: GitHubRepo = self.json(builder, "get repository").await?;
        Ok(RepositoryInfo {
            id: info.node_id,
            default_branch: info.default_branch,
        })
    }

    async fn whoami(&self) -> promoter_core::Result<String> {
        let builder = self.request(reqwest::Method::GET, "/user");
        let user: GitHubUser = self.json(builder, "get user").await?;
        Ok(user.login)
    }
}

/// Find a GitHub token: the explicit value, then `GITHUB_TOKEN`, then the
/// GitHub CLI's `hosts.yml`.
pub fn resolve_token(explicit: Option<&str>) -> Result<String, GitHubError> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let hosts = dirs::config_dir()
        .map(|dir| dir.join("gh").join("hosts.yml"))
        .ok_or(GitHubError::NoToken)?;
    token_from_gh_hosts_file(&hosts)
}

fn token_from_gh_hosts_file(path: &Path) -> Result<String, GitHubError> {
    let content = std::fs::read_to_string(path).map_err(|_| GitHubError::NoToken)?;
    debug!(path = %path.display(), "Reading token from gh hosts file");
    token_from_gh_hosts(&content)
}

/// Extract the `github.com` OAuth token from gh's `hosts.yml` content.
pub fn token_from_gh_hosts(content: &str) -> Result<String, GitHubError> {
    let hosts: std::collections::HashMap<String, GhHost> =
        serde_yaml::from_str(content).map_err(|e| GitHubError::Parse(e.to_string()))?;
    hosts
        .get("github.com")
        .and_then(|h| h.oauth_token.clone())
        .filter(|t| !t.is_empty())
        .ok_or(GitHubError::NoToken)
}

#[derive(Debug, Deserialize)]
struct GhHost {
    oauth_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: PullRequestId,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    node_id: String,
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

/// GitHub API errors.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No GitHub token: set GITHUB_TOKEN or log in with gh")]
    NoToken,
}

impl From<GitHubError> for promoter_core::Error {
    fn from(err: GitHubError) -> Self {
        promoter_core::Error::collaborator("github", err)
    }
}
