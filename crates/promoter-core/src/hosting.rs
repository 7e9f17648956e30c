//! Code hosting collaborator (pull requests and identity).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::vcs::RemoteRepository;

/// Pull request number. `0` means "no pull request".
pub type PullRequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Host-assigned repository identifier.
    pub id: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Open pull request whose head is `branch`, if any.
    async fn find_pull_request(
        &self,
        repo: &RemoteRepository,
        branch: &str,
    ) -> Result<Option<PullRequestId>>;

    async fn create_pull_request(
        &self,
        repo: &RemoteRepository,
        request: &NewPullRequest,
    ) -> Result<PullRequestId>;

    async fn merge_pull_request(&self, repo: &RemoteRepository, number: PullRequestId)
    -> Result<()>;

    async fn approve_pull_request(
        &self,
        repo: &RemoteRepository,
        number: PullRequestId,
        message: &str,
    ) -> Result<()>;

    async fn repository_info(&self, repo: &RemoteRepository) -> Result<RepositoryInfo>;

    /// Login of the authenticated user.
    async fn whoami(&self) -> Result<String>;
}
