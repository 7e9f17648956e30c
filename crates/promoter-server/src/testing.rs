//! In-process collaborators for the server's tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use promoter_core::{
    Author, CodeHost, NewPullRequest, PullRequestId, RemoteRepository, RepositoryInfo, Result,
    VersionControl,
};

#[derive(Default)]
pub struct RecordingVcs {
    calls: Mutex<Vec<String>>,
    branch: Mutex<Option<String>>,
    author: Mutex<Option<Author>>,
}

impl RecordingVcs {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn set_branch(&self, branch: &str) {
        *self.branch.lock().unwrap() = Some(branch.to_string());
    }
}

#[async_trait]
impl VersionControl for RecordingVcs {
    async fn clone_repository(&self, url: &str, _destination: &Path) -> Result<()> {
        self.record(format!("clone {url}"));
        Ok(())
    }

    async fn fetch_all(&self) -> Result<()> {
        self.record("fetch_all");
        Ok(())
    }

    async fn reset_clean(&self) -> Result<()> {
        self.record("reset_clean");
        Ok(())
    }

    async fn checkout_default_branch(&self) -> Result<String> {
        self.record("checkout_default_branch");
        self.set_branch("main");
        Ok("main".to_string())
    }

    async fn checkout_new_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout_new_branch {branch}"));
        self.set_branch(branch);
        Ok(())
    }

    async fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout_branch {branch}"));
        self.set_branch(branch);
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("delete_branch {branch}"));
        Ok(())
    }

    async fn commit_all(&self, message: &str) -> Result<()> {
        self.record(format!("commit_all {message}"));
        Ok(())
    }

    async fn force_push_head(&self) -> Result<()> {
        self.record("force_push_head");
        Ok(())
    }

    async fn current_branch(&self) -> Result<String> {
        Ok(self
            .branch
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "main".to_string()))
    }

    async fn current_revision(&self) -> Result<String> {
        Ok("abc123".to_string())
    }

    async fn remote_repository(&self) -> Result<RemoteRepository> {
        Ok(RemoteRepository::new("acme", "deployments"))
    }

    async fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(false)
    }

    async fn author(&self) -> Result<Option<Author>> {
        Ok(self.author.lock().unwrap().clone())
    }

    async fn set_local_author(&self, author: &Author) -> Result<()> {
        self.record(format!("set_local_author {author}"));
        *self.author.lock().unwrap() = Some(author.clone());
        Ok(())
    }

    async fn set_origin_url(&self, url: &str) -> Result<()> {
        self.record(format!("set_origin_url {url}"));
        Ok(())
    }
}

/// Code host with a fixed set of open pull requests, keyed by head branch.
#[derive(Default)]
pub struct StubHost {
    open: Mutex<HashMap<String, PullRequestId>>,
}

impl StubHost {
    pub fn with_open_pr(self, branch: &str, number: PullRequestId) -> Self {
        self.open.lock().unwrap().insert(branch.to_string(), number);
        self
    }
}

#[async_trait]
impl CodeHost for StubHost {
    async fn find_pull_request(
        &self,
        _repo: &RemoteRepository,
        branch: &str,
    ) -> Result<Option<PullRequestId>> {
        Ok(self.open.lock().unwrap().get(branch).copied())
    }

    async fn create_pull_request(
        &self,
        _repo: &RemoteRepository,
        request: &NewPullRequest,
    ) -> Result<PullRequestId> {
        let mut open = self.open.lock().unwrap();
        let number = 100 + open.len() as PullRequestId;
        open.insert(request.head.clone(), number);
        Ok(number)
    }

    async fn merge_pull_request(&self, _repo: &RemoteRepository, _number: PullRequestId) -> Result<()> {
        Ok(())
    }

    async fn approve_pull_request(
        &self,
        _repo: &RemoteRepository,
        _number: PullRequestId,
        _message: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn repository_info(&self, _repo: &RemoteRepository) -> Result<RepositoryInfo> {
        Ok(RepositoryInfo {
            id: "R_1".to_string(),
            default_branch: "main".to_string(),
        })
    }

    async fn whoami(&self) -> Result<String> {
        Ok("promoter-bot".to_string())
    }
}
