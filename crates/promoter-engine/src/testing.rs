//! Mock collaborators shared by the engine's tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use promoter_core::{
    Author, CodeHost, Error, NewPullRequest, PullRequestId, RemoteRepository, RepositoryInfo,
    Result, VersionControl,
};

pub struct MockVcs {
    calls: Mutex<Vec<String>>,
    branch: Mutex<String>,
    revision: String,
    author: Option<Author>,
    dirty: bool,
}

impl Default for MockVcs {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            branch: Mutex::new("main".to_string()),
            revision: "0000000".to_string(),
            author: None,
            dirty: false,
        }
    }
}

impl MockVcs {
    pub fn with_author(mut self, name: &str, email: &str) -> Self {
        self.author = Some(Author {
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = revision.to_string();
        self
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    pub fn on_branch(self, branch: &str) -> Self {
        *self.branch.lock().unwrap() = branch.to_string();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl VersionControl for MockVcs {
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
        *self.branch.lock().unwrap() = "main".to_string();
        Ok("main".to_string())
    }

    async fn checkout_new_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout_new_branch {branch}"));
        *self.branch.lock().unwrap() = branch.to_string();
        Ok(())
    }

    async fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout_branch {branch}"));
        *self.branch.lock().unwrap() = branch.to_string();
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
        let branch = self.branch.lock().unwrap().clone();
        self.record(format!("force_push_head {branch}"));
        Ok(())
    }

    async fn current_branch(&self) -> Result<String> {
        Ok(self.branch.lock().unwrap().clone())
    }

    async fn current_revision(&self) -> Result<String> {
        self.record("current_revision");
        Ok(self.revision.clone())
    }

    async fn remote_repository(&self) -> Result<RemoteRepository> {
        Ok(RemoteRepository::new("acme", "deployments"))
    }

    async fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(self.dirty)
    }

    async fn author(&self) -> Result<Option<Author>> {
        Ok(self.author.clone())
    }

    async fn set_local_author(&self, author: &Author) -> Result<()> {
        self.record(format!("set_local_author {author}"));
        Ok(())
    }

    async fn set_origin_url(&self, url: &str) -> Result<()> {
        self.record(format!("set_origin_url {url}"));
        Ok(())
    }
}

/// Code host keeping pull requests in memory.
///
/// Lookups for branches in `hang` never complete; lookups for branches in
/// `fail` return an error.
pub struct MockHost {
    open: Mutex<HashMap<String, PullRequestId>>,
    created: Mutex<Vec<NewPullRequest>>,
    approved: Mutex<Vec<(PullRequestId, String)>>,
    merged: Mutex<Vec<PullRequestId>>,
    hang: HashSet<String>,
    fail: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    lookups: AtomicUsize,
    next_id: AtomicUsize,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            approved: Mutex::new(Vec::new()),
            merged: Mutex::new(Vec::new()),
            hang: HashSet::new(),
            fail: HashSet::new(),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            next_id: AtomicUsize::new(100),
        }
    }
}

impl MockHost {
    pub fn with_open_pr(self, branch: &str, number: PullRequestId) -> Self {
        self.open.lock().unwrap().insert(branch.to_string(), number);
        self
    }

    pub fn hanging_on(mut self, branch: &str) -> Self {
        self.hang.insert(branch.to_string());
        self
    }

    pub fn failing_on(mut self, branch: &str) -> Self {
        self.fail.insert(branch.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn created(&self) -> Vec<NewPullRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn approved(&self) -> Vec<(PullRequestId, String)> {
        self.approved.lock().unwrap().clone()
    }

    pub fn merged(&self) -> Vec<PullRequestId> {
        self.merged.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeHost for MockHost {
    async fn find_pull_request(
        &self,
        _repo: &RemoteRepository,
        branch: &str,
    ) -> Result<Option<PullRequestId>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hang.contains(branch) {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.contains(branch) {
            return Err(Error::collaborator("find pull request", "boom"));
        }
        Ok(self.open.lock().unwrap().get(branch).copied())
    }

    async fn create_pull_request(
        &self,
        _repo: &RemoteRepository,
        request: &NewPullRequest,
    ) -> Result<PullRequestId> {
        let number = self.next_id.fetch_add(1, Ordering::SeqCst) as PullRequestId;
        self.created.lock().unwrap().push(request.clone());
        self.open
            .lock()
            .unwrap()
            .insert(request.head.clone(), number);
        Ok(number)
    }

    async fn merge_pull_request(&self, _repo: &RemoteRepository, number: PullRequestId) -> Result<()> {
        self.merged.lock().unwrap().push(number);
        Ok(())
    }

    async fn approve_pull_request(
        &self,
        _repo: &RemoteRepository,
        number: PullRequestId,
        message: &str,
    ) -> Result<()> {
        self.approved
            .lock()
            .unwrap()
            .push((number, message.to_string()));
        Ok(())
    }

    async fn repository_info(&self, repo: &RemoteRepository) -> Result<RepositoryInfo> {
        Ok(RepositoryInfo {
            id: format!("R_{}", repo.name),
            default_branch: "main".to_string(),
        })
    }

    async fn whoami(&self) -> Result<String> {
        Ok("promoter-bot".to_string())
    }
}
