//! Branch, commit and pull request helpers around the engine, and the
//! end-to-end push of a promotion for review.

use promoter_core::layout::branch_name_for;
use promoter_core::{Error, NewPullRequest, PromotionOutcome, PullRequestId, Result};
use tracing::{info, warn};

use crate::engine::Engine;

pub const DEFAULT_APPROVAL_MESSAGE: &str = "Approved by promoter";

const PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

/// Version-control and code-hosting steps of a promotion.
///
/// All steps act on the engine's single checkout; callers serialize access.
#[derive(Clone)]
pub struct PromotionWorkflow {
    engine: Engine,
}

impl PromotionWorkflow {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Create and check out the promotion branch for a stage.
    ///
    /// Refuses to run with uncommitted changes. `forced_name` overrides the
    /// conventional branch name.
    pub async fn fresh_branch(
        &self,
        application: &str,
        stage: &str,
        forced_name: Option<&str>,
    ) -> Result<String> {
        let vcs = self.engine.vcs();
        if vcs.has_uncommitted_changes().await? {
            return Err(Error::InvalidInput(
                "there are uncommitted changes in the working tree".to_string(),
            ));
        }
        let branch = match forced_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => branch_name_for(application, stage),
        };
        vcs.checkout_new_branch(&branch).await?;
        info!(application = %application, stage = %stage, branch = %branch, "Created promotion branch");
        Ok(branch)
    }

    pub async fn commit_for_release(&self, application: &str, stage: &str) -> Result<()> {
        let message = format!("promoter: {}:{}", application, stage);
        self.engine.vcs().commit_all(&message).await
    }

    pub async fn force_push_current_branch(&self) -> Result<()> {
        let branch = self.engine.vcs().current_branch().await?;
        if PROTECTED_BRANCHES.contains(&branch.as_str()) {
            return Err(Error::InvalidInput(format!(
                "refusing to force push protected branch {}",
                branch
            )));
        }
        self.engine.vcs().force_push_head().await?;
        info!(branch = %branch, "Force pushed branch");
        Ok(())
    }

    /// Open a pull request from the current branch into the default branch.
    pub async fn pull_request_for_current_branch(&self) -> Result<PullRequestId> {
        let vcs = self.engine.vcs();
        let branch = vcs.current_branch().await?;
        let repo = vcs.remote_repository().await?;
        let info = self.engine.host().repository_info(&repo).await?;
        if branch == info.default_branch {
            return Err(Error::InvalidInput(format!(
                "cannot open a pull request from the default branch {}",
                branch
            )));
        }

        let request = NewPullRequest {
            title: format!("Promotion of {}", branch),
            body: "Automated stage promotion.".to_string(),
            head: branch.clone(),
            base: info.default_branch,
        };
        let number = self.engine.host().create_pull_request(&repo, &request).await?;
        info!(branch = %branch, pr = number, "Opened pull request");
        Ok(number)
    }

    /// Open pull request for `branch`, 0 if none.
    pub async fn check_pr_for_branch(&self, branch: &str) -> Result<PullRequestId> {
        let repo = self.engine.vcs().remote_repository().await?;
        Ok(self
            .engine
            .host()
            .find_pull_request(&repo, branch)
            .await?
            .unwrap_or(0))
    }

    pub async fn check_pr_for_current_branch(&self) -> Result<PullRequestId> {
        let branch = self.engine.vcs().current_branch().await?;
        self.check_pr_for_branch(&branch).await
    }

    pub async fn check_pr_for_release(&self, application: &str, stage: &str) -> Result<PullRequestId> {
        self.check_pr_for_branch(&branch_name_for(application, stage))
            .await
    }

    pub async fn approve_pull_request(&self, number: PullRequestId, message: Option<&str>) -> Result<()> {
        let message = match message {
            Some(m) if !m.is_empty() => m,
            _ => DEFAULT_APPROVAL_MESSAGE,
        };
        let repo = self.engine.vcs().remote_repository().await?;
        self.engine
            .host()
            .approve_pull_request(&repo, number, message)
            .await
    }

    pub async fn merge_pull_request(&self, number: PullRequestId) -> Result<()> {
        let repo = self.engine.vcs().remote_repository().await?;
        self.engine.host().merge_pull_request(&repo, number).await
    }

    pub async fn whoami(&self) -> Result<String> {
        self.engine.host().whoami().await
    }

    /// Push a promotion of `stage` for review.
    ///
    /// The checkout is returned to the default branch afterwards, whether or
    /// not the push succeeded.
    pub async fn push(&self, application: &str, stage: &str) -> Result<PromotionOutcome> {
        self.return_to_default_branch().await?;

        if !self.engine.needs_promotion(application, stage).await? {
            info!(application = %application, stage = %stage, "Stage already promoted");
            return Ok(PromotionOutcome::NoChanges);
        }

        let outcome = self.push_branch(application, stage).await;
        let restored = self.return_to_default_branch().await;
        match (outcome, restored) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), restored) => {
                if let Err(restore_err) = restored {
                    warn!(error = %restore_err, "Failed to restore default branch after push failure");
                }
                Err(e.for_stage(application, stage))
            }
        }
    }

    async fn push_branch(&self, application: &str, stage: &str) -> Result<PromotionOutcome> {
        let branch = self.fresh_branch(application, stage, None).await?;
        self.engine.apply_release(application, stage).await?;
        self.commit_for_release(application, stage).await?;
        self.force_push_current_branch().await?;

        let existing = self.check_pr_for_branch(&branch).await?;
        if existing != 0 {
            info!(branch = %branch, pr = existing, "Updated existing pull request");
            return Ok(PromotionOutcome::ExistingPullRequest(existing));
        }
        let number = self.pull_request_for_current_branch().await?;
        Ok(PromotionOutcome::NewPullRequest(number))
    }

    async fn return_to_default_branch(&self) -> Result<()> {
        let vcs = self.engine.vcs();
        vcs.reset_clean().await?;
        vcs.checkout_default_branch().await?;
        Ok(())
    }
}
