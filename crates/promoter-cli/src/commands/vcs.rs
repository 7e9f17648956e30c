//! Git and GitHub helpers around a promotion.

use anyhow::Result;
use promoter_core::{PromotionOutcome, PullRequestId};
use serde::Serialize;
use serde_json::json;

use super::Context;

#[derive(Debug, Serialize)]
struct PullRequestResult {
    pull_request: PullRequestId,
}

pub async fn promote(ctx: &Context, application: &str, stage: &str) -> Result<()> {
    let outcome = ctx.workflow.push(application, stage).await?;
    ctx.emit(&outcome, || outcome_text(&outcome))
}

fn outcome_text(outcome: &PromotionOutcome) -> String {
    match outcome {
        PromotionOutcome::ExistingPullRequest(number) => {
            format!("updated existing pull request #{}", number)
        }
        PromotionOutcome::NewPullRequest(number) => format!("opened pull request #{}", number),
        PromotionOutcome::NoChanges => "no changes".to_string(),
    }
}

pub async fn fresh(
    ctx: &Context,
    application: &str,
    stage: &str,
    forced_name: Option<&str>,
) -> Result<()> {
    let branch = ctx
        .workflow
        .fresh_branch(application, stage, forced_name)
        .await?;
    ctx.emit(&json!({ "branch": branch }), || branch.clone())
}

pub async fn commit(ctx: &Context, application: &str, stage: &str) -> Result<()> {
    ctx.workflow.commit_for_release(application, stage).await?;
    Ok(())
}

pub async fn push(ctx: &Context) -> Result<()> {
    ctx.workflow.force_push_current_branch().await?;
    Ok(())
}

pub async fn open_pull_request(ctx: &Context) -> Result<()> {
    let pull_request = ctx.workflow.pull_request_for_current_branch().await?;
    emit_pull_request(ctx, pull_request)
}

pub async fn check_pull_request(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let pull_request = match branch {
        Some(branch) => ctx.workflow.check_pr_for_branch(branch).await?,
        None => ctx.workflow.check_pr_for_current_branch().await?,
    };
    emit_pull_request(ctx, pull_request)
}

pub async fn approve(ctx: &Context, number: PullRequestId, message: Option<&str>) -> Result<()> {
    ctx.workflow.approve_pull_request(number, message).await?;
    Ok(())
}

pub async fn merge(ctx: &Context, number: PullRequestId) -> Result<()> {
    ctx.workflow.merge_pull_request(number).await?;
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let login = ctx.workflow.whoami().await?;
    ctx.emit(&json!({ "login": login }), || login.clone())
}

fn emit_pull_request(ctx: &Context, pull_request: PullRequestId) -> Result<()> {
    ctx.emit(&PullRequestResult { pull_request }, || pull_request.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_text() {
        assert_eq!(
            outcome_text(&PromotionOutcome::NewPullRequest(12)),
            "opened pull request #12"
        );
        assert_eq!(
            outcome_text(&PromotionOutcome::ExistingPullRequest(9)),
            "updated existing pull request #9"
        );
        assert_eq!(outcome_text(&PromotionOutcome::NoChanges), "no changes");
    }
}
