//! Release inspection, rendering and application.

use anyhow::Result;
use promoter_core::ReleaseStatus;
use promoter_engine::{RenderMode, TreeDiff, unified_diff};
use serde::Serialize;

use super::Context;

#[derive(Debug, Serialize)]
struct CheckResult<'a> {
    application: &'a str,
    stage: &'a str,
    status: ReleaseStatus,
}

pub fn get(ctx: &Context, application: &str, stage: &str) -> Result<()> {
    let release = ctx.engine().get_release(application, stage)?;
    ctx.emit(&release, || release.canonical_text())
}

pub async fn preview(ctx: &Context, application: &str, stage: &str, mode: RenderMode) -> Result<()> {
    let preview = ctx.engine().preview_release(application, stage, mode).await?;
    ctx.emit(&preview.candidate, || preview.candidate.canonical_text())
}

pub async fn diff(ctx: &Context, application: &str, stage: &str) -> Result<()> {
    let preview = ctx
        .engine()
        .preview_release(application, stage, RenderMode::Compare)
        .await?;
    let diff = preview.diff();
    let text = unified_diff(&preview.current, &preview.candidate);
    ctx.emit(&diff, || text)
}

pub async fn apply(ctx: &Context, application: &str, stage: &str) -> Result<()> {
    let diff = ctx.engine().apply_release(application, stage).await?;
    ctx.emit(&diff, || operations_text(&diff))
}

/// Whether the stage needs promotion.
pub async fn check(ctx: &Context, application: &str, stage: &str) -> Result<bool> {
    let pending = ctx.engine().needs_promotion(application, stage).await?;
    let result = CheckResult {
        application,
        stage,
        status: ReleaseStatus::from_drift(pending),
    };
    ctx.emit(&result, || result.status.to_string())?;
    Ok(pending)
}

fn operations_text(diff: &TreeDiff) -> String {
    if diff.is_empty() {
        return "no changes".to_string();
    }
    diff.operations()
        .iter()
        .map(|op| format!("{} {}", op.kind(), op.location()))
        .collect::<Vec<_>>()
        .join("\n")
}
