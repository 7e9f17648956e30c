//! Application, stage and rule listing.

use anyhow::Result;
use promoter_config::RuleSet;
use promoter_engine::ScopeMode;

use super::Context;

pub fn list_applications(ctx: &Context) -> Result<()> {
    let apps = ctx.engine().list_applications()?;
    ctx.emit(&apps, || apps.join("\n"))
}

pub fn list_stages(ctx: &Context, application: &str) -> Result<()> {
    let stages = ctx.engine().list_stages(application)?;
    ctx.emit(&stages, || {
        stages
            .iter()
            .map(|s| {
                if s.is_mirror() {
                    format!("{} (mirror)", s.name)
                } else {
                    s.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub fn rules(ctx: &Context, application: &str, stage: &str, stage_only: bool) -> Result<()> {
    let mode = if stage_only {
        ScopeMode::StageOnly
    } else {
        ScopeMode::Cascade
    };
    let rules = ctx.engine().resolve_rules(application, stage, mode)?;
    let text = rules_text(rules.as_ref())?;
    ctx.emit(&rules, || text)
}

fn rules_text(rules: Option<&RuleSet>) -> Result<String> {
    match rules {
        Some(rules) if !rules.is_empty() => Ok(serde_yaml::to_string(rules)?),
        _ => Ok("no rules".to_string()),
    }
}
