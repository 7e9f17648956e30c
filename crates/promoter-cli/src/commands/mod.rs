//! CLI command implementations.

pub mod apps;
pub mod release;
pub mod status;
pub mod vcs;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use promoter_engine::{Engine, PromotionWorkflow};
use promoter_git::{GitCli, GitHubClient, OsFileStore, resolve_token};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything a command needs: the engine over the checkout and how to print.
pub struct Context {
    pub workflow: PromotionWorkflow,
    pub output: OutputFormat,
}

impl Context {
    pub fn new(repo: PathBuf, output: OutputFormat, github_token: Option<&str>) -> Self {
        let token = match resolve_token(github_token) {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "No GitHub token, GitHub calls will be unauthenticated");
                String::new()
            }
        };
        let engine = Engine::new(
            Arc::new(OsFileStore::new(&repo)),
            Arc::new(GitCli::new(&repo).with_redacted_token(token.clone())),
            Arc::new(GitHubClient::new(token)),
        );
        Self {
            workflow: PromotionWorkflow::new(engine),
            output,
        }
    }

    pub fn engine(&self) -> &Engine {
        self.workflow.engine()
    }

    /// Print `value` as JSON, or `text` in text mode.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        let rendered = render(self.output, value, text)?;
        print!("{}", rendered);
        Ok(())
    }
}

/// Rendered output, always newline-terminated unless empty.
pub fn render<T: Serialize>(
    output: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<String> {
    let mut out = match output {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Text => text(),
    };
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_and_json() {
        let value = vec!["a1", "a2"];
        assert_eq!(
            render(OutputFormat::Text, &value, || value.join("\n")).unwrap(),
            "a1\na2\n"
        );
        assert_eq!(
            render(OutputFormat::Json, &value, || unreachable!()).unwrap(),
            "[\n  \"a1\",\n  \"a2\"\n]\n"
        );
        assert_eq!(render(OutputFormat::Text, &value, String::new).unwrap(), "");
    }
}
