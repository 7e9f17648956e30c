//! Promoter CLI.
//!
//! Operates on the git checkout in the current directory (or `--repo`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Context, OutputFormat};

#[derive(Parser)]
#[command(name = "promoter")]
#[command(about = "Promote configuration between deployment stages", long_about = None)]
struct Cli {
    /// Repository checkout to operate on
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Output format
    #[arg(long, global = true, env = "PROMOTER_OUTPUT", value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// GitHub token; falls back to the gh CLI's stored login
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Applications in the repository
    Apps {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// Stages of an application
    Stages {
        #[command(subcommand)]
        command: StageCommands,
    },
    /// Inspect, render and apply releases
    Release {
        #[command(subcommand)]
        command: ReleaseCommands,
    },
    /// Readiness of every stage
    Status {
        /// Only show stages pending promotion
        #[arg(long)]
        pending: bool,
    },
    /// Substitution rules that apply to a stage
    Rules {
        application: String,
        stage: String,
        /// Only the stage's own rules, ignoring repository and application scopes
        #[arg(long)]
        stage_only: bool,
    },
    /// Push a promotion of a stage for review
    Promote { application: String, stage: String },
    /// Local git helpers
    Git {
        #[command(subcommand)]
        command: GitCommands,
    },
    /// GitHub pull request helpers
    Github {
        #[command(subcommand)]
        command: GitHubCommands,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    /// List all applications
    List,
}

#[derive(Subcommand)]
enum StageCommands {
    /// List stages in promotion order
    List { application: String },
}

#[derive(Subcommand)]
enum ReleaseCommands {
    /// Files currently held by a stage
    Get { application: String, stage: String },
    /// Render a stage from its predecessor without writing anything
    Preview {
        application: String,
        stage: String,
        /// compare keeps the stage's metadata; promote regenerates it
        #[arg(long, default_value = "compare")]
        mode: promoter_engine::RenderMode,
    },
    /// Line diff between a stage and a fresh promotion of its predecessor
    Diff { application: String, stage: String },
    /// Promote the predecessor into a stage on disk
    Apply { application: String, stage: String },
    /// Exit with status 1 when a stage needs promotion
    Check { application: String, stage: String },
}

#[derive(Subcommand)]
enum GitCommands {
    /// Create the promotion branch for a stage
    Fresh {
        application: String,
        stage: String,
        /// Branch name to use instead of the conventional one
        #[arg(long, env = "FORCED_NAME")]
        forced_name: Option<String>,
    },
    /// Commit all changes for a stage's promotion
    Commit { application: String, stage: String },
    /// Force push the current branch to origin
    Push,
}

#[derive(Subcommand)]
enum GitHubCommands {
    /// Open a pull request for the current branch
    Pr,
    /// Open pull request for a branch, 0 if none
    CheckPr {
        /// Branch to check; defaults to the current branch
        #[arg(long)]
        branch: Option<String>,
    },
    /// Approve a pull request
    Approve {
        number: u64,
        #[arg(long)]
        message: Option<String>,
    },
    /// Merge a pull request
    Merge { number: u64 },
    /// Login of the authenticated user
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::new(cli.repo, cli.output, cli.github_token.as_deref());

    match cli.command {
        Commands::Apps { command } => match command {
            AppCommands::List => commands::apps::list_applications(&ctx)?,
        },
        Commands::Stages { command } => match command {
            StageCommands::List { application } => {
                commands::apps::list_stages(&ctx, &application)?
            }
        },
        Commands::Release { command } => match command {
            ReleaseCommands::Get { application, stage } => {
                commands::release::get(&ctx, &application, &stage)?
            }
            ReleaseCommands::Preview {
                application,
                stage,
                mode,
            } => commands::release::preview(&ctx, &application, &stage, mode).await?,
            ReleaseCommands::Diff { application, stage } => {
                commands::release::diff(&ctx, &application, &stage).await?
            }
            ReleaseCommands::Apply { application, stage } => {
                commands::release::apply(&ctx, &application, &stage).await?
            }
            ReleaseCommands::Check { application, stage } => {
                if commands::release::check(&ctx, &application, &stage).await? {
                    return Ok(ExitCode::from(1));
                }
            }
        },
        Commands::Status { pending } => commands::status::show(&ctx, pending).await?,
        Commands::Rules {
            application,
            stage,
            stage_only,
        } => commands::apps::rules(&ctx, &application, &stage, stage_only)?,
        Commands::Promote { application, stage } => {
            commands::vcs::promote(&ctx, &application, &stage).await?
        }
        Commands::Git { command } => match command {
            GitCommands::Fresh {
                application,
                stage,
                forced_name,
            } => commands::vcs::fresh(&ctx, &application, &stage, forced_name.as_deref()).await?,
            GitCommands::Commit { application, stage } => {
                commands::vcs::commit(&ctx, &application, &stage).await?
            }
            GitCommands::Push => commands::vcs::push(&ctx).await?,
        },
        Commands::Github { command } => match command {
            GitHubCommands::Pr => commands::vcs::open_pull_request(&ctx).await?,
            GitHubCommands::CheckPr { branch } => {
                commands::vcs::check_pull_request(&ctx, branch.as_deref()).await?
            }
            GitHubCommands::Approve { number, message } => {
                commands::vcs::approve(&ctx, number, message.as_deref()).await?
            }
            GitHubCommands::Merge { number } => commands::vcs::merge(&ctx, number).await?,
            GitHubCommands::Whoami => commands::vcs::whoami(&ctx).await?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_release_preview() {
        let cli = Cli::try_parse_from([
            "promoter", "release", "preview", "a1", "01-staging", "--mode", "promote",
        ])
        .unwrap();
        match cli.command {
            Commands::Release {
                command: ReleaseCommands::Preview { mode, .. },
            } => assert_eq!(mode, promoter_engine::RenderMode::Promote),
            _ => panic!("expected release preview"),
        }
    }

    #[test]
    fn test_parse_global_output() {
        let cli = Cli::try_parse_from(["promoter", "status", "--pending", "--output", "json"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Status { pending: true }));
    }
}
