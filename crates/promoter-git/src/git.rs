//! Version control through the system `git` binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use promoter_core::{Author, RemoteRepository, VersionControl};
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

/// Runs `git` inside a single working copy.
pub struct GitCli {
    repo_dir: PathBuf,
    /// Secret scrubbed from any command output that ends up in an error.
    redact: Option<String>,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            redact: None,
        }
    }

    /// Scrub `token` from command output included in errors.
    pub fn with_redacted_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.is_empty() {
            self.redact = Some(token);
        }
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Whether the working copy directory holds a git checkout.
    pub fn is_checkout(&self) -> bool {
        self.repo_dir.join(".git").exists()
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        self.run_in(Some(&self.repo_dir), args).await
    }

    async fn run_in(&self, dir: Option<&Path>, args: &[&str]) -> Result<String, GitError> {
        let mut command = Command::new("git");
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        debug!(command = %self.describe(args), "Running git");
        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                command: self.describe(args),
                code: output.status.code(),
                stderr: self.scrub(stderr.trim()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// A `git config` value, `None` when the key is unset.
    async fn config_value(&self, key: &str) -> Result<Option<String>, GitError> {
        match self.run(&["config", key]).await {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(GitError::CommandFailed { code: Some(1), .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn default_branch(&self) -> Result<String, GitError> {
        let head = match self
            .run(&["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
            .await
        {
            Ok(head) => head,
            Err(_) => {
                self.run(&["remote", "set-head", "origin", "--auto"]).await?;
                self.run(&["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
                    .await?
            }
        };
        let branch = head.strip_prefix("origin/").unwrap_or(&head).to_string();
        if branch.is_empty() {
            return Err(GitError::EmptyOutput("default branch".to_string()));
        }
        Ok(branch)
    }

    fn describe(&self, args: &[&str]) -> String {
        self.scrub(&format!("git {}", args.join(" ")))
    }

    fn scrub(&self, text: &str) -> String {
        match &self.redact {
            Some(token) => text.replace(token.as_str(), "[REDACTED]"),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repository(&self, url: &str, destination: &Path) -> promoter_core::Result<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| promoter_core::Error::io(parent.display().to_string(), e))?;
        }
        let dest = destination.to_string_lossy();
        info!(destination = %destination.display(), "Cloning repository");
        self.run_in(None, &["clone", url, &dest]).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> promoter_core::Result<()> {
        self.run(&["fetch", "--all", "--prune"]).await?;
        Ok(())
    }

    async fn reset_clean(&self) -> promoter_core::Result<()> {
        self.run(&["reset", "--hard"]).await?;
        self.run(&["clean", "-fd"]).await?;
        Ok(())
    }

    async fn checkout_default_branch(&self) -> promoter_core::Result<String> {
        let branch = self.default_branch().await?;
        self.run(&["checkout", &branch]).await?;
        self.run(&["reset", "--hard", &format!("origin/{}", branch)])
            .await?;
        Ok(branch)
    }

    async fn checkout_new_branch(&self, branch: &str) -> promoter_core::Result<()> {
        self.run(&["checkout", "-B", branch]).await?;
        Ok(())
    }

    async fn checkout_branch(&self, branch: &str) -> promoter_core::Result<()> {
        self.run(&["checkout", branch]).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> promoter_core::Result<()> {
        self.run(&["branch", "-D", branch]).await?;
        Ok(())
    }

    async fn commit_all(&self, message: &str) -> promoter_core::Result<()> {
        self.run(&["add", "-A"]).await?;
        self.run(&["commit", "-a", "-m", message]).await?;
        Ok(())
    }

    async fn force_push_head(&self) -> promoter_core::Result<()> {
        let branch = self.current_branch().await?;
        self.run(&["push", "--force", "origin", &format!("HEAD:{}", branch)])
            .await?;
        Ok(())
    }

    async fn current_branch(&self) -> promoter_core::Result<String> {
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        if branch.is_empty() {
            return Err(GitError::EmptyOutput("current branch".to_string()).into());
        }
        Ok(branch)
    }

    async fn current_revision(&self) -> promoter_core::Result<String> {
        Ok(self.run(&["rev-parse", "HEAD"]).await?)
    }

    async fn remote_repository(&self) -> promoter_core::Result<RemoteRepository> {
        let url = self.run(&["remote", "get-url", "origin"]).await?;
        Ok(parse_github_remote(&url)?)
    }

    async fn has_uncommitted_changes(&self) -> promoter_core::Result<bool> {
        Ok(!self.run(&["status", "--porcelain"]).await?.is_empty())
    }

    async fn author(&self) -> promoter_core::Result<Option<Author>> {
        let name = self.config_value("user.name").await?;
        let email = self.config_value("user.email").await?;
        Ok(match (name, email) {
            (Some(name), Some(email)) => Some(Author { name, email }),
            (Some(name), None) => Some(Author {
                name,
                email: String::new(),
            }),
            _ => None,
        })
    }

    async fn set_local_author(&self, author: &Author) -> promoter_core::Result<()> {
        self.run(&["config", "--local", "user.name", &author.name])
            .await?;
        self.run(&["config", "--local", "user.email", &author.email])
            .await?;
        Ok(())
    }

    async fn set_origin_url(&self, url: &str) -> promoter_core::Result<()> {
        if let Err(e) = self.run(&["remote", "set-url", "origin", url]).await {
            warn!(error = %e, "Failed to update origin URL");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Parse `owner/name` from a GitHub remote URL.
///
/// Accepts `https://github.com/owner/name(.git)`, URLs with credentials, and
/// the scp-like `git@github.com:owner/name(.git)`.
pub fn parse_github_remote(remote: &str) -> Result<RemoteRepository, GitError> {
    let remote = remote.trim();
    let path = if let Some(rest) = remote.strip_prefix("git@") {
        rest.split_once(':')
            .map(|(_, path)| path.to_string())
            .ok_or_else(|| GitError::InvalidRemote(remote.to_string()))?
    } else {
        Url::parse(remote)
            .map_err(|_| GitError::InvalidRemote(remote.to_string()))?
            .path()
            .to_string()
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    match path.split('/').collect::<Vec<_>>().as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => {
            Ok(RemoteRepository::new(*owner, *name))
        }
        _ => Err(GitError::InvalidRemote(remote.to_string())),
    }
}

/// Embed `token` into an HTTPS clone URL as `x-access-token` credentials.
pub fn url_with_token(url: &str, token: &str) -> Result<String, GitError> {
    let mut parsed = Url::parse(url).map_err(|_| GitError::InvalidRemote(url.to_string()))?;
    if token.is_empty() {
        return Ok(parsed.to_string());
    }
    parsed
        .set_username("x-access-token")
        .and_then(|_| parsed.set_password(Some(token)))
        .map_err(|_| GitError::InvalidRemote(url.to_string()))?;
    Ok(parsed.to_string())
}

/// Git operation errors.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{command} exited with {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Invalid GitHub remote: {0}")]
    InvalidRemote(String),

    #[error("git returned an empty {0}")]
    EmptyOutput(String),
}

impl From<GitError> for promoter_core::Error {
    fn from(err: GitError) -> Self {
        promoter_core::Error::collaborator("git", err)
    }
}
