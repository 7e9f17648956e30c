//! The server's managed checkout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use promoter_core::{Author, Error, Result, VersionControl};
use promoter_git::url_with_token;
use tracing::{info, warn};

/// A checkout the server owns: cloned on first start, reset on later starts,
/// and refreshed from `origin` on demand.
pub struct ManagedRepo {
    vcs: Arc<dyn VersionControl>,
    location: PathBuf,
    url: Option<String>,
    token: Option<String>,
}

impl ManagedRepo {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        location: impl Into<PathBuf>,
        url: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            vcs,
            location: location.into(),
            url,
            token,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_checkout(&self) -> bool {
        self.location.join(".git").is_dir()
    }

    /// Clone the repository, or reset an existing checkout to its default branch.
    pub async fn prepare(&self) -> Result<()> {
        if self.is_checkout() {
            info!(location = %self.location.display(), "Resetting existing checkout");
            if let Some(url) = self.authenticated_url()? {
                self.vcs.set_origin_url(&url).await?;
            }
            self.vcs.reset_clean().await?;
            self.vcs.checkout_default_branch().await?;
            return Ok(());
        }

        let url = self.authenticated_url()?.ok_or_else(|| {
            Error::InvalidInput(format!(
                "no checkout at {} and REPO_URL is not set",
                self.location.display()
            ))
        })?;
        info!(location = %self.location.display(), "Cloning managed checkout");
        self.vcs.clone_repository(&url, &self.location).await
    }

    /// Fetch from `origin` and return to a clean default branch.
    pub async fn refresh(&self) -> Result<String> {
        self.vcs.fetch_all().await?;
        self.vcs.reset_clean().await?;
        let branch = self.vcs.checkout_default_branch().await?;
        let revision = self.vcs.current_revision().await?;
        info!(branch = %branch, revision = %revision, "Refreshed checkout");
        Ok(revision)
    }

    /// Configure `author` locally unless the checkout already has an identity.
    pub async fn ensure_author(&self, author: &Author) -> Result<()> {
        if let Some(existing) = self.vcs.author().await? {
            info!(author = %existing, "Using configured git author");
            return Ok(());
        }
        warn!(author = %author, "No git author configured, setting local identity");
        self.vcs.set_local_author(author).await
    }

    fn authenticated_url(&self) -> Result<Option<String>> {
        let Some(url) = &self.url else {
            return Ok(None);
        };
        let token = self.token.as_deref().unwrap_or_default();
        Ok(Some(url_with_token(url, token)?))
    }
}
