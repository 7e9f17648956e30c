//! Version control collaborator.

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Hosted repository coordinates, parsed from the `origin` remote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{owner}/{name}")]
pub struct RemoteRepository {
    pub owner: String,
    pub name: String,
}

impl RemoteRepository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{name} <{email}>")]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Operations on a local working copy.
///
/// Implementations operate on a single checkout; callers serialize access.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into `destination`.
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<()>;

    async fn fetch_all(&self) -> Result<()>;

    /// Discard local modifications and untracked files.
    async fn reset_clean(&self) -> Result<()>;

    /// Check out the remote's default branch and hard-reset it to `origin`.
    async fn checkout_default_branch(&self) -> Result<String>;

    /// Create (or reset) `branch` at the current commit and check it out.
    async fn checkout_new_branch(&self, branch: &str) -> Result<()>;

    async fn checkout_branch(&self, branch: &str) -> Result<()>;

    async fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Stage everything and commit with `message`.
    async fn commit_all(&self, message: &str) -> Result<()>;

    /// Force-push the current branch to `origin`.
    async fn force_push_head(&self) -> Result<()>;

    async fn current_branch(&self) -> Result<String>;

    async fn current_revision(&self) -> Result<String>;

    async fn remote_repository(&self) -> Result<RemoteRepository>;

    async fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Configured commit identity, if any.
    async fn author(&self) -> Result<Option<Author>>;

    /// Set the commit identity for this checkout only.
    async fn set_local_author(&self, author: &Author) -> Result<()>;

    async fn set_origin_url(&self, url: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            RemoteRepository::new("cresta", "flux-charts").to_string(),
            "cresta/flux-charts"
        );
        let author = Author {
            name: "Promoter".to_string(),
            email: "promoter@example.com".to_string(),
        };
        assert_eq!(author.to_string(), "Promoter <promoter@example.com>");
    }
}
