//! Concrete collaborators for the promoter.
//!
//! - [`OsFileStore`]: the local file system, rooted at a checkout
//! - [`GitCli`]: the system `git` binary
//! - [`GitHubClient`]: the GitHub REST API

pub mod fs;
pub mod git;
pub mod github;

pub use fs::OsFileStore;
pub use git::{GitCli, GitError, parse_github_remote, url_with_token};
pub use github::{GitHubClient, GitHubError, resolve_token};
