//! Core domain types and traits for the promoter stage promotion engine.
//!
//! This crate contains:
//! - The repository layout contract (`apps/<app>/releases/<stage>`)
//! - Applications, stages and releases
//! - Readiness status records and promotion outcomes
//! - The error taxonomy shared by every crate
//! - Collaborator traits (file store, version control, code hosting)
//! - An in-memory file store for tests and dry runs

pub mod application;
pub mod error;
pub mod hosting;
pub mod layout;
pub mod memory;
pub mod release;
pub mod status;
pub mod store;
pub mod vcs;

pub use application::{Application, Stage, StageKind};
pub use error::{Error, Result};
pub use hosting::{CodeHost, NewPullRequest, PullRequestId, RepositoryInfo};
pub use memory::MemoryFileStore;
pub use release::{FileLocation, Release, ReleaseFile};
pub use status::{ApplicationStatus, FleetStatus, PromotionOutcome, ReleaseStatus, StageStatus};
pub use store::{FileStore, StoredFile, Subdirectory};
pub use vcs::{Author, RemoteRepository, VersionControl};
