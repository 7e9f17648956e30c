//! Release configuration for the promoter.
//!
//! This crate handles:
//! - The `.releaser.yaml` document (substitution rules and release metadata)
//! - Resolving rules across the repository, application and stage scopes

pub mod document;
pub mod error;
pub mod resolver;

pub use document::{
    CurrentRelease, LiteralRule, OriginalRelease, RegexRule, ReleaseConfig, ReleaseMetadata,
    RuleSet,
};
pub use error::{ConfigError, ConfigResult};
pub use resolver::{ScopeMode, ScopeResolver};
