//! Rule-scope resolution.
//!
//! Rules may be declared at three nested scopes, each in its own
//! `.releaser.yaml`:
//!
//! 1. the repository root
//! 2. `apps/<application>/`
//! 3. `apps/<application>/releases/<stage>/`
//!
//! Resolution concatenates whatever is found, outermost scope first.

use std::path::{Path, PathBuf};

use promoter_core::FileStore;
use promoter_core::layout::{self, RELEASER_FILE};
use tracing::debug;

use crate::{ConfigResult, ReleaseConfig, RuleSet};

/// Which scopes participate in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeMode {
    /// Repository, then application, then stage.
    #[default]
    Cascade,
    /// The stage's own file only.
    StageOnly,
}

/// Loads `.releaser.yaml` documents through a [`FileStore`].
pub struct ScopeResolver<'a> {
    store: &'a dyn FileStore,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(store: &'a dyn FileStore) -> Self {
        Self { store }
    }

    /// Directories consulted for `stage` of `application`, outermost first.
    pub fn scope_directories(application: &str, stage: &str, mode: ScopeMode) -> Vec<PathBuf> {
        match mode {
            ScopeMode::Cascade => vec![
                layout::repository_root(),
                layout::application_dir(application),
                layout::stage_dir(application, stage),
            ],
            ScopeMode::StageOnly => vec![layout::stage_dir(application, stage)],
        }
    }

    /// Merged rules for `stage`, or `None` when no scope has a config file.
    pub fn resolve(
        &self,
        application: &str,
        stage: &str,
        mode: ScopeMode,
    ) -> ConfigResult<Option<RuleSet>> {
        let mut merged: Option<RuleSet> = None;
        for directory in Self::scope_directories(application, stage, mode) {
            if let Some(config) = self.load(&directory)? {
                debug!(
                    application = %application,
                    stage = %stage,
                    scope = %directory.display(),
                    literal = config.literal.len(),
                    regex = config.regex.len(),
                    "Loaded release rules"
                );
                let rules = config.rules();
                merged = Some(match merged {
                    Some(acc) => acc.merged(rules),
                    None => rules,
                });
            }
        }
        Ok(merged)
    }

    /// Parse the config file in `directory`, if one exists.
    pub fn load(&self, directory: &Path) -> ConfigResult<Option<ReleaseConfig>> {
        if !self.store.file_exists(directory, RELEASER_FILE)? {
            return Ok(None);
        }
        let content = self.store.read_file(directory, RELEASER_FILE)?;
        let path = directory.join(RELEASER_FILE);
        ReleaseConfig::parse(&path.to_string_lossy(), &content).map(Some)
    }

    /// The stage's own config document, if any.
    pub fn stage_config(
        &self,
        application: &str,
        stage: &str,
    ) -> ConfigResult<Option<ReleaseConfig>> {
        self.load(&layout::stage_dir(application, stage))
    }
}
