//! The promotion engine: one instance per process, shared by every surface.

use std::sync::Arc;

use promoter_config::{ReleaseConfig, ReleaseMetadata, RuleSet, ScopeMode, ScopeResolver};
use promoter_core::layout;
use promoter_core::{
    Application, CodeHost, Error, FileStore, Release, ReleaseFile, Result, Stage, StageKind,
    VersionControl,
};
use tracing::{debug, info};

use crate::diff::{TreeDiff, apply_diff};
use crate::render::{RenderInput, RenderMode, render_release};

/// Default number of concurrent pull request lookups during status aggregation.
pub const DEFAULT_STATUS_CONCURRENCY: usize = 8;

/// A stage's current release next to the candidate rendered from its predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub current: Release,
    pub candidate: Release,
}

impl Preview {
    pub fn has_changes(&self) -> bool {
        self.current.canonical_text() != self.candidate.canonical_text()
    }

    pub fn diff(&self) -> TreeDiff {
        TreeDiff::between(&self.current, &self.candidate)
    }
}

#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn FileStore>,
    vcs: Arc<dyn VersionControl>,
    host: Arc<dyn CodeHost>,
    status_concurrency: usize,
}

impl Engine {
    pub fn new(
        store: Arc<dyn FileStore>,
        vcs: Arc<dyn VersionControl>,
        host: Arc<dyn CodeHost>,
    ) -> Self {
        Self {
            store,
            vcs,
            host,
            status_concurrency: DEFAULT_STATUS_CONCURRENCY,
        }
    }

    /// Bound the number of concurrent pull request lookups. Zero is treated as one.
    pub fn with_status_concurrency(mut self, limit: usize) -> Self {
        self.status_concurrency = limit.max(1);
        self
    }

    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }

    pub fn vcs(&self) -> &Arc<dyn VersionControl> {
        &self.vcs
    }

    pub fn host(&self) -> &Arc<dyn CodeHost> {
        &self.host
    }

    pub fn status_concurrency(&self) -> usize {
        self.status_concurrency
    }

    pub fn list_applications(&self) -> Result<Vec<String>> {
        let apps = layout::apps_dir();
        if !self.store.directory_exists(&apps)? {
            return Err(Error::NotFound(format!("{} directory", apps.display())));
        }
        Ok(self
            .store
            .list_subdirectories(&apps)?
            .into_iter()
            .map(|d| d.name)
            .collect())
    }

    /// Stages of `application` in promotion order. Symlinked stage directories are mirrors.
    pub fn list_stages(&self, application: &str) -> Result<Vec<Stage>> {
        if !self
            .store
            .directory_exists(&layout::application_dir(application))?
        {
            return Err(Error::NotFound(format!("application {}", application)));
        }
        let releases = layout::releases_dir(application);
        if !self.store.directory_exists(&releases)? {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .list_subdirectories(&releases)?
            .into_iter()
            .map(|d| Stage {
                name: d.name,
                kind: if d.symlink {
                    StageKind::Mirrored
                } else {
                    StageKind::Rendered
                },
            })
            .collect())
    }

    pub fn application(&self, application: &str) -> Result<Application> {
        Ok(Application {
            name: application.to_string(),
            stages: self.list_stages(application)?,
        })
    }

    /// Files currently held by `stage`, sorted by `(directory, name)`.
    pub fn get_release(&self, application: &str, stage: &str) -> Result<Release> {
        let dir = layout::stage_dir(application, stage);
        if !self.store.directory_exists(&dir)? {
            return Err(Error::NotFound(format!("release {}:{}", application, stage)));
        }
        let files = self
            .store
            .list_files(&dir)?
            .into_iter()
            .map(|f| ReleaseFile {
                name: f.name,
                directory: f.directory,
                content: f.content,
            })
            .collect();
        Ok(Release::new(files).sorted())
    }

    pub fn resolve_rules(
        &self,
        application: &str,
        stage: &str,
        mode: ScopeMode,
    ) -> Result<Option<RuleSet>> {
        Ok(ScopeResolver::new(self.store.as_ref()).resolve(application, stage, mode)?)
    }

    /// Metadata recorded in the stage's own `.releaser.yaml`, empty if it has none.
    pub fn stage_metadata(&self, application: &str, stage: &str) -> Result<ReleaseMetadata> {
        let config = ScopeResolver::new(self.store.as_ref()).stage_config(application, stage)?;
        Ok(config.map(|c| c.metadata).unwrap_or_default())
    }

    /// Render `stage` from its predecessor without touching the store.
    pub async fn preview_release(
        &self,
        application: &str,
        stage: &str,
        mode: RenderMode,
    ) -> Result<Preview> {
        self.preview_inner(application, stage, mode)
            .await
            .map_err(|e| e.for_stage(application, stage))
    }

    async fn preview_inner(
        &self,
        application: &str,
        stage: &str,
        mode: RenderMode,
    ) -> Result<Preview> {
        let app = self.application(application)?;
        let target = app
            .stage(stage)
            .ok_or_else(|| Error::NotFound(format!("stage {} of {}", stage, application)))?;
        let Some(predecessor) = app.predecessor(stage) else {
            return Err(Error::InvalidInput(format!(
                "{} is the first stage of {} and cannot be promoted into",
                stage, application
            )));
        };

        let current = self.get_release(application, stage)?;
        if target.is_mirror() {
            debug!(application = %application, stage = %stage, "Mirrored stage, skipping render");
            return Ok(Preview {
                candidate: current.clone(),
                current,
            });
        }

        let predecessor = &predecessor.name;
        let source = self.get_release(application, predecessor)?;
        let rules = self.resolve_rules(application, predecessor, ScopeMode::Cascade)?;

        let candidate = render_release(
            RenderInput {
                application,
                from_stage: predecessor,
                to_stage: stage,
                source: &source,
                rules: rules.as_ref(),
                destination_releaser: current.releaser_file(),
                mode,
            },
            self.vcs.as_ref(),
        )
        .await?;

        Ok(Preview { current, candidate })
    }

    /// Whether `stage` differs from a fresh promotion of its predecessor.
    pub async fn needs_promotion(&self, application: &str, stage: &str) -> Result<bool> {
        Ok(self
            .preview_release(application, stage, RenderMode::Compare)
            .await?
            .has_changes())
    }

    /// Promote the predecessor into `stage` on disk, returning what was changed.
    pub async fn apply_release(&self, application: &str, stage: &str) -> Result<TreeDiff> {
        let preview = self
            .preview_release(application, stage, RenderMode::Promote)
            .await?;
        let diff = preview.diff();
        if diff.is_empty() {
            return Ok(diff);
        }

        let root = layout::stage_dir(application, stage);
        let applied = apply_diff(self.store.as_ref(), &root, &diff)
            .map_err(|e| e.for_stage(application, stage))?;
        info!(
            application = %application,
            stage = %stage,
            deleted = diff.deletes.len(),
            modified = diff.modifications.len(),
            created = diff.creations.len(),
            applied,
            "Applied release"
        );
        Ok(diff)
    }

    /// The stage's parsed `.releaser.yaml`, if present.
    pub fn stage_config(&self, application: &str, stage: &str) -> Result<Option<ReleaseConfig>> {
        Ok(ScopeResolver::new(self.store.as_ref()).stage_config(application, stage)?)
    }
}
