//! Fleet readiness aggregation.

use std::future::Future;
use std::pin::pin;

use futures::{StreamExt, TryStreamExt, stream};
use promoter_core::layout::branch_name_for;
use promoter_core::{
    ApplicationStatus, Error, FleetStatus, ReleaseStatus, Result, StageStatus,
};
use tracing::{debug, info, warn};

use crate::engine::Engine;

/// A pending stage awaiting its pull request lookup.
struct Lookup {
    application: usize,
    stage: usize,
    branch: String,
}

impl Engine {
    /// Readiness of every stage of every application.
    pub async fn release_status(&self) -> Result<FleetStatus> {
        self.release_status_until(std::future::pending()).await
    }

    /// Like [`Engine::release_status`], aborting with [`Error::Cancelled`]
    /// as soon as `cancel` completes.
    pub async fn release_status_until<F>(&self, cancel: F) -> Result<FleetStatus>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.aggregate() => result,
            _ = cancel => {
                warn!("Release status aggregation cancelled");
                Err(Error::Cancelled)
            }
        }
    }

    /// Only the stages that are pending promotion.
    pub async fn pending_releases(&self) -> Result<FleetStatus> {
        Ok(self.release_status().await?.pending_only())
    }

    async fn aggregate(&self) -> Result<FleetStatus> {
        let mut fleet = FleetStatus::default();
        let mut lookups = Vec::new();

        for (app_idx, application) in self.list_applications()?.into_iter().enumerate() {
            let stages = self.list_stages(&application)?;
            let mut statuses = Vec::with_capacity(stages.len());

            for (stage_idx, stage) in stages.iter().enumerate() {
                if stage_idx == 0 {
                    statuses.push(StageStatus::released(&stage.name));
                    continue;
                }

                let pending = self.needs_promotion(&application, &stage.name).await?;
                let metadata = self
                    .stage_metadata(&application, &stage.name)
                    .map_err(|e| e.for_stage(&application, &stage.name))?;
                let status = ReleaseStatus::from_drift(pending);
                debug!(application = %application, stage = %stage.name, status = %status, "Classified stage");

                if pending {
                    lookups.push(Lookup {
                        application: app_idx,
                        stage: stage_idx,
                        branch: branch_name_for(&application, &stage.name),
                    });
                }
                statuses.push(StageStatus {
                    name: stage.name.clone(),
                    status,
                    pull_request: 0,
                    original_revision: metadata.original_release.source_revision,
                });
            }

            fleet.applications.push(ApplicationStatus {
                name: application,
                stages: statuses,
            });
        }

        if !lookups.is_empty() {
            self.resolve_pull_requests(&mut fleet, lookups).await?;
        }

        info!(
            applications = fleet.applications.len(),
            pending = fleet.pending_count(),
            "Computed release status"
        );
        Ok(fleet)
    }

    /// Look up open pull requests for pending stages on a bounded worker set.
    ///
    /// The first failure is returned and the remaining lookups are dropped.
    async fn resolve_pull_requests(&self, fleet: &mut FleetStatus, lookups: Vec<Lookup>) -> Result<()> {
        let repo = self.vcs().remote_repository().await?;
        let host = self.host().clone();

        let results = stream::iter(lookups.into_iter().map(|lookup| {
            let host = host.clone();
            let repo = repo.clone();
            async move {
                let pr = host
                    .find_pull_request(&repo, &lookup.branch)
                    .await
                    .map_err(|e| Error::collaborator(format!("pull request lookup for {}", lookup.branch), e))?;
                Ok::<_, Error>((lookup.application, lookup.stage, pr.unwrap_or(0)))
            }
        }))
        .buffer_unordered(self.status_concurrency());
        let mut results = pin!(results);

        while let Some((app_idx, stage_idx, pr)) = results.try_next().await? {
            if let Some(stage) = fleet
                .applications
                .get_mut(app_idx)
                .and_then(|a| a.stages.get_mut(stage_idx))
            {
                stage.pull_request = pr;
            }
        }
        Ok(())
    }
}
