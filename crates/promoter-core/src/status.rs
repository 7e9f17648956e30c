//! Fleet readiness records and promotion outcomes.

use serde::{Deserialize, Serialize};

use crate::hosting::PullRequestId;

/// Whether a stage matches a fresh promotion of its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    /// On-disk content differs from the rendered promotion.
    Pending,
    /// On-disk content already matches.
    Released,
}

impl ReleaseStatus {
    pub fn from_drift(has_drift: bool) -> Self {
        if has_drift {
            ReleaseStatus::Pending
        } else {
            ReleaseStatus::Released
        }
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseStatus::Pending => write!(f, "pending"),
            ReleaseStatus::Released => write!(f, "released"),
        }
    }
}

impl std::str::FromStr for ReleaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReleaseStatus::Pending),
            "released" => Ok(ReleaseStatus::Released),
            _ => Err(format!("Unknown release status: {}", s)),
        }
    }
}

/// Readiness of a single stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    pub name: String,
    pub status: ReleaseStatus,
    /// Open pull request for the stage's promotion branch, 0 if none.
    pub pull_request: PullRequestId,
    /// Source revision the stage content originally came from, empty if unknown.
    pub original_revision: String,
}

impl StageStatus {
    pub fn released(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ReleaseStatus::Released,
            pull_request: 0,
            original_revision: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReleaseStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub name: String,
    pub stages: Vec<StageStatus>,
}

/// Readiness of every application in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStatus {
    pub applications: Vec<ApplicationStatus>,
}

impl FleetStatus {
    /// Keep only pending stages, dropping applications with none.
    pub fn pending_only(self) -> Self {
        let applications = self
            .applications
            .into_iter()
            .filter_map(|app| {
                let stages: Vec<StageStatus> =
                    app.stages.into_iter().filter(StageStatus::is_pending).collect();
                if stages.is_empty() {
                    None
                } else {
                    Some(ApplicationStatus {
                        name: app.name,
                        stages,
                    })
                }
            })
            .collect();
        Self { applications }
    }

    pub fn pending_count(&self) -> usize {
        self.applications
            .iter()
            .flat_map(|a| a.stages.iter())
            .filter(|s| s.is_pending())
            .count()
    }
}

impl std::fmt::Display for FleetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for app in &self.applications {
            for stage in &app.stages {
                writeln!(
                    f,
                    "{} {} {} {} {}",
                    app.name, stage.name, stage.status, stage.pull_request, stage.original_revision
                )?;
            }
        }
        Ok(())
    }
}

/// Result of pushing a promotion for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "pull_request", rename_all = "snake_case")]
pub enum PromotionOutcome {
    /// The branch was updated and an open pull request already existed.
    ExistingPullRequest(PullRequestId),
    /// The branch was pushed and a new pull request opened.
    NewPullRequest(PullRequestId),
    /// The stage already matches its predecessor.
    NoChanges,
}

impl PromotionOutcome {
    pub fn pull_request(&self) -> Option<PullRequestId> {
        match self {
            PromotionOutcome::ExistingPullRequest(id) | PromotionOutcome::NewPullRequest(id) => {
                Some(*id)
            }
            PromotionOutcome::NoChanges => None,
        }
    }
}
