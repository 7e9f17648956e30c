//! Applications and their ordered stages.

use serde::{Deserialize, Serialize};

/// How a stage receives its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Content is rendered from the previous stage.
    Rendered,
    /// Pass-through alias of another stage. Never promoted.
    Mirrored,
}

impl Default for StageKind {
    fn default() -> Self {
        StageKind::Rendered
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Rendered => write!(f, "rendered"),
            StageKind::Mirrored => write!(f, "mirrored"),
        }
    }
}

/// One point along an application's promotion path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub kind: StageKind,
}

impl Stage {
    pub fn rendered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Rendered,
        }
    }

    pub fn mirrored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Mirrored,
        }
    }

    pub fn is_mirror(&self) -> bool {
        self.kind == StageKind::Mirrored
    }
}

/// A deployable unit with stages in promotion order. Stage 0 is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Application {
    pub fn stage_index(&self, stage: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == stage)
    }

    pub fn stage(&self, stage: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == stage)
    }

    /// The stage promoted into `stage`, or `None` for stage 0 and unknown stages.
    pub fn predecessor(&self, stage: &str) -> Option<&Stage> {
        match self.stage_index(stage) {
            Some(idx) if idx > 0 => self.stages.get(idx - 1),
            _ => None,
        }
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name.clone()).collect()
    }
}
