//! Stage promotion engine.
//!
//! Renders a stage's predecessor into the stage's shape, diffs the result
//! against what is on disk, applies it, and aggregates fleet readiness.

pub mod diff;
pub mod engine;
pub mod render;
pub mod status;
pub mod transform;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use diff::{FileOperation, TreeDiff, apply_diff, unified_diff};
pub use engine::{DEFAULT_STATUS_CONCURRENCY, Engine, Preview};
pub use promoter_config::ScopeMode;
pub use render::{RenderInput, RenderMode, render_release, transform_release};
pub use transform::transform_file;
pub use workflow::{DEFAULT_APPROVAL_MESSAGE, PromotionWorkflow};
