//! Release rendering: a predecessor release reshaped for its successor stage.

use chrono::{DateTime, Utc};
use promoter_config::{
    CurrentRelease, OriginalRelease, ReleaseConfig, ReleaseMetadata, RuleSet,
};
use promoter_core::layout::{RELEASER_FILE, ROOT_DIRECTORY};
use promoter_core::{Release, ReleaseFile, Result, VersionControl};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transform::transform_file;

/// How the reserved `.releaser.yaml` is produced in a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Keep the destination's current reserved file so only content drift shows.
    #[default]
    Compare,
    /// Regenerate release metadata for a real promotion.
    Promote,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Compare => write!(f, "compare"),
            RenderMode::Promote => write!(f, "promote"),
        }
    }
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compare" => Ok(RenderMode::Compare),
            "promote" => Ok(RenderMode::Promote),
            _ => Err(format!("Unknown render mode: {}", s)),
        }
    }
}

/// Everything needed to render one promotion.
pub struct RenderInput<'a> {
    pub application: &'a str,
    pub from_stage: &'a str,
    pub to_stage: &'a str,
    pub source: &'a Release,
    pub rules: Option<&'a RuleSet>,
    /// The destination's current root-level `.releaser.yaml`, if any.
    pub destination_releaser: Option<&'a ReleaseFile>,
    pub mode: RenderMode,
}

/// Transform every source file, dropping the source's own root reserved file.
pub fn transform_release(
    source: &Release,
    from_stage: &str,
    to_stage: &str,
    rules: Option<&RuleSet>,
) -> Result<Release> {
    let mut files = Vec::with_capacity(source.files.len());
    for file in &source.files {
        if file.is_releaser_file() && file.directory == ROOT_DIRECTORY {
            continue;
        }
        let content = transform_file(file, from_stage, to_stage, rules)?;
        files.push(ReleaseFile {
            name: file.name.clone(),
            directory: file.directory.clone(),
            content,
        });
    }
    Ok(Release::new(files))
}

/// Metadata for a freshly promoted stage.
///
/// Original-release fields are inherited from the predecessor when it has
/// them; `live_revision` fills a missing source revision.
pub fn build_metadata(
    application: &str,
    stage: &str,
    predecessor: &ReleaseMetadata,
    now: DateTime<Utc>,
    author: &str,
    live_revision: Option<String>,
) -> ReleaseMetadata {
    let source_revision = if predecessor.original_release.source_revision.is_empty() {
        live_revision.unwrap_or_default()
    } else {
        predecessor.original_release.source_revision.clone()
    };

    ReleaseMetadata {
        application_name: application.to_string(),
        release_name: stage.to_string(),
        original_release: OriginalRelease {
            creation_time: Some(predecessor.original_release.creation_time.unwrap_or(now)),
            source_revision,
        },
        current_release: CurrentRelease {
            creation_time: Some(now),
            author: author.to_string(),
        },
    }
}

/// Render a candidate release for `input.to_stage`.
pub async fn render_release(input: RenderInput<'_>, vcs: &dyn VersionControl) -> Result<Release> {
    let mut candidate =
        transform_release(input.source, input.from_stage, input.to_stage, input.rules)?;

    match input.mode {
        RenderMode::Compare => {
            if let Some(existing) = input.destination_releaser {
                candidate.upsert(existing.clone());
            }
        }
        RenderMode::Promote => {
            let predecessor = match input.source.releaser_file() {
                Some(file) => ReleaseConfig::parse(&file.location().to_string(), &file.content)?,
                None => ReleaseConfig::default(),
            };
            let destination = match input.destination_releaser {
                Some(file) => ReleaseConfig::parse(&file.location().to_string(), &file.content)?,
                None => ReleaseConfig::default(),
            };

            let live_revision = if predecessor
                .metadata
                .original_release
                .source_revision
                .is_empty()
            {
                Some(vcs.current_revision().await?)
            } else {
                None
            };
            let author = vcs.author().await?.map(|a| a.name).unwrap_or_default();

            let metadata = build_metadata(
                input.application,
                input.to_stage,
                &predecessor.metadata,
                Utc::now(),
                &author,
                live_revision,
            );
            debug!(
                application = %input.application,
                stage = %input.to_stage,
                revision = %metadata.original_release.source_revision,
                "Generated release metadata"
            );

            let content = destination.with_metadata(metadata).to_yaml()?;
            candidate.upsert(ReleaseFile::new(ROOT_DIRECTORY, RELEASER_FILE, content));
        }
    }

    Ok(candidate.sorted())
}
