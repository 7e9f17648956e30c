//! On-disk repository layout.
//!
//! ```text
//! .releaser.yaml                              repository-wide rules
//! apps/<application>/.releaser.yaml           application-wide rules
//! apps/<application>/releases/<stage>/...     one directory per stage
//! apps/<application>/releases/<stage>/.releaser.yaml
//! ```

use std::path::{Path, PathBuf};

pub const APPS_DIR: &str = "apps";
pub const RELEASES_DIR: &str = "releases";

/// Reserved per-stage file holding rules and metadata. Never substituted.
pub const RELEASER_FILE: &str = ".releaser.yaml";

/// Directory value used for files at the root of a stage.
pub const ROOT_DIRECTORY: &str = ".";

pub fn repository_root() -> PathBuf {
    PathBuf::from(ROOT_DIRECTORY)
}

pub fn apps_dir() -> PathBuf {
    PathBuf::from(APPS_DIR)
}

pub fn application_dir(application: &str) -> PathBuf {
    apps_dir().join(application)
}

pub fn releases_dir(application: &str) -> PathBuf {
    application_dir(application).join(RELEASES_DIR)
}

pub fn stage_dir(application: &str, stage: &str) -> PathBuf {
    releases_dir(application).join(stage)
}

/// Join a stage-relative directory onto a stage path, treating `.` as the stage root.
pub fn join_directory(base: &Path, directory: &str) -> PathBuf {
    if directory.is_empty() || directory == ROOT_DIRECTORY {
        base.to_path_buf()
    } else {
        base.join(directory)
    }
}

/// Conventional branch name used for promoting `stage` of `application`.
pub fn branch_name_for(application: &str, stage: &str) -> String {
    format!("promoter-{}-{}", application, stage)
}
