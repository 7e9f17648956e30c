//! Tree diff between a stage's current release and a candidate, and its application.

use std::path::Path;

use promoter_core::layout::join_directory;
use promoter_core::store::DEFAULT_FILE_MODE;
use promoter_core::{Error, FileLocation, FileStore, Release, ReleaseFile, Result};
use serde::Serialize;
use similar::TextDiff;
use tracing::debug;

/// A single file-store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FileOperation {
    Delete(FileLocation),
    Modify(ReleaseFile),
    Create(ReleaseFile),
}

impl FileOperation {
    pub fn location(&self) -> FileLocation {
        match self {
            FileOperation::Delete(location) => location.clone(),
            FileOperation::Modify(file) | FileOperation::Create(file) => file.location(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FileOperation::Delete(_) => "delete",
            FileOperation::Modify(_) => "modify",
            FileOperation::Create(_) => "create",
        }
    }
}

/// Minimal set of operations turning `current` into `candidate`.
///
/// Each list is sorted by `(directory, name)`. Files present in both with
/// identical content produce no operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeDiff {
    pub deletes: Vec<FileLocation>,
    pub modifications: Vec<ReleaseFile>,
    pub creations: Vec<ReleaseFile>,
}

impl TreeDiff {
    pub fn between(current: &Release, candidate: &Release) -> Self {
        let current = current.by_location();
        let candidate = candidate.by_location();

        let mut diff = TreeDiff::default();
        for (location, file) in &current {
            match candidate.get(location) {
                None => diff.deletes.push(location.clone()),
                Some(next) if next.content != file.content => {
                    diff.modifications.push((*next).clone())
                }
                Some(_) => {}
            }
        }
        for (location, file) in &candidate {
            if !current.contains_key(location) {
                diff.creations.push((*file).clone());
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.modifications.is_empty() && self.creations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.modifications.len() + self.creations.len()
    }

    /// Operations in execution order: deletes, then modifications, then creations.
    pub fn operations(&self) -> Vec<FileOperation> {
        self.deletes
            .iter()
            .cloned()
            .map(FileOperation::Delete)
            .chain(self.modifications.iter().cloned().map(FileOperation::Modify))
            .chain(self.creations.iter().cloned().map(FileOperation::Create))
            .collect()
    }
}

/// Execute `diff` against the stage rooted at `stage_root`.
///
/// Not atomic: the first failure stops execution and reports how many
/// operations had already been applied.
pub fn apply_diff(store: &dyn FileStore, stage_root: &Path, diff: &TreeDiff) -> Result<usize> {
    let mut applied = 0;
    for operation in diff.operations() {
        let location = operation.location();
        let directory = join_directory(stage_root, &location.directory);

        let outcome = match &operation {
            FileOperation::Delete(_) => store.delete_file(&directory, &location.name),
            FileOperation::Modify(file) => {
                store.write_file(&directory, &file.name, &file.content, DEFAULT_FILE_MODE)
            }
            FileOperation::Create(file) => store.create_directory(&directory).and_then(|_| {
                store.write_file(&directory, &file.name, &file.content, DEFAULT_FILE_MODE)
            }),
        };

        if let Err(e) = outcome {
            return Err(Error::PartialApply {
                file: location.to_string(),
                applied,
                message: e.to_string(),
            });
        }
        debug!(file = %location, op = operation.kind(), "Applied file operation");
        applied += 1;
    }
    Ok(applied)
}

/// Unified line diff of the canonical text of two releases.
pub fn unified_diff(current: &Release, candidate: &Release) -> String {
    let old = current.canonical_text();
    let new = candidate.canonical_text();
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(&old, &new)
        .unified_diff()
        .context_radius(3)
        .header("current", "candidate")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use promoter_core::MemoryFileStore;

    fn release(files: &[(&str, &str, &str)]) -> Release {
        Release::new(
            files
                .iter()
                .map(|(dir, name, content)| ReleaseFile::new(*dir, *name, *content))
                .collect(),
        )
    }

    fn loc(directory: &str, name: &str) -> FileLocation {
        FileLocation {
            directory: directory.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_delete_and_create_only() {
        let current = release(&[(".", "A", "1"), (".", "B", "2")]);
        let candidate = release(&[(".", "A", "1"), (".", "C", "3")]);

        let diff = TreeDiff::between(&current, &candidate);
        assert_eq!(diff.deletes, vec![loc(".", "B")]);
        assert!(diff.modifications.is_empty());
        assert_eq!(diff.creations, vec![ReleaseFile::new(".", "C", "3")]);
        assert_eq!(diff.len(), 2);
    }

    #[test]
    fn test_identical_releases_have_empty_diff() {
        let current = release(&[(".", "A", "1"), ("sub", "B", "2")]);
        let diff = TreeDiff::between(&current, &current.clone());
        assert!(diff.is_empty());
        assert!(unified_diff(&current, &current).is_empty());
    }

    #[test]
    fn test_same_name_in_different_directories() {
        let current = release(&[(".", "values.yaml", "a"), ("x", "values.yaml", "b")]);
        let candidate = release(&[(".", "values.yaml", "a"), ("x", "values.yaml", "c")]);

        let diff = TreeDiff::between(&current, &candidate);
        assert_eq!(diff.modifications, vec![ReleaseFile::new("x", "values.yaml", "c")]);
        assert!(diff.deletes.is_empty());
        assert!(diff.creations.is_empty());
    }

    #[test]
    fn test_apply_writes_through_store() {
        let root = "apps/a1/releases/01-staging";
        let store = MemoryFileStore::new()
            .with_file(format!("{root}/A"), "1")
            .with_file(format!("{root}/B"), "2")
            .with_file(format!("{root}/M"), "old");

        let current = release(&[(".", "A", "1"), (".", "B", "2"), (".", "M", "old")]);
        let candidate = release(&[(".", "A", "1"), (".", "M", "new"), ("deep/er", "C", "3")]);
        let diff = TreeDiff::between(&current, &candidate);

        let applied = apply_diff(&store, Path::new(root), &diff).unwrap();
        assert_eq!(applied, 3);
        assert_eq!(
            store.paths(),
            vec![
                format!("{root}/A"),
                format!("{root}/M"),
                format!("{root}/deep/er/C"),
            ]
        );
        assert_eq!(store.get(format!("{root}/M")).as_deref(), Some("new"));
        assert_eq!(store.get(format!("{root}/deep/er/C")).as_deref(), Some("3"));
    }

    #[test]
    fn test_apply_reports_partial_progress() {
        let root = "apps/a1/releases/01-staging";
        // B is missing on disk, so its delete fails after A's delete succeeded.
        let store = MemoryFileStore::new().with_file(format!("{root}/A"), "1");
        let current = release(&[(".", "A", "1"), (".", "B", "2")]);
        let candidate = release(&[(".", "C", "3")]);

        let err = apply_diff(&store, Path::new(root), &TreeDiff::between(&current, &candidate))
            .unwrap_err();
        match err {
            Error::PartialApply { file, applied, .. } => {
                assert_eq!(file, "B");
                assert_eq!(applied, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unified_diff_shows_changed_lines() {
        let current = release(&[(".", "A", "replicas: 1")]);
        let candidate = release(&[(".", "A", "replicas: 3")]);

        let text = unified_diff(&current, &candidate);
        assert!(text.contains("--- current"));
        assert!(text.contains("+++ candidate"));
        assert!(text.contains("-replicas: 1"));
        assert!(text.contains("+replicas: 3"));
    }
}
