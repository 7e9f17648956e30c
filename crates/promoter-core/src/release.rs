//! Releases: the set of files held by one stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::layout::{RELEASER_FILE, ROOT_DIRECTORY};

/// A single file inside a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFile {
    /// File name without any directory component.
    pub name: String,
    /// Directory relative to the stage root (`.` for the root).
    pub directory: String,
    pub content: String,
}

impl ReleaseFile {
    pub fn new(
        directory: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            content: content.into(),
        }
    }

    pub fn location(&self) -> FileLocation {
        FileLocation {
            directory: self.directory.clone(),
            name: self.name.clone(),
        }
    }

    /// Whether this is the reserved rules/metadata file.
    pub fn is_releaser_file(&self) -> bool {
        self.name == RELEASER_FILE
    }
}

/// Unique key of a file within a release. Orders by directory, then name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub directory: String,
    pub name: String,
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.directory.is_empty() || self.directory == ROOT_DIRECTORY {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.directory, self.name)
        }
    }
}

/// A collection of files held by one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub files: Vec<ReleaseFile>,
}

impl Release {
    pub fn new(files: Vec<ReleaseFile>) -> Self {
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sort files by `(directory, name)`.
    pub fn sort(&mut self) {
        self.files.sort_by(|a, b| {
            a.directory
                .cmp(&b.directory)
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    pub fn get(&self, location: &FileLocation) -> Option<&ReleaseFile> {
        self.files
            .iter()
            .find(|f| f.directory == location.directory && f.name == location.name)
    }

    /// The reserved file at the stage root, if any.
    pub fn releaser_file(&self) -> Option<&ReleaseFile> {
        self.files
            .iter()
            .find(|f| f.is_releaser_file() && f.directory == ROOT_DIRECTORY)
    }

    /// Insert a file, replacing any file at the same location.
    pub fn upsert(&mut self, file: ReleaseFile) {
        match self
            .files
            .iter_mut()
            .find(|f| f.directory == file.directory && f.name == file.name)
        {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    pub fn by_location(&self) -> BTreeMap<FileLocation, &ReleaseFile> {
        self.files.iter().map(|f| (f.location(), f)).collect()
    }

    /// Canonical text used to compare two releases.
    ///
    /// Files are ordered by `(directory, name)`, separated by `---` and each
    /// preceded by `# File:` and `# Directory:` header lines.
    pub fn canonical_text(&self) -> String {
        let mut files: Vec<&ReleaseFile> = self.files.iter().collect();
        files.sort_by(|a, b| {
            a.directory
                .cmp(&b.directory)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut out = String::new();
        for (idx, file) in files.iter().enumerate() {
            if idx != 0 {
                out.push_str("---\n");
            }
            out.push_str("# File: ");
            out.push_str(&file.name);
            out.push('\n');
            out.push_str("# Directory: ");
            out.push_str(&file.directory);
            out.push('\n');
            out.push_str(&file.content);
            out.push('\n');
        }
        out
    }
}
