//! File store collaborator.
//!
//! All paths are relative to the store root (the repository checkout).

use std::path::Path;

use crate::Result;

/// A direct child directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdirectory {
    pub name: String,
    /// Whether the entry is a symbolic link rather than a real directory.
    pub symlink: bool,
}

/// A file found while walking a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Directory relative to the walked root, `.` for the root itself.
    pub directory: String,
    pub name: String,
    pub content: String,
}

pub trait FileStore: Send + Sync {
    fn directory_exists(&self, path: &Path) -> Result<bool>;

    /// Direct child directories of `path`, sorted by name.
    fn list_subdirectories(&self, path: &Path) -> Result<Vec<Subdirectory>>;

    /// Create `path` and any missing parents.
    fn create_directory(&self, path: &Path) -> Result<()>;

    fn file_exists(&self, directory: &Path, name: &str) -> Result<bool>;

    fn read_file(&self, directory: &Path, name: &str) -> Result<String>;

    fn write_file(&self, directory: &Path, name: &str, content: &str, mode: u32) -> Result<()>;

    fn delete_file(&self, directory: &Path, name: &str) -> Result<()>;

    /// Every regular file below `root`, recursively, sorted by `(directory, name)`.
    fn list_files(&self, root: &Path) -> Result<Vec<StoredFile>>;
}

/// Permission bits used for files written by the engine.
pub const DEFAULT_FILE_MODE: u32 = 0o644;
