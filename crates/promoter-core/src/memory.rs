//! In-memory [`FileStore`] for tests and dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::layout::ROOT_DIRECTORY;
use crate::store::{FileStore, StoredFile, Subdirectory};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Tree {
    directories: BTreeSet<PathBuf>,
    symlinks: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, (String, u32)>,
}

impl Tree {
    fn has_directory(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || self.directories.contains(path)
    }

    fn add_directory(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

/// A file tree held entirely in memory.
///
/// Directories are tracked explicitly so empty directories and symlinked
/// stage directories can be represented.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    tree: RwLock<Tree>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        let path = normalize(path.as_ref());
        {
            let mut tree = self.write();
            if let Some(parent) = path.parent() {
                tree.add_directory(parent);
            }
            tree.files.insert(path, (content.into(), crate::store::DEFAULT_FILE_MODE));
        }
        self
    }

    /// Add a directory that reports itself as a symbolic link.
    pub fn with_mirror(self, path: impl AsRef<Path>) -> Self {
        let path = normalize(path.as_ref());
        {
            let mut tree = self.write();
            tree.add_directory(&path);
            tree.symlinks.insert(path);
        }
        self
    }

    pub fn with_directory(self, path: impl AsRef<Path>) -> Self {
        let path = normalize(path.as_ref());
        self.write().add_directory(&path);
        self
    }

    /// Content of the file at `path`, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read()
            .files
            .get(&normalize(path.as_ref()))
            .map(|(content, _)| content.clone())
    }

    /// Permission bits recorded for the file at `path`.
    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.read()
            .files
            .get(&normalize(path.as_ref()))
            .map(|(_, mode)| *mode)
    }

    /// Every file path in the store, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.read().files.keys().map(|p| display(p)).collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileStore for MemoryFileStore {
    fn directory_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.read().has_directory(&normalize(path)))
    }

    fn list_subdirectories(&self, path: &Path) -> Result<Vec<Subdirectory>> {
        let path = normalize(path);
        let tree = self.read();
        if !tree.has_directory(&path) {
            return Err(Error::NotFound(format!("directory {}", display(&path))));
        }
        Ok(tree
            .directories
            .iter()
            .filter(|dir| dir.parent() == Some(path.as_path()))
            .filter_map(|dir| {
                dir.file_name().map(|name| Subdirectory {
                    name: name.to_string_lossy().into_owned(),
                    symlink: tree.symlinks.contains(dir),
                })
            })
            .collect())
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        self.write().add_directory(&normalize(path));
        Ok(())
    }

    fn file_exists(&self, directory: &Path, name: &str) -> Result<bool> {
        Ok(self.read().files.contains_key(&normalize(&directory.join(name))))
    }

    fn read_file(&self, directory: &Path, name: &str) -> Result<String> {
        let path = normalize(&directory.join(name));
        self.read()
            .files
            .get(&path)
            .map(|(content, _)| content.clone())
            .ok_or_else(|| Error::NotFound(format!("file {}", display(&path))))
    }

    fn write_file(&self, directory: &Path, name: &str, content: &str, mode: u32) -> Result<()> {
        let directory = normalize(directory);
        let mut tree = self.write();
        if !tree.has_directory(&directory) {
            return Err(Error::io(
                display(&directory.join(name)),
                io::Error::new(io::ErrorKind::NotFound, "parent directory does not exist"),
            ));
        }
        tree.files
            .insert(directory.join(name), (content.to_string(), mode));
        Ok(())
    }

    fn delete_file(&self, directory: &Path, name: &str) -> Result<()> {
        let path = normalize(&directory.join(name));
        match self.write().files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("file {}", display(&path)))),
        }
    }

    fn list_files(&self, root: &Path) -> Result<Vec<StoredFile>> {
        let root = normalize(root);
        let tree = self.read();
        if !tree.has_directory(&root) {
            return Err(Error::NotFound(format!("directory {}", display(&root))));
        }

        let mut files: Vec<StoredFile> = tree
            .files
            .iter()
            .filter_map(|(path, (content, _))| {
                let relative = path.strip_prefix(&root).ok()?;
                let name = relative.file_name()?.to_string_lossy().into_owned();
                let directory = match relative.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => display(parent),
                    _ => ROOT_DIRECTORY.to_string(),
                };
                Some(StoredFile {
                    directory,
                    name,
                    content: content.clone(),
                })
            })
            .collect();
        files.sort_by(|a, b| {
            a.directory
                .cmp(&b.directory)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(files)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn display(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
