//! File store backed by the local file system.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use promoter_core::layout::ROOT_DIRECTORY;
use promoter_core::{Error, FileStore, Result, StoredFile, Subdirectory};

/// A [`FileStore`] rooted at a directory, usually a repository checkout.
#[derive(Debug, Clone)]
pub struct OsFileStore {
    root: PathBuf,
}

impl OsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn walk(&self, base: &Path, current: &Path, out: &mut Vec<StoredFile>) -> Result<()> {
        let entries = fs::read_dir(current).map_err(|e| io_error(current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error(current, e))?;
            let path = entry.path();
            let metadata = fs::metadata(&path).map_err(|e| io_error(&path, e))?;
            if metadata.is_dir() {
                self.walk(base, &path, out)?;
                continue;
            }
            if !metadata.is_file() {
                continue;
            }

            let content = read_lossy(&path)?;
            let directory = path
                .parent()
                .and_then(|p| p.strip_prefix(base).ok())
                .map(|p| p.to_string_lossy().into_owned())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ROOT_DIRECTORY.to_string());
            out.push(StoredFile {
                directory,
                name: entry.file_name().to_string_lossy().into_owned(),
                content,
            });
        }
        Ok(())
    }
}

/// File content as text. Bytes that are not UTF-8 become U+FFFD.
fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

impl FileStore for OsFileStore {
    fn directory_exists(&self, path: &Path) -> Result<bool> {
        match fs::metadata(self.resolve(path)) {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(path, e)),
        }
    }

    fn list_subdirectories(&self, path: &Path) -> Result<Vec<Subdirectory>> {
        let dir = self.resolve(path);
        let entries = fs::read_dir(&dir).map_err(|e| io_error(path, e))?;

        let mut subdirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(path, e))?;
            let entry_path = entry.path();
            let link = fs::symlink_metadata(&entry_path).map_err(|e| io_error(&entry_path, e))?;
            let symlink = link.file_type().is_symlink();
            // Symlinks count only when they point at a directory.
            let is_dir = if symlink {
                fs::metadata(&entry_path).map(|m| m.is_dir()).unwrap_or(false)
            } else {
                link.is_dir()
            };
            if is_dir {
                subdirs.push(Subdirectory {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    symlink,
                });
            }
        }
        subdirs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subdirs)
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| io_error(path, e))
    }

    fn file_exists(&self, directory: &Path, name: &str) -> Result<bool> {
        match fs::metadata(self.resolve(&directory.join(name))) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&directory.join(name), e)),
        }
    }

    fn read_file(&self, directory: &Path, name: &str) -> Result<String> {
        let relative = directory.join(name);
        read_lossy(&self.resolve(&relative))
    }

    fn write_file(&self, directory: &Path, name: &str, content: &str, mode: u32) -> Result<()> {
        let relative = directory.join(name);
        let path = self.resolve(&relative);
        let existed = path.exists();
        fs::write(&path, content).map_err(|e| io_error(&relative, e))?;
        if !existed {
            set_mode(&path, mode).map_err(|e| io_error(&relative, e))?;
        }
        Ok(())
    }

    fn delete_file(&self, directory: &Path, name: &str) -> Result<()> {
        let relative = directory.join(name);
        fs::remove_file(self.resolve(&relative)).map_err(|e| io_error(&relative, e))
    }

    fn list_files(&self, root: &Path) -> Result<Vec<StoredFile>> {
        let base = self.resolve(root);
        let mut files = Vec::new();
        self.walk(&base, &base, &mut files)?;
        files.sort_by(|a, b| {
            a.directory
                .cmp(&b.directory)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(files)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

fn io_error(path: &Path, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::io(path.display().to_string(), e)
    }
}
