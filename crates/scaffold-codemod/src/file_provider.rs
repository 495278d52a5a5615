use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Abstraction over the project directory so the overlay can be layered over
/// the real filesystem or over an in-memory tree.
pub trait FileProvider: Send + Sync {
    /// Read the contents of a file at the given path
    fn read_file(&self, path: &Path) -> Result<String, FileProviderError>;

    /// Check if a regular file exists at the given path
    fn is_file(&self, path: &Path) -> bool;

    /// List the entry names (not full paths) of a directory
    fn list_directory(&self, path: &Path) -> Result<Vec<String>, FileProviderError>;

    /// Write a file, creating parent directories as needed
    fn write_file(&self, path: &Path, content: &str) -> Result<(), FileProviderError>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> Result<(), FileProviderError>;
}

/// Blanket implementation of FileProvider for Arc<T> where T: FileProvider
impl<T: FileProvider + ?Sized> FileProvider for Arc<T> {
    fn read_file(&self, path: &Path) -> Result<String, FileProviderError> {
        (**self).read_file(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>, FileProviderError> {
        (**self).list_directory(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), FileProviderError> {
        (**self).write_file(path, content)
    }

    fn remove_file(&self, path: &Path) -> Result<(), FileProviderError> {
        (**self).remove_file(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileProviderError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

impl FileProviderError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => FileProviderError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                FileProviderError::PermissionDenied(path.to_path_buf())
            }
            _ => FileProviderError::IoError(e.to_string()),
        }
    }
}

/// Default implementation of FileProvider that uses the actual file system
#[derive(Debug, Clone, Default)]
pub struct DefaultFileProvider;

impl DefaultFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FileProvider for DefaultFileProvider {
    fn read_file(&self, path: &Path) -> Result<String, FileProviderError> {
        std::fs::read_to_string(path).map_err(|e| FileProviderError::from_io(path, e))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>, FileProviderError> {
        let entries = std::fs::read_dir(path).map_err(|e| FileProviderError::from_io(path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(e) => names.push(e.file_name().to_string_lossy().into_owned()),
                Err(e) => return Err(FileProviderError::IoError(e.to_string())),
            }
        }
        Ok(names)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), FileProviderError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FileProviderError::from_io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| FileProviderError::from_io(path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<(), FileProviderError> {
        std::fs::remove_file(path).map_err(|e| FileProviderError::from_io(path, e))
    }
}

/// In-memory file tree keyed by absolute path. Directories are implicit.
#[derive(Debug, Default)]
pub struct InMemoryFileProvider {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl InMemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from `(path, content)` pairs.
    pub fn with_files<P, S, I>(files: I) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
        I: IntoIterator<Item = (P, S)>,
    {
        let files = files
            .into_iter()
            .map(|(p, s)| (p.into(), s.into()))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }

    /// Snapshot of every file currently stored.
    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        self.files.read().unwrap().clone()
    }
}

impl FileProvider for InMemoryFileProvider {
    fn read_file(&self, path: &Path) -> Result<String, FileProviderError> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FileProviderError::NotFound(path.to_path_buf()))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>, FileProviderError> {
        let files = self.files.read().unwrap();
        let mut names: Vec<String> = Vec::new();
        for file in files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            if let Some(first) = rest.components().next() {
                let name = first.as_os_str().to_string_lossy().into_owned();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        if names.is_empty() {
            return Err(FileProviderError::NotFound(path.to_path_buf()));
        }
        Ok(names)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), FileProviderError> {
        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FileProviderError> {
        self.files
            .write()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FileProviderError::NotFound(path.to_path_buf()))
    }
}
