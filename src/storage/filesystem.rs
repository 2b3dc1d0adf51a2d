//! Local directory storage
//!
//! Paths are always relative to the source root. A path with a `..`
//! component is refused outright, and a path that exists is canonicalized
//! so a symlink cannot lead outside the root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{StorageBackend, StorageError};

/// Reads source files below a root directory
#[derive(Debug, Clone)]
pub struct FileSystemStorageBackend {
    root: PathBuf,
}

impl FileSystemStorageBackend {
    /// Serve files below `root`
    ///
    /// # Example
    ///
    /// ```rust
    /// use blade_ingest::storage::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new("mock_blade_data/");
    /// assert!(backend.base_path().ends_with("mock_blade_data"));
    /// ```
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.root
    }

    /// Map a relative source path onto the root
    fn resolve_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StorageError::PermissionDenied(format!(
                "{path} is not a plain relative path"
            )));
        }

        let candidate = self.root.join(relative);
        if !candidate.exists() {
            return Ok(candidate);
        }

        let resolved = candidate
            .canonicalize()
            .map_err(|e| StorageError::IoError(format!("Cannot resolve {path}: {e}")))?;
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());

        if resolved.starts_with(&root) {
            Ok(resolved)
        } else {
            Err(StorageError::PermissionDenied(format!(
                "{path} resolves outside the source root"
            )))
        }
    }
}

#[async_trait]
impl StorageBackend for FileSystemStorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve_path(path)?;
        debug!(path = %resolved.display(), "Reading source file");

        fs::read(&resolved).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::FileNotFound(path.to_string()),
            ErrorKind::PermissionDenied => StorageError::PermissionDenied(format!("{path}: {e}")),
            _ => StorageError::IoError(format!("Cannot read {path}: {e}")),
        })
    }
}
