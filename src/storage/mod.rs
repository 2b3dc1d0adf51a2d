//! Source file storage
//!
//! Mock data is read through [`StorageBackend`] so request building does not
//! care where the files live. [`FileSystemStorageBackend`] serves a local
//! directory, which is the default mock data root.

use async_trait::async_trait;

pub mod filesystem;

pub use filesystem::FileSystemStorageBackend;

/// Failure to read a source file
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Source file not found: {0}")]
    FileNotFound(String),
    #[error("Access denied: {0}")]
    PermissionDenied(String),
    #[error("Storage I/O failed: {0}")]
    IoError(String),
}

/// Read-only access to source files, addressed by paths relative to a root
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Full contents of the file at `path`
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}
