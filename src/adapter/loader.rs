//! Source file loading

use async_trait::async_trait;

use crate::models::FileFormat;
use crate::storage::{StorageBackend, StorageError};

/// Supplies raw source bytes for a data type in a given format
#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn load(&self, data_type: &str, format: FileFormat) -> Result<Vec<u8>, StorageError>;
}

/// Loads mock data laid out as `<type>/<type>_data.<ext>` in a storage backend
#[derive(Debug, Clone)]
pub struct MockDataLoader<B> {
    backend: B,
}

impl<B: StorageBackend> MockDataLoader<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Relative path of the fixture for a data type and format
    pub fn fixture_path(data_type: &str, format: FileFormat) -> String {
        format!("{0}/{0}_data.{1}", data_type, format.extension())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: StorageBackend> FileLoader for MockDataLoader<B> {
    async fn load(&self, data_type: &str, format: FileFormat) -> Result<Vec<u8>, StorageError> {
        let path = Self::fixture_path(data_type, format);
        self.backend.read_file(&path).await
    }
}
