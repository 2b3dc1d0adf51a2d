//! BLADE source adapter
//!
//! Builds [`IngestionRequest`]s from a logical data type and a requested
//! source format. The adapter resolves the destination table through the
//! type registry, loads the source bytes through a [`FileLoader`] and
//! normalizes them into canonical records. No warehouse call is made here,
//! so every error returned by this module happens before any side effect.

pub mod loader;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::import::{self, ImportError, NormalizeOptions};
use crate::models::request::{
    META_DATA_TYPE, META_DESCRIPTION, META_INTEGRATION, META_MODE, META_ORIGINAL_FORMAT,
    META_SOURCE_SYSTEM,
};
use crate::models::{FileFormat, IngestionMode, IngestionRequest};
use crate::registry::{self, RegistryError, TypeRegistry};
use crate::storage::StorageError;

pub use loader::{FileLoader, MockDataLoader};

/// Default `source_system` metadata value
pub const DEFAULT_SOURCE_SYSTEM: &str = "BLADE";

/// `integration` metadata value stamped on every request
pub const INTEGRATION_TAG: &str = "databricks_poc";

/// Reader options handed to the warehouse alongside the records
pub const FORMAT_OPTIONS: &str = "'multiLine' = 'true', 'inferSchema' = 'true'";

/// Errors raised while building an ingestion request
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Unsupported data type: {data_type}")]
    UnsupportedDataType {
        data_type: String,
        supported: Vec<String>,
    },

    #[error("Unsupported format: {0}. Use JSON or CSV")]
    UnsupportedFormat(String),

    #[error("Source data for '{data_type}' is unavailable: {source}")]
    SourceUnavailable {
        data_type: String,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl RequestError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            RequestError::UnsupportedDataType {
                data_type,
                supported,
            } => format!(
                "Unsupported data type: {data_type}\n\nHint: Supported types are: {}",
                supported.join(", ")
            ),
            RequestError::UnsupportedFormat(format) => format!(
                "Unsupported format: {format}\n\nHint: Use JSON or CSV (case-insensitive)."
            ),
            RequestError::SourceUnavailable { data_type, source } => format!(
                "Could not load source data for '{data_type}': {source}\n\n\
                Hint: Check that the mock data directory contains {data_type}/{data_type}_data.json or .csv."
            ),
            RequestError::Import(e) => e.user_message(),
        }
    }
}

/// Turns data type and format selections into ingestion requests
pub struct SourceAdapter {
    data_source: String,
    source_system: String,
    registry: Arc<TypeRegistry>,
    loader: Arc<dyn FileLoader>,
    normalize_options: NormalizeOptions,
}

impl SourceAdapter {
    /// Create an adapter over the built-in registry
    pub fn new(data_source: impl Into<String>, loader: Arc<dyn FileLoader>) -> Self {
        Self {
            data_source: data_source.into(),
            source_system: DEFAULT_SOURCE_SYSTEM.to_string(),
            registry: registry::shared(),
            loader,
            normalize_options: NormalizeOptions::default(),
        }
    }

    /// Use a custom registry
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Override the `source_system` metadata value
    pub fn with_source_system(mut self, source_system: impl Into<String>) -> Self {
        self.source_system = source_system.into();
        self
    }

    /// Override CSV normalization options
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize_options = options;
        self
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Data types this adapter can build requests for, sorted
    pub fn supported_data_types(&self) -> Vec<&str> {
        self.registry.supported_types()
    }

    /// Build a request for `data_type` read in `format`.
    ///
    /// An empty `format` selects JSON. The request's `file_format` is always
    /// JSON; the requested format is kept as `original_format` metadata.
    pub async fn prepare_ingestion_request(
        &self,
        data_type: &str,
        format: &str,
    ) -> Result<IngestionRequest, RequestError> {
        let mapping = self.registry.lookup(data_type).map_err(|e| match e {
            RegistryError::NotFound(data_type) | RegistryError::Duplicate(data_type) => {
                RequestError::UnsupportedDataType {
                    data_type,
                    supported: self
                        .registry
                        .supported_types()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                }
            }
        })?;

        let format = parse_format(format)?;

        debug!(data_type, format = %format, "Loading source data");
        let bytes = self.loader.load(data_type, format).await.map_err(|source| {
            RequestError::SourceUnavailable {
                data_type: data_type.to_string(),
                source,
            }
        })?;

        let records = import::normalize(&bytes, format, &self.normalize_options)?;

        let mut metadata = BTreeMap::new();
        metadata.insert(META_SOURCE_SYSTEM.to_string(), self.source_system.clone());
        metadata.insert(META_DATA_TYPE.to_string(), data_type.to_string());
        metadata.insert(META_INTEGRATION.to_string(), INTEGRATION_TAG.to_string());
        metadata.insert(META_DESCRIPTION.to_string(), mapping.description.clone());
        metadata.insert(META_MODE.to_string(), IngestionMode::MockData.to_string());
        metadata.insert(META_ORIGINAL_FORMAT.to_string(), format.to_string());

        info!(
            data_type,
            table = %mapping.table_name,
            original_format = %format,
            records = records.len(),
            "Prepared ingestion request"
        );

        Ok(IngestionRequest {
            table_name: mapping.table_name.clone(),
            source_path: mapping.source_path_hint.clone(),
            file_format: FileFormat::Json,
            format_options: FORMAT_OPTIONS.to_string(),
            data_source: self.data_source.clone(),
            records,
            metadata,
        })
    }
}

fn parse_format(format: &str) -> Result<FileFormat, RequestError> {
    if format.trim().is_empty() {
        return Ok(FileFormat::default());
    }
    format
        .trim()
        .parse()
        .map_err(|_| RequestError::UnsupportedFormat(format.to_string()))
}
