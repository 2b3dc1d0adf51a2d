//! BLADE ingestion - load logistics mock data into Databricks SQL tables
//!
//! Provides:
//! - Source normalization (JSON passthrough, CSV with multi-value fields)
//! - A read-only registry of supported data types
//! - Request building from a data type and source format
//! - Idempotent provisioning, bulk insert and row count verification
//!   through a pluggable SQL executor
//! - Configuration from the environment or TOML

pub mod adapter;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod import;
pub mod models;
pub mod registry;
pub mod storage;
pub mod warehouse;

// Re-export commonly used types
pub use adapter::{FileLoader, MockDataLoader, RequestError, SourceAdapter};
pub use config::{ConfigError, WarehouseConfig};
pub use import::{ImportError, NormalizeOptions, normalize};
pub use models::{
    CanonicalRecord, DataTypeMapping, FileFormat, IngestionMode, IngestionRequest,
    IngestionResult, IngestionStatus, RowCountSource,
};
pub use registry::{RegistryError, TypeRegistry, list_supported_types};
pub use storage::{FileSystemStorageBackend, StorageBackend, StorageError};
#[cfg(feature = "databricks")]
pub use warehouse::DatabricksSqlExecutor;
pub use warehouse::{
    CallContext, EngineOptions, ExecutorError, IngestError, IngestFailure, IngestionEngine,
    SqlExecutor, WarehouseTarget,
};
