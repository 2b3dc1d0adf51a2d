//! Warehouse ingestion
//!
//! Provisions destination tables and loads [`IngestionRequest`]s into them
//! through a [`SqlExecutor`].
//!
//! # Architecture
//!
//! - `engine`: the per-call state machine
//! - `sql`: identifier/literal quoting and statement builders
//! - `schema`: the fixed destination column set
//! - `executor`: the SQL execution seam
//! - `databricks`: Statement Execution API client (feature `databricks`)
//!
//! [`IngestionRequest`]: crate::models::IngestionRequest

#[cfg(feature = "databricks")]
pub mod databricks;
pub mod engine;
pub mod error;
pub mod executor;
pub mod schema;
pub mod sql;

#[cfg(feature = "databricks")]
pub use databricks::DatabricksSqlExecutor;
pub use engine::{CallContext, EngineOptions, IngestFailure, IngestionEngine, WarehouseTarget};
pub use error::{IngestError, ProvisioningStage, VerificationError};
pub use executor::{
    ExecutorError, SqlExecutor, Statement, StatementOptions, StatementParameter, StatementResponse,
    StatementState,
};
pub use sql::{SqlError, TableRef};
