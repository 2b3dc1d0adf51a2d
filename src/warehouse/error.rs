//! Error types for warehouse ingestion

use thiserror::Error;

use super::executor::ExecutorError;
use super::sql::SqlError;

/// Provisioning step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStage {
    Catalog,
    Schema,
    Table,
}

impl ProvisioningStage {
    pub fn name(&self) -> &'static str {
        match self {
            ProvisioningStage::Catalog => "catalog",
            ProvisioningStage::Schema => "schema",
            ProvisioningStage::Table => "table",
        }
    }
}

impl std::fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that fail an ingestion call
#[derive(Error, Debug)]
pub enum IngestError {
    /// Only mock data requests can be ingested
    #[error("Unsupported ingestion mode: {0}")]
    UnsupportedMode(String),

    /// Catalog, schema or table name cannot be used
    #[error("Invalid destination: {0}")]
    InvalidDestination(#[from] SqlError),

    /// A provisioning statement failed
    #[error("Failed to provision {stage}: {source}")]
    Provisioning {
        stage: ProvisioningStage,
        #[source]
        source: ExecutorError,
    },

    /// The bulk insert failed
    #[error("Failed to insert batch {batch_id}: {source}")]
    Insert {
        batch_id: String,
        #[source]
        source: ExecutorError,
    },
}

impl IngestError {
    /// Phase the call failed in, recorded as `failed_stage` result metadata
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::UnsupportedMode(_) => "mode",
            IngestError::InvalidDestination(_) => "destination",
            IngestError::Provisioning { stage, .. } => stage.name(),
            IngestError::Insert { .. } => "insert",
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            IngestError::UnsupportedMode(mode) => format!(
                "Unsupported ingestion mode: {mode}\n\nHint: Only mock_data requests can be ingested."
            ),
            IngestError::InvalidDestination(e) => format!(
                "Invalid destination: {e}\n\nHint: Check DATABRICKS_CATALOG and DATABRICKS_SCHEMA."
            ),
            IngestError::Provisioning { stage, source } => format!(
                "Failed to provision {stage}: {}\n\n\
                Hint: Check that the token may create catalogs, schemas and tables.",
                source.user_message()
            ),
            IngestError::Insert { batch_id, source } => format!(
                "Failed to insert batch {batch_id}: {}",
                source.user_message()
            ),
        }
    }
}

/// Row count could not be read back; recovered by the engine
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Count statement did not finish")]
    Pending,

    #[error("Count statement returned no usable value: {0:?}")]
    MalformedCount(Option<String>),
}
