//! CLI error type

use thiserror::Error;

use crate::adapter::RequestError;
use crate::config::ConfigError;
use crate::warehouse::{ExecutorError, IngestError};

/// Errors that end a CLI run with a non-zero exit code
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Failed to connect to Databricks: {0}")]
    Connection(#[source] ExecutorError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Failed to render output: {0}")]
    Output(String),
}

impl CliError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(e) => e.user_message(),
            CliError::Request(e) => e.user_message(),
            CliError::Connection(e) => format!("Failed to connect to Databricks.\n{}", e.user_message()),
            CliError::Ingest(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}
