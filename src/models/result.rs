//! Ingestion result reporting

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Terminal state of one ingestion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Completed,
    Failed,
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionStatus::Completed => write!(f, "completed"),
            IngestionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Where `rows_ingested` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCountSource {
    /// Counted by the warehouse after the insert
    Verified,
    /// Number of records submitted; used when the count could not be read
    Submitted,
}

impl RowCountSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowCountSource::Verified => "verified",
            RowCountSource::Submitted => "submitted",
        }
    }
}

/// Outcome of one ingestion call.
///
/// Built through [`IngestionResult::completed`] or [`IngestionResult::failed`]
/// so that a failed result always carries an error and zero rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResult {
    table_name: String,
    status: IngestionStatus,
    rows_ingested: u64,
    row_count_source: RowCountSource,
    duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    metadata: Map<String, Value>,
}

impl IngestionResult {
    /// A successful ingestion
    pub fn completed(
        table_name: impl Into<String>,
        rows_ingested: u64,
        row_count_source: RowCountSource,
        duration: Duration,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            status: IngestionStatus::Completed,
            rows_ingested,
            row_count_source,
            duration_ms: duration.as_millis() as u64,
            error: None,
            metadata,
        }
    }

    /// A failed ingestion; rows are always zero
    pub fn failed(
        table_name: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            status: IngestionStatus::Failed,
            rows_ingested: 0,
            row_count_source: RowCountSource::Submitted,
            duration_ms: duration.as_millis() as u64,
            error: Some(error.into()),
            metadata,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn status(&self) -> IngestionStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == IngestionStatus::Completed
    }

    pub fn rows_ingested(&self) -> u64 {
        self.rows_ingested
    }

    pub fn row_count_source(&self) -> RowCountSource {
        self.row_count_source
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let ms = self.duration_ms;
        if ms < 1_000 {
            format!("{}ms", ms)
        } else if ms < 60_000 {
            format!("{:.2}s", ms as f64 / 1_000.0)
        } else {
            format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1_000)
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
