//! Ingestion engine
//!
//! Runs one ingestion call as a fixed sequence of phases:
//!
//! 1. mode check (no SQL for anything but mock data)
//! 2. provisioning: catalog, schema, then table, each `IF NOT EXISTS`
//! 3. one multi-row insert tagged with a batch id
//! 4. best-effort verification of the batch row count
//!
//! Every call ends in exactly one [`IngestionResult`]. Failures also return
//! the [`IngestError`] that caused them, wrapped in an [`IngestFailure`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::error::{IngestError, ProvisioningStage, VerificationError};
use super::executor::{
    ExecutorError, SqlExecutor, Statement, StatementOptions, StatementResponse, StatementState,
};
use super::sql::{self, TableRef};
use crate::models::{IngestionMode, IngestionRequest, IngestionResult, RowCountSource};
use crate::models::request::META_MODE;

/// Server-side wait for each statement
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time granted on top of the wait timeout before a call is abandoned
pub const DEFAULT_CALL_GRACE: Duration = Duration::from_secs(5);

/// `ingestion_type` recorded on every result
pub const INGESTION_TYPE: &str = "mock_data_insert";

/// Warehouse and namespace that receive the data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTarget {
    pub warehouse_id: String,
    pub catalog: String,
    pub schema: String,
}

impl WarehouseTarget {
    pub fn new(
        warehouse_id: impl Into<String>,
        catalog: impl Into<String>,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
            catalog: catalog.into(),
            schema: schema.into(),
        }
    }
}

/// Timing limits for executor calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub wait_timeout: Duration,
    pub call_grace: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            call_grace: DEFAULT_CALL_GRACE,
        }
    }
}

impl EngineOptions {
    /// Longest a single executor call may take
    pub fn call_bound(&self) -> Duration {
        self.wait_timeout + self.call_grace
    }
}

/// Caller-side cancellation and deadline for one ingestion call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort executor calls when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Abort executor calls that would run past `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// A failed ingestion: the structured result plus the error behind it
#[derive(Debug, thiserror::Error)]
#[error("Ingestion into {} failed", .result.table_name())]
pub struct IngestFailure {
    pub result: IngestionResult,
    #[source]
    pub error: IngestError,
}

struct Outcome {
    rows: u64,
    row_count_source: RowCountSource,
    batch_id: Option<String>,
    insert_pending: bool,
}

/// Loads ingestion requests into warehouse tables
pub struct IngestionEngine {
    executor: Arc<dyn SqlExecutor>,
    target: WarehouseTarget,
    options: EngineOptions,
}

impl IngestionEngine {
    pub fn new(executor: Arc<dyn SqlExecutor>, target: WarehouseTarget, options: EngineOptions) -> Self {
        Self {
            executor,
            target,
            options,
        }
    }

    pub fn target(&self) -> &WarehouseTarget {
        &self.target
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Check that the warehouse accepts statements
    pub async fn ping(&self, ctx: &CallContext) -> Result<(), ExecutorError> {
        let response = self
            .execute(&sql::select_one(), &self.statement_options(false), ctx)
            .await?;
        if response.state == StatementState::Pending {
            warn!(warehouse_id = %self.target.warehouse_id, "Warehouse is still starting");
        }
        debug!(warehouse_id = %self.target.warehouse_id, "Warehouse reachable");
        Ok(())
    }

    /// Ingest with no caller cancellation or deadline
    pub async fn ingest(&self, request: IngestionRequest) -> Result<IngestionResult, IngestFailure> {
        self.ingest_with_context(request, &CallContext::default()).await
    }

    pub async fn ingest_with_context(
        &self,
        request: IngestionRequest,
        ctx: &CallContext,
    ) -> Result<IngestionResult, IngestFailure> {
        let span = info_span!(
            "ingest",
            table = %request.table_name,
            data_type = request.data_type().unwrap_or_default(),
            records = request.records.len()
        );

        let start = Instant::now();
        let outcome = self.run(&request, ctx).instrument(span.clone()).await;
        let duration = start.elapsed();

        span.in_scope(|| finish(request, outcome, duration))
    }

    /// Create catalog, schema and table if they do not exist.
    ///
    /// Safe to call repeatedly; each step runs only after the previous one
    /// succeeded.
    pub async fn provision(&self, table_name: &str, ctx: &CallContext) -> Result<TableRef, IngestError> {
        let table = TableRef::new(&self.target.catalog, &self.target.schema, table_name)?;
        let options = self.statement_options(false);

        let steps = [
            (ProvisioningStage::Catalog, sql::create_catalog(&table)),
            (ProvisioningStage::Schema, sql::create_schema(&table)),
            (ProvisioningStage::Table, sql::create_table(&table)),
        ];

        for (stage, statement) in steps {
            debug!(stage = stage.name(), sql = statement.sql(), "Provisioning");
            let response = self
                .execute(&statement, &options, ctx)
                .await
                .map_err(|source| IngestError::Provisioning { stage, source })?;
            if response.state == StatementState::Pending {
                warn!(stage = stage.name(), "Provisioning statement still running");
            }
        }

        info!(table = %table, "Destination provisioned");
        Ok(table)
    }

    async fn run(&self, request: &IngestionRequest, ctx: &CallContext) -> Result<Outcome, IngestError> {
        match request.mode() {
            Some(IngestionMode::MockData) => {}
            _ => {
                let mode = request
                    .metadata
                    .get(META_MODE)
                    .cloned()
                    .unwrap_or_else(|| "<unset>".to_string());
                return Err(IngestError::UnsupportedMode(mode));
            }
        }

        let table = self.provision(&request.table_name, ctx).await?;

        let submitted = request.records.len() as u64;
        if submitted == 0 {
            info!("No records to insert");
            return Ok(Outcome {
                rows: 0,
                row_count_source: RowCountSource::Submitted,
                batch_id: None,
                insert_pending: false,
            });
        }

        let batch_id = new_batch_id();
        let statement = sql::bulk_insert(
            &table,
            &request.records,
            &request.data_source,
            request.data_type().unwrap_or_default(),
            &batch_id,
        );

        debug!(batch_id = %batch_id, parameters = statement.parameters().len(), "Submitting bulk insert");
        let response = self
            .execute(&statement, &self.statement_options(true), ctx)
            .await
            .map_err(|source| IngestError::Insert {
                batch_id: batch_id.clone(),
                source,
            })?;
        // A count taken while the insert still runs would under-report.
        let insert_pending = response.state == StatementState::Pending;
        let verified = if insert_pending {
            warn!(batch_id = %batch_id, "Insert accepted but still running, skipping verification");
            None
        } else {
            match self.verify(&table, &batch_id, ctx).await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(batch_id = %batch_id, error = %e, "Row count verification failed, using submitted count");
                    None
                }
            }
        };

        let (rows, row_count_source) = reconcile_row_count(verified, submitted);
        if row_count_source == RowCountSource::Verified && rows != submitted {
            warn!(submitted, verified = rows, "Verified row count differs from submitted");
        }

        Ok(Outcome {
            rows,
            row_count_source,
            batch_id: Some(batch_id),
            insert_pending,
        })
    }

    async fn verify(&self, table: &TableRef, batch_id: &str, ctx: &CallContext) -> Result<u64, VerificationError> {
        let response = self
            .execute(&sql::count_batch_rows(table, batch_id), &self.statement_options(true), ctx)
            .await?;

        if response.state == StatementState::Pending {
            return Err(VerificationError::Pending);
        }

        let value = response.scalar();
        value
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| VerificationError::MalformedCount(value.map(str::to_string)))
    }

    /// Run one statement, racing it against cancellation and the call bound
    async fn execute(
        &self,
        statement: &Statement,
        options: &StatementOptions,
        ctx: &CallContext,
    ) -> Result<StatementResponse, ExecutorError> {
        let now = Instant::now();
        let deadline = match ctx.deadline {
            Some(caller) => caller.min(now + self.options.call_bound()),
            None => now + self.options.call_bound(),
        };
        let bound = deadline.saturating_duration_since(now);

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(ExecutorError::Cancelled),
            result = tokio::time::timeout_at(deadline, self.executor.execute(statement, options)) => {
                result.unwrap_or(Err(ExecutorError::TimedOut(bound)))
            }
        };

        let response = outcome?;
        match &response.state {
            StatementState::Failed(message) => Err(ExecutorError::StatementFailed(message.clone())),
            _ => Ok(response),
        }
    }

    fn statement_options(&self, scoped: bool) -> StatementOptions {
        StatementOptions {
            warehouse_id: self.target.warehouse_id.clone(),
            catalog: scoped.then(|| self.target.catalog.clone()),
            schema: scoped.then(|| self.target.schema.clone()),
            wait_timeout: self.options.wait_timeout,
        }
    }
}

/// Pick the row count to report: the verified count when available,
/// otherwise the number of records submitted
pub fn reconcile_row_count(verified: Option<u64>, submitted: u64) -> (u64, RowCountSource) {
    match verified {
        Some(count) => (count, RowCountSource::Verified),
        None => (submitted, RowCountSource::Submitted),
    }
}

/// Turn a phase outcome into the call's result
fn finish(
    request: IngestionRequest,
    outcome: Result<Outcome, IngestError>,
    duration: Duration,
) -> Result<IngestionResult, IngestFailure> {
    let mut metadata = base_metadata(&request);

    match outcome {
        Ok(outcome) => {
            if let Some(batch_id) = &outcome.batch_id {
                metadata.insert("batch_id".to_string(), json!(batch_id));
            }
            if outcome.insert_pending {
                metadata.insert("insert_state".to_string(), json!("pending"));
            }
            metadata.insert(
                "row_count_source".to_string(),
                json!(outcome.row_count_source.as_str()),
            );

            info!(
                rows = outcome.rows,
                row_count_source = outcome.row_count_source.as_str(),
                duration_ms = duration.as_millis() as u64,
                "Ingestion completed"
            );

            Ok(IngestionResult::completed(
                request.table_name,
                outcome.rows,
                outcome.row_count_source,
                duration,
                metadata,
            ))
        }
        Err(error) => {
            metadata.insert("failed_stage".to_string(), json!(error.stage()));
            if let IngestError::Insert { batch_id, .. } = &error {
                metadata.insert("batch_id".to_string(), json!(batch_id));
            }

            error!(
                stage = error.stage(),
                error = %error,
                duration_ms = duration.as_millis() as u64,
                "Ingestion failed"
            );

            Err(IngestFailure {
                result: IngestionResult::failed(
                    request.table_name,
                    error.to_string(),
                    duration,
                    metadata,
                ),
                error,
            })
        }
    }
}

/// `<unix seconds>-<uuid v4 without hyphens>`
pub fn new_batch_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp(),
        Uuid::new_v4().simple()
    )
}

fn base_metadata(request: &IngestionRequest) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("source_path".to_string(), json!(request.source_path));
    metadata.insert("file_format".to_string(), json!(request.file_format.as_str()));
    metadata.insert("data_source".to_string(), json!(request.data_source));
    metadata.insert("request_metadata".to_string(), json!(request.metadata));
    metadata.insert("ingestion_type".to_string(), json!(INGESTION_TYPE));
    metadata
}
