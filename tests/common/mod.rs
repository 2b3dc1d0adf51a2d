//! Shared test helpers: an in-memory SQL executor and request fixtures

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use blade_ingest::models::request::{META_DATA_TYPE, META_MODE, META_ORIGINAL_FORMAT};
use blade_ingest::warehouse::{
    ExecutorError, SqlExecutor, Statement, StatementOptions, StatementResponse, StatementState,
};
use blade_ingest::{CanonicalRecord, FileFormat, IngestionRequest};

/// Canned reply for statements whose SQL starts with a prefix
#[derive(Debug, Clone)]
pub enum Reply {
    Error(ExecutorError),
    State(StatementState),
    Value(Option<String>),
}

/// Executor that records every statement and answers from memory.
///
/// Inserts are counted per `batch_id` so that `SELECT COUNT(*)` returns
/// the number of rows written by that batch, like a real table would.
#[derive(Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<(Statement, StatementOptions)>>,
    batches: Mutex<HashMap<String, u64>>,
    rules: Vec<(String, Reply)>,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements starting with `prefix` with `reply`
    pub fn reply(mut self, prefix: &str, reply: Reply) -> Self {
        self.rules.push((prefix.to_string(), reply));
        self
    }

    pub fn fail_on(self, prefix: &str, error: ExecutorError) -> Self {
        self.reply(prefix, Reply::Error(error))
    }

    /// Sleep before answering every statement
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .expect("Executor lock poisoned")
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }

    pub fn options(&self) -> Vec<StatementOptions> {
        self.statements
            .lock()
            .expect("Executor lock poisoned")
            .iter()
            .map(|(_, o)| o.clone())
            .collect()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.statements()
            .iter()
            .map(|s| s.sql().to_string())
            .collect()
    }

    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.sql_log()
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute(
        &self,
        statement: &Statement,
        options: &StatementOptions,
    ) -> Result<StatementResponse, ExecutorError> {
        self.statements
            .lock()
            .expect("Executor lock poisoned")
            .push((statement.clone(), options.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let sql = statement.sql();
        if let Some((_, reply)) = self.rules.iter().find(|(prefix, _)| sql.starts_with(prefix.as_str())) {
            return match reply {
                Reply::Error(e) => Err(e.clone()),
                Reply::State(state) => Ok(StatementResponse {
                    statement_id: Some("stmt-1".to_string()),
                    state: state.clone(),
                    rows: Vec::new(),
                }),
                Reply::Value(value) => Ok(StatementResponse::succeeded(vec![vec![value.clone()]])),
            };
        }

        let batch_id = statement
            .parameter("batch_id")
            .flatten()
            .map(str::to_string);

        if sql.starts_with("INSERT") {
            let rows = statement
                .parameters()
                .iter()
                .filter(|p| p.name.starts_with("raw_data_"))
                .count() as u64;
            if let Some(batch_id) = batch_id {
                *self
                    .batches
                    .lock()
                    .expect("Executor lock poisoned")
                    .entry(batch_id)
                    .or_default() += rows;
            }
            return Ok(StatementResponse::succeeded(Vec::new()));
        }

        if sql.starts_with("SELECT COUNT(*)") {
            let count = batch_id
                .and_then(|id| self.batches.lock().expect("Executor lock poisoned").get(&id).copied())
                .unwrap_or(0);
            return Ok(StatementResponse::succeeded(vec![vec![Some(count.to_string())]]));
        }

        if sql == "SELECT 1" {
            return Ok(StatementResponse::succeeded(vec![vec![Some("1".to_string())]]));
        }

        Ok(StatementResponse::succeeded(Vec::new()))
    }
}

/// A maintenance record with the well-known columns filled in
pub fn maintenance_record(item_id: &str) -> CanonicalRecord {
    CanonicalRecord::new()
        .with("item_id", item_id)
        .with("item_type", "engine")
        .with("classification_marking", "UNCLASSIFIED")
        .with("timestamp", "2024-01-15T10:00:00Z")
}

/// A mock-data request for `table` holding `records`
pub fn mock_request(table: &str, records: Vec<CanonicalRecord>) -> IngestionRequest {
    let mut metadata = BTreeMap::new();
    metadata.insert(META_MODE.to_string(), "mock_data".to_string());
    metadata.insert(META_DATA_TYPE.to_string(), "maintenance".to_string());
    metadata.insert(META_ORIGINAL_FORMAT.to_string(), "CSV".to_string());

    IngestionRequest {
        table_name: table.to_string(),
        source_path: "mock://maintenance".to_string(),
        file_format: FileFormat::Json,
        format_options: "'multiLine' = 'true', 'inferSchema' = 'true'".to_string(),
        data_source: "BLADE_LOGISTICS".to_string(),
        records,
        metadata,
    }
}

/// Write `<root>/<data_type>/<data_type>_data.<ext>`
pub fn write_fixture(root: &Path, data_type: &str, format: FileFormat, content: &str) {
    let dir = root.join(data_type);
    std::fs::create_dir_all(&dir).expect("Failed to create fixture dir");
    std::fs::write(
        dir.join(format!("{}_data.{}", data_type, format.extension())),
        content,
    )
    .expect("Failed to write fixture");
}
