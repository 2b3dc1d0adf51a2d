//! Integration tests for the ingestion engine
//!
//! Runs the provisioning → insert → verify sequence against an in-memory
//! executor.

mod common;

use std::sync::Arc;
use std::time::Duration;

use blade_ingest::models::request::META_MODE;
use blade_ingest::warehouse::{
    CallContext, EngineOptions, ExecutorError, IngestError, IngestionEngine, ProvisioningStage,
    StatementState, WarehouseTarget,
};
use blade_ingest::{CanonicalRecord, IngestionStatus, RowCountSource};
use common::{RecordingExecutor, Reply, maintenance_record, mock_request};
use tokio_util::sync::CancellationToken;

const TABLE: &str = "blade_maintenance_data";

fn engine_with(executor: &Arc<RecordingExecutor>) -> IngestionEngine {
    IngestionEngine::new(
        executor.clone(),
        WarehouseTarget::new("wh-123", "blade_poc", "logistics"),
        EngineOptions::default(),
    )
}

#[tokio::test]
async fn test_successful_ingestion_runs_all_phases_in_order() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let request = mock_request(TABLE, vec![maintenance_record("M1"), maintenance_record("M2")]);
    let result = engine.ingest(request).await.expect("Ingestion should succeed");

    assert_eq!(result.status(), IngestionStatus::Completed);
    assert_eq!(result.rows_ingested(), 2);
    assert_eq!(result.row_count_source(), RowCountSource::Verified);
    assert!(result.error().is_none());

    let log = executor.sql_log();
    assert_eq!(log.len(), 5);
    assert!(log[0].starts_with("CREATE CATALOG IF NOT EXISTS `blade_poc`"));
    assert!(log[1].starts_with("CREATE SCHEMA IF NOT EXISTS `blade_poc`.`logistics`"));
    assert!(log[2].starts_with(
        "CREATE TABLE IF NOT EXISTS `blade_poc`.`logistics`.`blade_maintenance_data`"
    ));
    assert!(log[3].starts_with("INSERT INTO `blade_poc`.`logistics`.`blade_maintenance_data`"));
    assert!(log[4].starts_with("SELECT COUNT(*)"));

    let metadata = result.metadata();
    assert_eq!(metadata["source_path"], "mock://maintenance");
    assert_eq!(metadata["file_format"], "JSON");
    assert_eq!(metadata["data_source"], "BLADE_LOGISTICS");
    assert_eq!(metadata["ingestion_type"], "mock_data_insert");
    assert_eq!(metadata["row_count_source"], "verified");
    assert_eq!(metadata["request_metadata"]["original_format"], "CSV");
    assert!(metadata["batch_id"].as_str().is_some());
    assert!(metadata.get("failed_stage").is_none());
}

#[tokio::test]
async fn test_insert_uses_one_batch_id_and_scoped_options() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let record = maintenance_record("M1").with("notes", "O'Brien said \\ ok");
    let result = engine
        .ingest(mock_request(TABLE, vec![record]))
        .await
        .expect("Ingestion should succeed");

    let statements = executor.statements();
    let insert = &statements[3];
    let count = &statements[4];

    let batch_id = result.metadata()["batch_id"].as_str().expect("batch id");
    assert_eq!(insert.parameter("batch_id"), Some(Some(batch_id)));
    assert_eq!(count.parameter("batch_id"), Some(Some(batch_id)));
    assert_eq!(insert.parameter("data_type"), Some(Some("maintenance")));
    assert_eq!(insert.parameter("data_source"), Some(Some("BLADE_LOGISTICS")));
    assert_eq!(insert.parameter("item_id_0"), Some(Some("M1")));
    assert!(insert.sql().contains("map('source', 'mock_blade', 'batch_id', :batch_id"));

    let inline = insert.to_inline_sql().expect("Insert renders as literal SQL");
    assert!(inline.contains(r#""notes":"O''Brien said \\\\ ok""#));

    let options = executor.options();
    assert_eq!(options[0].catalog, None);
    assert_eq!(options[3].catalog.as_deref(), Some("blade_poc"));
    assert_eq!(options[3].schema.as_deref(), Some("logistics"));
    assert_eq!(options[3].wait_timeout, Duration::from_secs(30));
    assert!(options.iter().all(|o| o.warehouse_id == "wh-123"));
}

#[tokio::test]
async fn test_provisioning_failure_never_inserts() {
    let executor = Arc::new(
        RecordingExecutor::new()
            .fail_on("CREATE SCHEMA", ExecutorError::Unauthorized("HTTP 403".to_string())),
    );
    let engine = engine_with(&executor);

    let failure = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect_err("Provisioning failure must fail the call");

    assert!(matches!(
        failure.error,
        IngestError::Provisioning {
            stage: ProvisioningStage::Schema,
            source: ExecutorError::Unauthorized(_)
        }
    ));
    assert_eq!(failure.result.status(), IngestionStatus::Failed);
    assert_eq!(failure.result.rows_ingested(), 0);
    assert!(failure.result.error().is_some_and(|e| e.contains("schema")));
    assert_eq!(failure.result.metadata()["failed_stage"], "schema");

    assert_eq!(executor.count_starting_with("INSERT"), 0);
    assert_eq!(executor.count_starting_with("CREATE TABLE"), 0);
    assert_eq!(executor.sql_log().len(), 2);
}

#[tokio::test]
async fn test_failed_statement_state_fails_provisioning() {
    let executor = Arc::new(RecordingExecutor::new().reply(
        "CREATE TABLE",
        Reply::State(StatementState::Failed("PARSE_SYNTAX_ERROR".to_string())),
    ));
    let engine = engine_with(&executor);

    let failure = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect_err("Failed statement state must fail the call");

    assert!(matches!(
        failure.error,
        IngestError::Provisioning {
            stage: ProvisioningStage::Table,
            source: ExecutorError::StatementFailed(ref m)
        } if m == "PARSE_SYNTAX_ERROR"
    ));
    assert_eq!(executor.count_starting_with("INSERT"), 0);
}

#[tokio::test]
async fn test_insert_failure_reports_batch() {
    let executor = Arc::new(
        RecordingExecutor::new().fail_on("INSERT", ExecutorError::Rejected("HTTP 400".to_string())),
    );
    let engine = engine_with(&executor);

    let failure = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect_err("Insert failure must fail the call");

    let IngestError::Insert { batch_id, .. } = &failure.error else {
        panic!("Expected insert error, got {:?}", failure.error);
    };
    assert_eq!(failure.result.metadata()["batch_id"], batch_id.as_str());
    assert_eq!(failure.result.metadata()["failed_stage"], "insert");
    assert_eq!(failure.result.rows_ingested(), 0);
    assert_eq!(executor.count_starting_with("SELECT COUNT(*)"), 0);
}

#[tokio::test]
async fn test_verification_failure_falls_back_to_submitted() {
    let executor = Arc::new(
        RecordingExecutor::new()
            .fail_on("SELECT COUNT(*)", ExecutorError::Transport("connection reset".to_string())),
    );
    let engine = engine_with(&executor);

    let records = vec![
        maintenance_record("M1"),
        maintenance_record("M2"),
        maintenance_record("M3"),
    ];
    let result = engine
        .ingest(mock_request(TABLE, records))
        .await
        .expect("Verification failure must not fail the call");

    assert_eq!(result.status(), IngestionStatus::Completed);
    assert_eq!(result.rows_ingested(), 3);
    assert_eq!(result.row_count_source(), RowCountSource::Submitted);
    assert!(result.error().is_none());
    assert_eq!(result.metadata()["row_count_source"], "submitted");
}

#[tokio::test]
async fn test_unparseable_count_falls_back_to_submitted() {
    let executor = Arc::new(
        RecordingExecutor::new().reply("SELECT COUNT(*)", Reply::Value(Some("many".to_string()))),
    );
    let engine = engine_with(&executor);

    let result = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect("Ingestion should succeed");

    assert_eq!(result.rows_ingested(), 1);
    assert_eq!(result.row_count_source(), RowCountSource::Submitted);
}

#[tokio::test]
async fn test_verified_count_is_reported_as_is() {
    let executor = Arc::new(
        RecordingExecutor::new().reply("SELECT COUNT(*)", Reply::Value(Some("5".to_string()))),
    );
    let engine = engine_with(&executor);

    let result = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect("Ingestion should succeed");

    assert_eq!(result.rows_ingested(), 5);
    assert_eq!(result.row_count_source(), RowCountSource::Verified);
}

#[tokio::test]
async fn test_pending_insert_reports_submitted_without_counting() {
    let executor = Arc::new(
        RecordingExecutor::new().reply("INSERT", Reply::State(StatementState::Pending)),
    );
    let engine = engine_with(&executor);

    let result = engine
        .ingest(mock_request(
            TABLE,
            vec![
                maintenance_record("M1"),
                maintenance_record("M2"),
                maintenance_record("M3"),
            ],
        ))
        .await
        .expect("Pending insert is accepted");

    assert_eq!(result.status(), IngestionStatus::Completed);
    assert_eq!(result.rows_ingested(), 3);
    assert_eq!(result.row_count_source(), RowCountSource::Submitted);
    assert_eq!(result.metadata()["insert_state"], "pending");
    assert_eq!(result.metadata()["row_count_source"], "submitted");
    assert!(result.metadata()["batch_id"].as_str().is_some());
    assert_eq!(executor.count_starting_with("SELECT COUNT(*)"), 0);
}

#[tokio::test]
async fn test_finished_insert_has_no_insert_state() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let result = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect("Ingestion should succeed");

    assert!(result.metadata().get("insert_state").is_none());
    assert_eq!(executor.count_starting_with("SELECT COUNT(*)"), 1);
}

#[tokio::test]
async fn test_provision_is_idempotent() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);
    let ctx = CallContext::new();

    let first = engine.provision(TABLE, &ctx).await.expect("First provision");
    let second = engine.provision(TABLE, &ctx).await.expect("Second provision");

    assert_eq!(first, second);
    assert_eq!(first.to_string(), "blade_poc.logistics.blade_maintenance_data");
    assert_eq!(executor.sql_log().len(), 6);
    assert!(executor.sql_log().iter().all(|sql| sql.contains("IF NOT EXISTS")));
}

#[tokio::test]
async fn test_invalid_destination_runs_no_sql() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let failure = engine
        .ingest(mock_request("", vec![maintenance_record("M1")]))
        .await
        .expect_err("Empty table name is invalid");

    assert!(matches!(failure.error, IngestError::InvalidDestination(_)));
    assert_eq!(failure.result.metadata()["failed_stage"], "destination");
    assert!(executor.sql_log().is_empty());
}

#[tokio::test]
async fn test_non_mock_mode_is_rejected_without_sql() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let mut request = mock_request(TABLE, vec![maintenance_record("M1")]);
    request.metadata.insert(META_MODE.to_string(), "live".to_string());

    let failure = engine.ingest(request).await.expect_err("Live mode is unsupported");

    assert!(matches!(failure.error, IngestError::UnsupportedMode(ref m) if m == "live"));
    assert_eq!(failure.result.rows_ingested(), 0);
    assert!(executor.sql_log().is_empty());

    let mut request = mock_request(TABLE, vec![maintenance_record("M1")]);
    request.metadata.remove(META_MODE);
    let failure = engine.ingest(request).await.expect_err("Missing mode is unsupported");
    assert!(matches!(failure.error, IngestError::UnsupportedMode(_)));
}

#[tokio::test]
async fn test_zero_records_provisions_but_skips_insert() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let result = engine
        .ingest(mock_request(TABLE, Vec::new()))
        .await
        .expect("Empty request completes");

    assert_eq!(result.status(), IngestionStatus::Completed);
    assert_eq!(result.rows_ingested(), 0);
    assert_eq!(result.row_count_source(), RowCountSource::Submitted);
    assert!(result.metadata().get("batch_id").is_none());
    assert_eq!(executor.sql_log().len(), 3);
    assert_eq!(executor.count_starting_with("INSERT"), 0);
}

#[tokio::test]
async fn test_cancelled_context_fails_before_provisioning() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let token = CancellationToken::new();
    token.cancel();
    let ctx = CallContext::new().with_cancellation(token);

    let failure = engine
        .ingest_with_context(mock_request(TABLE, vec![maintenance_record("M1")]), &ctx)
        .await
        .expect_err("Cancelled call must fail");

    assert!(matches!(
        failure.error,
        IngestError::Provisioning {
            stage: ProvisioningStage::Catalog,
            source: ExecutorError::Cancelled
        }
    ));
    assert_eq!(failure.result.status(), IngestionStatus::Failed);
    assert_eq!(executor.count_starting_with("INSERT"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_in_flight_call() {
    let executor = Arc::new(RecordingExecutor::new().with_delay(Duration::from_secs(20)));
    let engine = engine_with(&executor);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let ctx = CallContext::new().with_cancellation(token);
    let failure = engine
        .ingest_with_context(mock_request(TABLE, vec![maintenance_record("M1")]), &ctx)
        .await
        .expect_err("Cancelled call must fail");

    assert!(matches!(
        failure.error,
        IngestError::Provisioning {
            source: ExecutorError::Cancelled,
            ..
        }
    ));
    assert_eq!(executor.sql_log().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_local_bound_times_out_slow_calls() {
    let executor = Arc::new(RecordingExecutor::new().with_delay(Duration::from_secs(60)));
    let engine = IngestionEngine::new(
        executor.clone(),
        WarehouseTarget::new("wh-123", "blade_poc", "logistics"),
        EngineOptions {
            wait_timeout: Duration::from_secs(1),
            call_grace: Duration::from_secs(1),
        },
    );

    let failure = engine
        .ingest(mock_request(TABLE, vec![maintenance_record("M1")]))
        .await
        .expect_err("Slow call must time out");

    assert!(matches!(
        failure.error,
        IngestError::Provisioning {
            stage: ProvisioningStage::Catalog,
            source: ExecutorError::TimedOut(d)
        } if d == Duration::from_secs(2)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_caller_deadline_shorter_than_local_bound_governs() {
    let executor = Arc::new(RecordingExecutor::new().with_delay(Duration::from_secs(10)));
    let engine = engine_with(&executor);

    let ctx = CallContext::new().with_timeout(Duration::from_millis(500));
    let failure = engine
        .ingest_with_context(mock_request(TABLE, vec![maintenance_record("M1")]), &ctx)
        .await
        .expect_err("Caller deadline must fail the call");

    match failure.error {
        IngestError::Provisioning {
            source: ExecutorError::TimedOut(d),
            ..
        } => assert!(d <= Duration::from_millis(500)),
        other => panic!("Expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_ingestions_share_engine() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = Arc::new(engine_with(&executor));

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .ingest(mock_request("blade_sortie_schedules", vec![maintenance_record("S1")]))
                .await
        })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .ingest(mock_request(
                    "blade_deployment_plans",
                    vec![maintenance_record("D1"), maintenance_record("D2")],
                ))
                .await
        })
    };

    let a = a.await.expect("Task a").expect("Ingestion a");
    let b = b.await.expect("Task b").expect("Ingestion b");

    assert_eq!(a.rows_ingested(), 1);
    assert_eq!(b.rows_ingested(), 2);
    assert_ne!(a.metadata()["batch_id"], b.metadata()["batch_id"]);
    assert_eq!(executor.count_starting_with("INSERT"), 2);
}

#[tokio::test]
async fn test_ping_runs_select_one() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    engine.ping(&CallContext::new()).await.expect("Ping succeeds");
    assert_eq!(executor.sql_log(), vec!["SELECT 1".to_string()]);

    let executor = Arc::new(
        RecordingExecutor::new().fail_on("SELECT 1", ExecutorError::Unauthorized("401".to_string())),
    );
    let engine = engine_with(&executor);
    assert!(matches!(
        engine.ping(&CallContext::new()).await,
        Err(ExecutorError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_records_missing_well_known_fields_bind_null() {
    let executor = Arc::new(RecordingExecutor::new());
    let engine = engine_with(&executor);

    let record = CanonicalRecord::new().with("tail_number", "AF-1001");
    engine
        .ingest(mock_request(TABLE, vec![record]))
        .await
        .expect("Ingestion should succeed");

    let insert = &executor.statements()[3];
    assert_eq!(insert.parameter("item_id_0"), Some(None));
    assert_eq!(insert.parameter("timestamp_0"), Some(None));
    assert_eq!(
        insert.parameter("raw_data_0"),
        Some(Some(r#"{"tail_number":"AF-1001"}"#))
    );
}
