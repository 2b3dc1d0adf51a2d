//! Ingest command implementation

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapter::{MockDataLoader, SourceAdapter};
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, format_result, format_type_list};
use crate::config::WarehouseConfig;
use crate::models::IngestionResult;
use crate::registry;
use crate::storage::FileSystemStorageBackend;
use crate::warehouse::{CallContext, DatabricksSqlExecutor, EngineOptions, IngestionEngine};

/// Arguments for one ingestion run
pub struct IngestArgs {
    /// Logical data type (maintenance, sortie, deployment, logistics)
    pub data_type: String,
    /// Source format, JSON or CSV
    pub format: String,
    /// Overall time limit for the run
    pub timeout: Option<Duration>,
    /// Server-side wait per statement
    pub wait_timeout: Duration,
    pub output: OutputFormat,
}

/// Handle `--list-types`
pub fn handle_list_types() {
    print!("{}", format_type_list(registry::global().mappings()));
}

/// Handle an ingestion run: build the request, check the connection, ingest
/// and print the result block
pub async fn handle_ingest(
    args: &IngestArgs,
    config: &WarehouseConfig,
    cancel: CancellationToken,
) -> Result<IngestionResult, CliError> {
    config.validate()?;

    let loader = MockDataLoader::new(FileSystemStorageBackend::new(&config.data_path));
    let adapter = SourceAdapter::new(config.data_source.clone(), Arc::new(loader));

    info!(
        supported = ?adapter.supported_data_types(),
        "Supported BLADE data types"
    );
    info!(data_type = %args.data_type, format = %args.format, "Starting ingestion");

    let request = adapter
        .prepare_ingestion_request(&args.data_type, &args.format)
        .await?;

    let executor = DatabricksSqlExecutor::new(&config.host, config.token()).map_err(CliError::Connection)?;
    let engine = IngestionEngine::new(
        Arc::new(executor),
        config.target(),
        EngineOptions {
            wait_timeout: args.wait_timeout,
            ..EngineOptions::default()
        },
    );

    let mut ctx = CallContext::new().with_cancellation(cancel);
    if let Some(timeout) = args.timeout {
        ctx = ctx.with_timeout(timeout);
    }

    info!(host = %config.host, "Testing Databricks connection");
    engine.ping(&ctx).await.map_err(CliError::Connection)?;
    info!("Successfully connected to Databricks");

    match engine.ingest_with_context(request, &ctx).await {
        Ok(result) => {
            println!("{}", format_result(&result, args.output)?);
            Ok(result)
        }
        Err(failure) => {
            println!("{}", format_result(&failure.result, args.output)?);
            Err(CliError::Ingest(failure.error))
        }
    }
}
