//! blade-ingest - load BLADE mock data into Databricks SQL tables

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use blade_ingest::cli::commands::{IngestArgs, handle_ingest, handle_list_types};
use blade_ingest::cli::{CliError, OutputFormat};
use blade_ingest::config::WarehouseConfig;

#[derive(Parser, Debug)]
#[command(name = "blade-ingest")]
#[command(about = "Ingest BLADE mock data into Databricks SQL warehouse tables")]
#[command(version)]
#[command(after_help = "Examples:\n  \
    blade-ingest                  Ingest maintenance data in JSON format\n  \
    blade-ingest sortie           Ingest sortie data in JSON format\n  \
    blade-ingest logistics CSV    Ingest logistics data in CSV format")]
struct Cli {
    /// Data type: maintenance, sortie, deployment or logistics
    #[arg(default_value = "maintenance")]
    data_type: String,

    /// Source format: JSON or CSV
    #[arg(default_value = "JSON")]
    format: String,

    /// List supported data types and exit
    #[arg(long)]
    list_types: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    output: OutputFormat,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Server-side wait per statement, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    wait_timeout: u64,

    /// TOML config file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding <type>/<type>_data.{json,csv}
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    init_logging(cli.verbose);

    if cli.list_types {
        handle_list_types();
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => WarehouseConfig::from_toml_file(path)?
            .with_overrides(|key| std::env::var(key).ok()),
        None => WarehouseConfig::from_env(),
    };
    if let Some(data_path) = cli.data_path {
        config.data_path = data_path;
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let args = IngestArgs {
        data_type: cli.data_type,
        format: cli.format,
        timeout: cli.timeout.map(Duration::from_secs),
        wait_timeout: Duration::from_secs(cli.wait_timeout),
        output: cli.output,
    };

    handle_ingest(&args, &config, cancel).await.map(|_| ())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "blade_ingest=debug"
    } else {
        "blade_ingest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
