//! Output formatting for CLI

use serde_json::Value;

use super::error::CliError;
use crate::models::{DataTypeMapping, IngestionResult};

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Boxed result block
    #[default]
    Pretty,
    /// One line per result
    Compact,
    /// The serialized result
    Json,
}

const RULE_WIDTH: usize = 50;

/// Render an ingestion result
pub fn format_result(result: &IngestionResult, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Pretty => Ok(format_pretty_output(result)),
        OutputFormat::Compact => Ok(format_compact_output(result)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).map_err(|e| CliError::Output(e.to_string()))
        }
    }
}

/// Format an ingestion result in compact mode
pub fn format_compact_output(result: &IngestionResult) -> String {
    match result.error() {
        None => format!(
            "✅ {} {} rows={} ({}) duration={}",
            result.table_name(),
            result.status(),
            result.rows_ingested(),
            result.row_count_source().as_str(),
            result.duration_string()
        ),
        Some(error) => format!(
            "❌ {} {} duration={} error={}",
            result.table_name(),
            result.status(),
            result.duration_string(),
            error
        ),
    }
}

/// Format an ingestion result in pretty mode
pub fn format_pretty_output(result: &IngestionResult) -> String {
    let mut output = String::new();
    let metadata = result.metadata();

    output.push_str(&format!("\n{}\n", "=".repeat(RULE_WIDTH)));
    output.push_str("BLADE INGESTION RESULTS\n");
    output.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH)));
    output.push_str(&format!("Table: {}\n", result.table_name()));
    output.push_str(&format!("Status: {}\n", result.status()));
    output.push_str(&format!(
        "Rows Ingested: {} ({})\n",
        result.rows_ingested(),
        result.row_count_source().as_str()
    ));
    output.push_str(&format!("Duration: {}\n", result.duration_string()));

    if let Some(batch_id) = metadata.get("batch_id").and_then(Value::as_str) {
        output.push_str(&format!("Batch: {}\n", batch_id));
    }

    let original_format = metadata
        .get("request_metadata")
        .and_then(|m| m.get("original_format"))
        .and_then(Value::as_str);
    if let Some(source_path) = metadata.get("source_path").and_then(Value::as_str) {
        match original_format {
            Some(format) => output.push_str(&format!("Source: {} ({})\n", source_path, format)),
            None => output.push_str(&format!("Source: {}\n", source_path)),
        }
    }

    if let Some(error) = result.error() {
        output.push_str(&format!("Error: {}\n", error));
    }

    output.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
    output
}

/// Format the supported data types
pub fn format_type_list<'a>(mappings: impl IntoIterator<Item = &'a DataTypeMapping>) -> String {
    let mut output = String::from("Supported BLADE data types:\n");
    for mapping in mappings {
        output.push_str(&format!(
            "  {:<12} -> {:<26} {}\n",
            mapping.data_type, mapping.table_name, mapping.description
        ));
    }
    output
}
