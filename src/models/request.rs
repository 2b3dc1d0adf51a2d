//! Ingestion request value object

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::CanonicalRecord;

/// Metadata key naming the system the records came from
pub const META_SOURCE_SYSTEM: &str = "source_system";
/// Metadata key carrying the logical data type
pub const META_DATA_TYPE: &str = "data_type";
/// Metadata key carrying the integration tag
pub const META_INTEGRATION: &str = "integration";
/// Metadata key carrying the data type description
pub const META_DESCRIPTION: &str = "description";
/// Metadata key carrying the [`IngestionMode`]
pub const META_MODE: &str = "mode";
/// Metadata key carrying the format the source file was read in
pub const META_ORIGINAL_FORMAT: &str = "original_format";

/// Source file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    #[default]
    Json,
    Csv,
}

impl FileFormat {
    /// Canonical uppercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "JSON",
            FileFormat::Csv => "CSV",
        }
    }

    /// File extension used for source files of this format
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "JSON" => Ok(FileFormat::Json),
            "CSV" => Ok(FileFormat::Csv),
            _ => Err(format!("Unsupported format: {}. Use JSON or CSV", s)),
        }
    }
}

/// How the records of a request were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionMode {
    /// Pre-loaded sample records inserted in one batch
    MockData,
    /// Records read from a live external feed
    Live,
}

impl IngestionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionMode::MockData => "mock_data",
            IngestionMode::Live => "live",
        }
    }
}

impl std::fmt::Display for IngestionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IngestionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock_data" => Ok(IngestionMode::MockData),
            "live" => Ok(IngestionMode::Live),
            _ => Err(format!("Invalid ingestion mode: {}", s)),
        }
    }
}

/// Everything the ingestion engine needs for one call.
///
/// `file_format` is the wire format records travel in and is always JSON;
/// the format the source was read in is kept in the `original_format`
/// metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    pub table_name: String,
    pub source_path: String,
    pub file_format: FileFormat,
    pub format_options: String,
    pub data_source: String,
    pub records: Vec<CanonicalRecord>,
    pub metadata: BTreeMap<String, String>,
}

impl IngestionRequest {
    /// Ingestion mode recorded in metadata, if any
    pub fn mode(&self) -> Option<IngestionMode> {
        self.metadata.get(META_MODE).and_then(|m| m.parse().ok())
    }

    /// Logical data type recorded in metadata
    pub fn data_type(&self) -> Option<&str> {
        self.metadata.get(META_DATA_TYPE).map(String::as_str)
    }

    /// Format the source file was read in
    pub fn original_format(&self) -> Option<FileFormat> {
        self.metadata
            .get(META_ORIGINAL_FORMAT)
            .and_then(|f| f.parse().ok())
    }
}
