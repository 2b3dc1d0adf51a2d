//! Source format normalization
//!
//! Converts raw file bytes into canonical records:
//! - JSON: an array of objects, each object passed through verbatim
//! - CSV: header row plus data rows, with designated multi-value fields
//!   split into lists of strings

pub mod delimited;
pub mod json;

use std::collections::BTreeSet;

use crate::models::{CanonicalRecord, FileFormat};

/// Fields holding delimiter-joined lists in CSV sources
pub const DEFAULT_MULTI_VALUE_FIELDS: [&str; 2] = ["parts_required", "compliance_refs"];

/// Separator used inside multi-value CSV cells
pub const DEFAULT_LIST_SEPARATOR: char = ';';

/// Error during normalization
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Parse error in {format} source: {reason}")]
    Parse { format: FileFormat, reason: String },
    #[error("{format} source has a header but no data rows")]
    EmptyData { format: FileFormat },
}

impl ImportError {
    pub(crate) fn parse(format: FileFormat, reason: impl Into<String>) -> Self {
        ImportError::Parse {
            format,
            reason: reason.into(),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ImportError::Parse { format, reason } => format!(
                "Could not parse {format} source: {reason}\n\nHint: JSON sources must be an array of objects; CSV sources need a header row."
            ),
            ImportError::EmptyData { format } => format!(
                "{format} source contains no data rows.\n\nHint: Add at least one record below the header."
            ),
        }
    }
}

/// Options controlling how sources are normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// CSV headers whose cells are split into lists
    pub multi_value_fields: BTreeSet<String>,
    /// Separator for multi-value cells
    pub list_separator: char,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            multi_value_fields: DEFAULT_MULTI_VALUE_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            list_separator: DEFAULT_LIST_SEPARATOR,
        }
    }
}

impl NormalizeOptions {
    /// Replace the multi-value field set
    pub fn with_multi_value_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multi_value_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the multi-value separator
    pub fn with_list_separator(mut self, separator: char) -> Self {
        self.list_separator = separator;
        self
    }

    pub fn is_multi_value(&self, field: &str) -> bool {
        self.multi_value_fields.contains(field)
    }
}

/// Normalize raw source bytes into canonical records
pub fn normalize(
    bytes: &[u8],
    format: FileFormat,
    options: &NormalizeOptions,
) -> Result<Vec<CanonicalRecord>, ImportError> {
    match format {
        FileFormat::Json => json::normalize_json(bytes),
        FileFormat::Csv => delimited::normalize_csv(bytes, options),
    }
}
