//! Data type to destination table mapping

use serde::{Deserialize, Serialize};

/// Configuration for one supported logical data type.
///
/// Mappings are created once from static definitions and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeMapping {
    /// Logical data type identifier ("maintenance", "sortie", ...)
    pub data_type: String,
    /// Destination table name in the warehouse
    pub table_name: String,
    /// Source path hint for mock data (uses the `mock://` scheme)
    pub source_path_hint: String,
    /// Human-readable description of the data
    pub description: String,
}

impl DataTypeMapping {
    pub fn new(
        data_type: impl Into<String>,
        table_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let data_type = data_type.into();
        Self {
            source_path_hint: format!("mock://{}", data_type),
            data_type,
            table_name: table_name.into(),
            description: description.into(),
        }
    }
}
