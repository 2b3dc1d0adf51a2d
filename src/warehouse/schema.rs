//! Destination table definition

/// Record field holding the item identifier
pub const FIELD_ITEM_ID: &str = "item_id";
/// Record field holding the item type
pub const FIELD_ITEM_TYPE: &str = "item_type";
/// Record field holding the classification marking
pub const FIELD_CLASSIFICATION: &str = "classification_marking";
/// Record field holding the event timestamp
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// `source` tag written into every row's metadata map
pub const METADATA_SOURCE_TAG: &str = "mock_blade";

/// A column of the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationColumn {
    pub name: &'static str,
    pub sql_type: &'static str,
}

const fn column(name: &'static str, sql_type: &'static str) -> DestinationColumn {
    DestinationColumn { name, sql_type }
}

/// Columns of every destination table, in insert order
pub const DESTINATION_COLUMNS: [DestinationColumn; 8] = [
    column("item_id", "STRING"),
    column("item_type", "STRING"),
    column("classification_marking", "STRING"),
    column("timestamp", "TIMESTAMP"),
    column("data_source", "STRING"),
    column("raw_data", "STRING"),
    column("ingestion_timestamp", "TIMESTAMP"),
    column("metadata", "MAP<STRING, STRING>"),
];

/// Column list for `CREATE TABLE`, e.g. `` `item_id` STRING, ... ``
pub fn column_definitions() -> String {
    DESTINATION_COLUMNS
        .iter()
        .map(|c| format!("`{}` {}", c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Column list for `INSERT INTO ... (...)`
pub fn column_names() -> String {
    DESTINATION_COLUMNS
        .iter()
        .map(|c| format!("`{}`", c.name))
        .collect::<Vec<_>>()
        .join(", ")
}
