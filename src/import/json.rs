//! JSON source normalization

use serde_json::Value;
use tracing::warn;

use super::ImportError;
use crate::models::{CanonicalRecord, FileFormat};

/// Parse a JSON array of objects into canonical records.
///
/// Objects are kept verbatim, including key order.
pub fn normalize_json(bytes: &[u8]) -> Result<Vec<CanonicalRecord>, ImportError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| ImportError::parse(FileFormat::Json, e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ImportError::parse(
                FileFormat::Json,
                format!("expected an array of records, found {}", kind(&other)),
            ));
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(CanonicalRecord::from(map)),
            other => {
                return Err(ImportError::parse(
                    FileFormat::Json,
                    format!("record {} is {}, expected an object", index, kind(&other)),
                ));
            }
        }
    }

    if let Some(first) = records.first() {
        let expected: Vec<&str> = first.field_names().collect();
        for (index, record) in records.iter().enumerate().skip(1) {
            let mut fields: Vec<&str> = record.field_names().collect();
            let mut reference = expected.clone();
            fields.sort_unstable();
            reference.sort_unstable();
            if fields != reference {
                warn!(record = index, "JSON record field set differs from the first record");
            }
        }
    }

    Ok(records)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
