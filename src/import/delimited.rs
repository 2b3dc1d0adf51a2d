//! CSV source normalization

use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;

use super::{ImportError, NormalizeOptions};
use crate::models::{CanonicalRecord, FileFormat};

/// Parse CSV bytes into canonical records.
///
/// The first row names the fields. Data rows are zipped against the header
/// positionally: a short row leaves trailing fields absent, cells past the
/// last header are ignored. No type coercion is applied.
pub fn normalize_csv(
    bytes: &[u8],
    options: &NormalizeOptions,
) -> Result<Vec<CanonicalRecord>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = reader.records();

    let headers: Vec<String> = match rows.next() {
        Some(row) => row
            .map_err(|e| ImportError::parse(FileFormat::Csv, e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Err(ImportError::EmptyData { format: FileFormat::Csv }),
    };

    let mut records = Vec::new();
    for row in rows {
        let row = row.map_err(|e| ImportError::parse(FileFormat::Csv, e.to_string()))?;
        records.push(row_to_record(&headers, &row, options));
    }

    if records.is_empty() {
        return Err(ImportError::EmptyData { format: FileFormat::Csv });
    }

    Ok(records)
}

fn row_to_record(headers: &[String], row: &StringRecord, options: &NormalizeOptions) -> CanonicalRecord {
    let mut record = CanonicalRecord::new();

    for (header, cell) in headers.iter().zip(row.iter()) {
        let value = if options.is_multi_value(header) {
            Value::Array(
                split_and_trim(cell, options.list_separator)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            )
        } else if cell.is_empty() {
            Value::Null
        } else {
            Value::String(cell.to_string())
        };
        record.insert(header.clone(), value);
    }

    record
}

/// Split on `separator`, trim each segment and drop the empty ones.
///
/// `"a; b ; ;c"` becomes `["a", "b", "c"]`; an empty cell becomes `[]`.
pub fn split_and_trim(cell: &str, separator: char) -> Vec<String> {
    cell.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
