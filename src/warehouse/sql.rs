//! SQL construction for Databricks SQL
//!
//! Identifiers are always backtick-quoted. Values travel as named
//! parameters; [`quote_literal`] is the only place a value is turned into
//! SQL text.

use crate::models::CanonicalRecord;

use super::executor::Statement;
use super::schema::{
    self, FIELD_CLASSIFICATION, FIELD_ITEM_ID, FIELD_ITEM_TYPE, FIELD_TIMESTAMP,
    METADATA_SOURCE_TAG,
};

/// Invalid identifier or literal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Identifier contains a NUL character: {0:?}")]
    InvalidIdentifier(String),

    #[error("String literal contains a NUL character")]
    NulInLiteral,

    #[error("No value bound for parameter :{0}")]
    UnboundParameter(String),
}

/// Quote an identifier with backticks, doubling embedded backticks
pub fn quote_identifier(identifier: &str) -> Result<String, SqlError> {
    if identifier.is_empty() {
        return Err(SqlError::EmptyIdentifier);
    }
    if identifier.contains('\0') {
        return Err(SqlError::InvalidIdentifier(identifier.replace('\0', "\\0")));
    }
    Ok(format!("`{}`", identifier.replace('`', "``")))
}

/// Quote a string literal.
///
/// Backslashes are escaped and single quotes doubled, so the result is a
/// single literal under both backslash-escaping and standard string rules.
/// NUL cannot be represented and is rejected.
pub fn quote_literal(value: &str) -> Result<String, SqlError> {
    if value.contains('\0') {
        return Err(SqlError::NulInLiteral);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("''"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    Ok(quoted)
}

/// A validated three-part table name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    catalog: String,
    schema: String,
    table: String,
    quoted_catalog: String,
    quoted_schema: String,
    quoted_table: String,
}

impl TableRef {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, SqlError> {
        let catalog = catalog.into();
        let schema = schema.into();
        let table = table.into();

        Ok(Self {
            quoted_catalog: quote_identifier(&catalog)?,
            quoted_schema: quote_identifier(&schema)?,
            quoted_table: quote_identifier(&table)?,
            catalog,
            schema,
            table,
        })
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `` `catalog`.`schema` ``
    pub fn qualified_schema(&self) -> String {
        format!("{}.{}", self.quoted_catalog, self.quoted_schema)
    }

    /// `` `catalog`.`schema`.`table` ``
    pub fn qualified(&self) -> String {
        format!(
            "{}.{}.{}",
            self.quoted_catalog, self.quoted_schema, self.quoted_table
        )
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

pub fn create_catalog(table: &TableRef) -> Statement {
    Statement::new(format!(
        "CREATE CATALOG IF NOT EXISTS {}",
        table.quoted_catalog
    ))
}

pub fn create_schema(table: &TableRef) -> Statement {
    Statement::new(format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        table.qualified_schema()
    ))
}

pub fn create_table(table: &TableRef) -> Statement {
    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table.qualified(),
        schema::column_definitions()
    ))
}

/// One multi-row `INSERT` for all records.
///
/// Row `i` binds `:item_id_i`, `:item_type_i`, `:classification_marking_i`,
/// `:timestamp_i` and `:raw_data_i`; `:data_source`, `:batch_id` and
/// `:data_type` are shared by every row.
pub fn bulk_insert(
    table: &TableRef,
    records: &[CanonicalRecord],
    data_source: &str,
    data_type: &str,
    batch_id: &str,
) -> Statement {
    let rows: Vec<String> = (0..records.len())
        .map(|i| {
            format!(
                "(:item_id_{i}, :item_type_{i}, :classification_marking_{i}, \
                CAST(:timestamp_{i} AS TIMESTAMP), :data_source, :raw_data_{i}, current_timestamp(), \
                map('source', '{METADATA_SOURCE_TAG}', 'batch_id', :batch_id, 'data_type', :data_type))"
            )
        })
        .collect();

    let mut statement = Statement::new(format!(
        "INSERT INTO {} ({}) VALUES {}",
        table.qualified(),
        schema::column_names(),
        rows.join(", ")
    ));

    for (i, record) in records.iter().enumerate() {
        statement.bind(format!("item_id_{i}"), record.text(FIELD_ITEM_ID));
        statement.bind(format!("item_type_{i}"), record.text(FIELD_ITEM_TYPE));
        statement.bind(
            format!("classification_marking_{i}"),
            record.text(FIELD_CLASSIFICATION),
        );
        statement.bind(format!("timestamp_{i}"), record.text(FIELD_TIMESTAMP));
        statement.bind(format!("raw_data_{i}"), Some(record.to_json()));
    }

    statement.bind("data_source", Some(data_source.to_string()));
    statement.bind("batch_id", Some(batch_id.to_string()));
    statement.bind("data_type", Some(data_type.to_string()));

    statement
}

/// Rows of `table` written by one batch
pub fn count_batch_rows(table: &TableRef, batch_id: &str) -> Statement {
    Statement::new(format!(
        "SELECT COUNT(*) FROM {} WHERE metadata['batch_id'] = :batch_id",
        table.qualified()
    ))
    .with_parameter("batch_id", Some(batch_id.to_string()))
}

/// Connectivity probe
pub fn select_one() -> Statement {
    Statement::new("SELECT 1")
}
