//! SQL execution collaborator
//!
//! The engine only talks to the warehouse through [`SqlExecutor`]. Statements
//! carry named parameters (`:name` markers) so values never have to be spliced
//! into SQL text; executors that can only run literal SQL render a statement
//! with [`Statement::to_inline_sql`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::sql::{SqlError, quote_literal};

/// A named parameter bound to a statement; `None` binds SQL `NULL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementParameter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// SQL text plus its parameter bindings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    sql: String,
    parameters: Vec<StatementParameter>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind a value to the `:name` marker
    pub fn with_parameter(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.bind(name, value);
        self
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Option<String>) {
        self.parameters.push(StatementParameter {
            name: name.into(),
            value,
        });
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[StatementParameter] {
        &self.parameters
    }

    /// Value bound to `name`; `Some(None)` when bound to `NULL`
    pub fn parameter(&self, name: &str) -> Option<Option<&str>> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_deref())
    }

    /// Render the statement as literal SQL.
    ///
    /// Markers inside string literals, backtick identifiers and `::` casts
    /// are left alone. Every bound value goes through [`quote_literal`].
    pub fn to_inline_sql(&self) -> Result<String, SqlError> {
        let chars: Vec<char> = self.sql.chars().collect();
        let mut out = String::with_capacity(self.sql.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\'' | '`' => {
                    let end = quoted_span_end(&chars, i);
                    out.extend(&chars[i..end]);
                    i = end;
                }
                ':' if chars.get(i + 1) == Some(&':') => {
                    out.push_str("::");
                    i += 2;
                }
                ':' if chars
                    .get(i + 1)
                    .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
                {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                    {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    match self.parameter(&name) {
                        Some(Some(value)) => out.push_str(&quote_literal(value)?),
                        Some(None) => out.push_str("NULL"),
                        None => return Err(SqlError::UnboundParameter(name)),
                    }
                    i = end;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        Ok(out)
    }
}

/// Index one past the closing quote of the quoted span opening at `start`
fn quoted_span_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if quote == '\'' && chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// Where and how long a statement may run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementOptions {
    pub warehouse_id: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub wait_timeout: Duration,
}

/// Server-side state of a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementState {
    /// Accepted but not finished within the wait timeout
    Pending,
    Succeeded,
    Failed(String),
}

/// What the warehouse returned for a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementResponse {
    pub statement_id: Option<String>,
    pub state: StatementState,
    pub rows: Vec<Vec<Option<String>>>,
}

impl StatementResponse {
    pub fn succeeded(rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            statement_id: None,
            state: StatementState::Succeeded,
            rows,
        }
    }

    /// First column of the first row
    pub fn scalar(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }
}

/// Failure to get a statement executed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("Statement failed: {0}")]
    StatementFailed(String),

    #[error("Statement cancelled")]
    Cancelled,

    #[error("Statement timed out after {0:?}")]
    TimedOut(Duration),
}

impl ExecutorError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ExecutorError::Unauthorized(msg) => format!(
                "Warehouse rejected the credentials: {msg}\n\nHint: Check DATABRICKS_TOKEN."
            ),
            ExecutorError::Transport(msg) => format!(
                "Could not reach the warehouse: {msg}\n\nHint: Check DATABRICKS_HOST and network connectivity."
            ),
            ExecutorError::TimedOut(after) => format!(
                "Warehouse call timed out after {after:?}.\n\nHint: Check that the SQL warehouse is running."
            ),
            _ => self.to_string(),
        }
    }
}

/// Runs SQL statements against a warehouse
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(
        &self,
        statement: &Statement,
        options: &StatementOptions,
    ) -> Result<StatementResponse, ExecutorError>;
}
