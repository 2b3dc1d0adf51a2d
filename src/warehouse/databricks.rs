//! Databricks SQL Statement Execution API executor
//!
//! Submits statements to `POST /api/2.0/sql/statements` with named
//! parameters and an inline `JSON_ARRAY` result.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::executor::{
    ExecutorError, SqlExecutor, Statement, StatementOptions, StatementParameter, StatementResponse,
    StatementState,
};

/// Smallest non-zero wait the API accepts
const MIN_WAIT_SECS: u64 = 5;
/// Largest wait the API accepts
const MAX_WAIT_SECS: u64 = 50;

/// Executes statements on a Databricks SQL warehouse
#[derive(Clone)]
pub struct DatabricksSqlExecutor {
    host: String,
    token: String,
    client: reqwest::Client,
}

impl DatabricksSqlExecutor {
    /// Create an executor for a workspace.
    ///
    /// `host` may omit the scheme, in which case `https://` is assumed. The
    /// token is never logged.
    pub fn new(host: impl AsRef<str>, token: impl Into<String>) -> Result<Self, ExecutorError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ExecutorError::Unauthorized(
                "Authentication token is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        Ok(Self {
            host: normalize_host(host.as_ref()),
            token,
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Statements endpoint URL
    pub fn statements_endpoint(&self) -> String {
        format!("{}/api/2.0/sql/statements", self.host)
    }
}

// Keep the token out of logs and panics
impl std::fmt::Debug for DatabricksSqlExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksSqlExecutor")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Display for DatabricksSqlExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.host)
    }
}

#[async_trait]
impl SqlExecutor for DatabricksSqlExecutor {
    async fn execute(
        &self,
        statement: &Statement,
        options: &StatementOptions,
    ) -> Result<StatementResponse, ExecutorError> {
        let body = ExecuteStatementRequest {
            statement: statement.sql(),
            warehouse_id: &options.warehouse_id,
            catalog: options.catalog.as_deref(),
            schema: options.schema.as_deref(),
            wait_timeout: api_wait_timeout(options.wait_timeout),
            on_wait_timeout: "CONTINUE",
            disposition: "INLINE",
            format: "JSON_ARRAY",
            parameters: statement.parameters(),
        };

        debug!(
            warehouse_id = %options.warehouse_id,
            parameters = statement.parameters().len(),
            "Submitting statement"
        );

        let response = self
            .client
            .post(self.statements_endpoint())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutorError::Unauthorized(format!("HTTP {}: {}", status, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutorError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ExecuteStatementResponse = response
            .json()
            .await
            .map_err(|e| ExecutorError::Transport(format!("Failed to parse response: {}", e)))?;

        let response = parsed.into_response();
        debug!(
            statement_id = response.statement_id.as_deref().unwrap_or_default(),
            state = ?response.state,
            "Statement returned"
        );
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct ExecuteStatementRequest<'a> {
    statement: &'a str,
    warehouse_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    wait_timeout: String,
    on_wait_timeout: &'static str,
    disposition: &'static str,
    format: &'static str,
    #[serde(skip_serializing_if = "no_parameters")]
    parameters: &'a [StatementParameter],
}

#[derive(Debug, Deserialize)]
struct ExecuteStatementResponse {
    statement_id: Option<String>,
    status: Option<ApiStatus>,
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    state: String,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    data_array: Option<Vec<Vec<Option<String>>>>,
}

impl ExecuteStatementResponse {
    fn into_response(self) -> StatementResponse {
        let state = match self.status {
            Some(status) => map_state(&status.state, status.error.as_ref()),
            None => StatementState::Failed("Response carried no status".to_string()),
        };

        StatementResponse {
            statement_id: self.statement_id,
            state,
            rows: self
                .result
                .and_then(|r| r.data_array)
                .unwrap_or_default(),
        }
    }
}

fn map_state(state: &str, error: Option<&ApiError>) -> StatementState {
    match state {
        "SUCCEEDED" => StatementState::Succeeded,
        "PENDING" | "RUNNING" => StatementState::Pending,
        other => {
            let message = match error {
                Some(ApiError {
                    error_code: Some(code),
                    message: Some(message),
                }) => format!("{}: {}", code, message),
                Some(ApiError {
                    message: Some(message),
                    ..
                }) => message.clone(),
                _ => format!("Statement ended in state {}", other),
            };
            StatementState::Failed(message)
        }
    }
}

fn no_parameters(parameters: &&[StatementParameter]) -> bool {
    parameters.is_empty()
}

/// Render a wait timeout in the API's `<n>s` form, clamped to its range
fn api_wait_timeout(wait: Duration) -> String {
    let secs = wait.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    format!("{}s", secs.clamp(MIN_WAIT_SECS, MAX_WAIT_SECS))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
