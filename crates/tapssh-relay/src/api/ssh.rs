//! SSH execution endpoints

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tapssh_api::{ExecuteRequest, ExecuteResponse, LogEntry, LogsResponse};
use tapssh_exec::CommandExecutor;
use tracing::{info, instrument};

use crate::api::error::AppError;
use crate::state::AppState;

/// Query parameters for listing logs
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Maximum number of entries
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// `POST /api/ssh/execute`
///
/// Always answers 200 with a result body; SSH failures are reported in it.
#[instrument(skip(state, request), fields(button_id = %request.button_id, host = %request.ssh.host))]
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Json<ExecuteResponse> {
    Json(run_and_record(&state, request).await)
}

/// Run one request on a fresh executor and append it to the execution log
pub(crate) async fn run_and_record(state: &AppState, request: ExecuteRequest) -> ExecuteResponse {
    let start = Instant::now();
    let ExecuteRequest { ssh, button_id } = request;
    let host = ssh.host.clone();
    let command = ssh.command.clone();

    let result = state.executor().execute(ssh.into()).await;

    let execution_time = start.elapsed().as_secs_f64();
    let success = result.is_success();
    let text = result.text().to_string();
    let error = (!success).then(|| text.clone());

    info!(success, execution_time, "relay execution finished");

    state
        .record(LogEntry {
            button_id,
            host,
            command,
            success,
            output: text.clone(),
            error: error.clone(),
            execution_time,
            timestamp: Utc::now().to_rfc3339(),
        })
        .await;

    ExecuteResponse {
        success,
        output: text,
        error,
        error_category: result.category().map(|c| c.as_str().to_string()),
        execution_time,
    }
}

/// `GET /api/ssh/logs?limit=N`
pub async fn logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    if query.limit == 0 {
        return Err(AppError::bad_request("limit must be at least 1"));
    }
    Ok(Json(LogsResponse {
        logs: state.recent(query.limit).await,
    }))
}
