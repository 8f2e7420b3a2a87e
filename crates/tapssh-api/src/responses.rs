//! Response types for the relay API

use serde::{Deserialize, Serialize};

/// Body of `GET /api/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Body returned by `POST /api/ssh/execute`
///
/// On failure `output` repeats the error text so older clients that only read
/// `output` still show something useful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Snake-case error category name, present only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,
    /// Seconds spent serving the request
    pub execution_time: f64,
}

/// A single recorded execution on the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub button_id: String,
    pub host: String,
    pub command: String,
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time: f64,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Body of `GET /api/ssh/logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}
