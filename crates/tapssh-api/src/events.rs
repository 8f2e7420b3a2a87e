//! WebSocket message types for `/api/ws/{client_id}`

use serde::{Deserialize, Serialize};

use crate::requests::SshCommandSpec;

/// Message sent by a WebSocket client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsRequest {
    ExecuteSsh {
        ssh: SshCommandSpec,
        #[serde(default = "default_button_id")]
        button_id: String,
    },
}

fn default_button_id() -> String {
    "unknown".to_string()
}

/// Message sent by the relay for each execution: one `Status`, then
/// `Output` or `Error`, then `Complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    Status {
        status: String,
        message: String,
    },
    Output {
        data: String,
        success: bool,
    },
    Error {
        data: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_category: Option<String>,
    },
    Complete {
        success: bool,
    },
}
