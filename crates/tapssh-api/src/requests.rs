//! Request types for the relay API

use serde::{Deserialize, Serialize};

/// Connection target and command, as carried by a command button
#[derive(Clone, Serialize, Deserialize)]
pub struct SshCommandSpec {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub command: String,
}

fn default_port() -> u16 {
    22
}

impl std::fmt::Debug for SshCommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCommandSpec")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("command", &self.command)
            .finish()
    }
}

/// Body of `POST /api/ssh/execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub ssh: SshCommandSpec,
    pub button_id: String,
}
