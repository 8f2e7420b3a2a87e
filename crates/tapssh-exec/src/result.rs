//! Request and result types for command execution

use serde::{Deserialize, Serialize};
use tapssh_api::SshCommandSpec;

use crate::classify::{Classification, ErrorCategory};

/// Where to connect and as whom
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshTarget {
    /// Hostname or IP address
    pub host: String,
    /// Port (default 22)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user
    pub username: String,
    /// Login password
    pub password: String,
}

fn default_port() -> u16 {
    22
}

impl std::fmt::Debug for SshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SshTarget {
    /// Create a target on the default port
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// One command to run on one target
///
/// A retry builds a fresh request with the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub target: SshTarget,
    pub command: String,
}

impl CommandRequest {
    pub fn new(target: SshTarget, command: impl Into<String>) -> Self {
        Self {
            target,
            command: command.into(),
        }
    }
}

/// Flat command descriptor: `{host, port, username, password, command}`
#[derive(Clone, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub command: String,
}

impl From<CommandDescriptor> for CommandRequest {
    fn from(d: CommandDescriptor) -> Self {
        CommandRequest {
            target: SshTarget {
                host: d.host,
                port: d.port,
                username: d.username,
                password: d.password,
            },
            command: d.command,
        }
    }
}

impl From<SshCommandSpec> for CommandRequest {
    fn from(spec: SshCommandSpec) -> Self {
        CommandRequest {
            target: SshTarget {
                host: spec.host,
                port: spec.port,
                username: spec.username,
                password: spec.password,
            },
            command: spec.command,
        }
    }
}

impl From<&CommandRequest> for SshCommandSpec {
    fn from(request: &CommandRequest) -> Self {
        SshCommandSpec {
            host: request.target.host.clone(),
            port: request.target.port,
            username: request.target.username.clone(),
            password: request.target.password.clone(),
            command: request.command.clone(),
        }
    }
}

/// Outcome of a single execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Command ran; `output` is never empty
    Success { output: String },
    /// Command did not run to completion
    Failure {
        category: ErrorCategory,
        message: String,
    },
}

impl ExecutionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Category of a failure, `None` on success
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::Failure { category, .. } => Some(*category),
        }
    }

    /// Text the user should see: output on success, message on failure
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            ExecutionResult::Success { output } => output,
            ExecutionResult::Failure { message, .. } => message,
        }
    }

    /// Convert to the `{success, output?, error?}` output shape
    #[must_use]
    pub fn to_outcome(&self) -> CommandOutcome {
        match self {
            ExecutionResult::Success { output } => CommandOutcome {
                success: true,
                output: Some(output.clone()),
                error: None,
            },
            ExecutionResult::Failure { message, .. } => CommandOutcome {
                success: false,
                output: None,
                error: Some(message.clone()),
            },
        }
    }
}

impl From<Classification> for ExecutionResult {
    fn from(c: Classification) -> Self {
        ExecutionResult::Failure {
            category: c.category,
            message: c.message,
        }
    }
}

/// Output contract handed to display and persistence layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw result of running a command on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutput {
    /// Exit status reported by the remote shell
    pub exit_status: u32,
    /// stdout and stderr in arrival order
    pub merged: String,
}

impl RemoteOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_has_exactly_one_field() {
        let ok = ExecutionResult::Success {
            output: "hello\n".to_string(),
        }
        .to_outcome();
        assert!(ok.success);
        assert_eq!(ok.output.as_deref(), Some("hello\n"));
        assert!(ok.error.is_none());

        let failed = ExecutionResult::Failure {
            category: ErrorCategory::Timeout,
            message: "timed out".to_string(),
        }
        .to_outcome();
        assert!(!failed.success);
        assert!(failed.output.is_none());
        assert_eq!(failed.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_outcome_json_omits_missing_field() {
        let outcome = ExecutionResult::Success {
            output: "ok".to_string(),
        }
        .to_outcome();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "output": "ok"}));
    }

    #[test]
    fn test_descriptor_into_request() {
        let json = r#"{"host": "192.168.1.50", "username": "pi", "password": "pw", "command": "echo hello"}"#;
        let descriptor: CommandDescriptor = serde_json::from_str(json).unwrap();
        let request = CommandRequest::from(descriptor);

        assert_eq!(request.target.port, 22);
        assert_eq!(request.target.host, "192.168.1.50");
        assert_eq!(request.command, "echo hello");
    }

    #[test]
    fn test_target_debug_hides_password() {
        let target = SshTarget::new("10.0.0.2", "pi", "hunter2").with_port(2222);
        let rendered = format!("{target:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("2222"));
    }
}
