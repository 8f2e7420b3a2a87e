//! Error types for tapssh-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a command over SSH
///
/// The `Display` text is what the classifier matches against, so keep the
/// wording of each variant free of keywords that belong to another category.
#[derive(Error, Debug, Clone)]
pub enum SshError {
    /// Transport could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Server rejected the credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Session is up but running the command failed
    #[error("command execution failed: {0}")]
    Exec(String),

    /// Remote command finished with a non-zero exit status
    #[error("command exited with status {status}")]
    CommandFailed {
        /// Exit status reported by the remote shell
        status: u32,
        /// Merged stdout/stderr captured before exit
        output: String,
    },

    /// Session went away before the command reported an exit status
    #[error("connection reset: session closed before the command completed")]
    SessionClosed,

    /// A newer session was requested while this one was still connecting
    #[error("connection reset: superseded by a newer session")]
    Superseded,

    /// Deadline elapsed before the operation finished
    #[error("connection timed out after {timeout:?}")]
    Timeout {
        /// Deadline that was exceeded
        timeout: Duration,
    },

    /// Closing a session failed
    #[error("disconnect failed: {0}")]
    Disconnect(String),

    /// Relay hop failed before a response arrived
    #[error("relay request failed: {0}")]
    Relay(String),
}

/// Coarse failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not establish a session
    Connect,
    /// Session established but command execution failed
    Exec,
    /// Deadline exceeded
    Timeout,
    /// Failure while closing; never surfaced
    Disconnect,
}

impl SshError {
    /// Place this error in the coarse taxonomy
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SshError::Connect(_)
            | SshError::Authentication(_)
            | SshError::Relay(_)
            | SshError::Superseded => ErrorKind::Connect,
            SshError::Exec(_) | SshError::CommandFailed { .. } | SshError::SessionClosed => {
                ErrorKind::Exec
            }
            SshError::Timeout { .. } => ErrorKind::Timeout,
            SshError::Disconnect(_) => ErrorKind::Disconnect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SshError::Connect("x".into()).kind(), ErrorKind::Connect);
        assert_eq!(
            SshError::Authentication("x".into()).kind(),
            ErrorKind::Connect
        );
        assert_eq!(SshError::SessionClosed.kind(), ErrorKind::Exec);
        assert_eq!(SshError::Superseded.kind(), ErrorKind::Connect);
        assert_eq!(
            SshError::Timeout {
                timeout: Duration::from_secs(1)
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            SshError::Disconnect("x".into()).kind(),
            ErrorKind::Disconnect
        );
    }
}
