//! Direct SSH command executor
//!
//! Runs connect → execute → disconnect under one deadline. When the deadline
//! fires the in-flight future is dropped, which cancels the pending network
//! call, and the session is closed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::classify::{Locale, classify};
use crate::config::{DEFAULT_COMMAND_TIMEOUT_SECS, ExecConfig};
use crate::error::SshError;
use crate::manager::{ConnectionManager, SessionLease};
use crate::result::{CommandRequest, ExecutionResult};
use crate::traits::CommandExecutor;

/// Executes commands over sessions from a shared [`ConnectionManager`]
#[derive(Debug)]
pub struct SshCommandExecutor {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
    locale: Locale,
}

impl SshCommandExecutor {
    /// Create an executor with the default 30 second deadline
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager,
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            locale: Locale::default(),
        }
    }

    /// Create an executor from settings
    pub fn from_config(manager: Arc<ConnectionManager>, config: &ExecConfig) -> Self {
        Self {
            manager,
            timeout: config.timeout(),
            locale: config.locale,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Connect and run; the lease is parked in `slot` as soon as it exists so
    /// the caller can close it even if this future is dropped.
    async fn connect_and_run(
        &self,
        request: &CommandRequest,
        slot: &mut Option<SessionLease>,
    ) -> Result<String, SshError> {
        let lease = self.manager.begin_session(&request.target).await?;
        let session = Arc::clone(lease.session());
        *slot = Some(lease);

        let output = session.exec(&request.command).await?;
        if !output.success() {
            return Err(SshError::CommandFailed {
                status: output.exit_status,
                output: output.merged,
            });
        }
        Ok(output.merged)
    }

    fn success(&self, output: String) -> ExecutionResult {
        let output = if output.is_empty() {
            self.locale.success_placeholder().to_string()
        } else {
            output
        };
        ExecutionResult::Success { output }
    }
}

#[async_trait]
impl CommandExecutor for SshCommandExecutor {
    #[instrument(
        skip(self, request),
        fields(host = %request.target.host, port = request.target.port)
    )]
    async fn execute(&self, request: CommandRequest) -> ExecutionResult {
        let start = Instant::now();
        debug!(command = %request.command, timeout = ?self.timeout, "executing with timeout");

        let mut lease = None;
        let outcome = timeout(self.timeout, self.connect_and_run(&request, &mut lease)).await;

        // Every exit path closes the session
        if let Some(lease) = lease.as_ref() {
            self.manager.end_session(lease).await;
        }

        let err = match outcome {
            Ok(Ok(output)) => {
                info!(elapsed = ?start.elapsed(), "command succeeded");
                return self.success(output);
            }
            Ok(Err(e)) => e,
            Err(_) => {
                error!(
                    command = %request.command,
                    timeout = ?self.timeout,
                    elapsed = ?start.elapsed(),
                    "command timed out"
                );
                SshError::Timeout {
                    timeout: self.timeout,
                }
            }
        };

        let classified = classify(&err, self.locale);
        warn!(
            error = %err,
            kind = ?err.kind(),
            category = %classified.category,
            elapsed = ?start.elapsed(),
            "command failed"
        );
        classified.into()
    }

    fn executor_type(&self) -> &'static str {
        "ssh"
    }
}
