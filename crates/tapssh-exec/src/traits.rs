//! Transport and executor traits

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SshError;
use crate::result::{CommandRequest, ExecutionResult, RemoteOutput, SshTarget};

/// Opens authenticated sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect and authenticate by password
    async fn open(&self, target: &SshTarget) -> Result<Arc<dyn Session>, SshError>;
}

/// A live, authenticated connection
///
/// `close` must be idempotent and must be callable while `exec` is still in
/// flight on another task; doing so makes that `exec` fail.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run one command and wait for its exit status
    async fn exec(&self, command: &str) -> Result<RemoteOutput, SshError>;

    /// Tear the connection down
    async fn close(&self) -> Result<(), SshError>;

    fn is_closed(&self) -> bool;
}

/// Runs a command request end to end
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Exactly one result per call; never panics on transport failures
    async fn execute(&self, request: CommandRequest) -> ExecutionResult;

    fn executor_type(&self) -> &'static str;
}
