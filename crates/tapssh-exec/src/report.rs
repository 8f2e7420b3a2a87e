//! Last-known command status persistence
//!
//! The reporter records `Executing` before a run and `Success`/`Error` after
//! it, keyed by the command identifier. A broken store never changes what the
//! caller gets back from the executor.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::result::{CommandRequest, ExecutionResult};
use crate::traits::CommandExecutor;

/// Errors from a status store
#[derive(Error, Debug)]
pub enum StatusError {
    /// Reading or writing the backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a command stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    Idle,
    Executing,
    Success,
    Error,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandState::Idle => "idle",
            CommandState::Executing => "executing",
            CommandState::Success => "success",
            CommandState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Last known status of one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    pub state: CommandState,
    /// Output on success, user-facing error on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CommandStatus {
    #[must_use]
    pub fn new(state: CommandState, message: Option<String>) -> Self {
        Self {
            state,
            message,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn executing() -> Self {
        Self::new(CommandState::Executing, None)
    }
}

impl From<&ExecutionResult> for CommandStatus {
    fn from(result: &ExecutionResult) -> Self {
        let state = if result.is_success() {
            CommandState::Success
        } else {
            CommandState::Error
        };
        Self::new(state, Some(result.text().to_string()))
    }
}

/// Key-value sink for command statuses
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn record(&self, command_id: &str, status: CommandStatus) -> Result<(), StatusError>;

    async fn last(&self, command_id: &str) -> Result<Option<CommandStatus>, StatusError>;

    async fn all(&self) -> Result<BTreeMap<String, CommandStatus>, StatusError>;

    async fn clear(&self) -> Result<(), StatusError>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    entries: RwLock<BTreeMap<String, CommandStatus>>,
}

impl MemoryStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn record(&self, command_id: &str, status: CommandStatus) -> Result<(), StatusError> {
        self.entries
            .write()
            .await
            .insert(command_id.to_string(), status);
        Ok(())
    }

    async fn last(&self, command_id: &str) -> Result<Option<CommandStatus>, StatusError> {
        Ok(self.entries.read().await.get(command_id).cloned())
    }

    async fn all(&self) -> Result<BTreeMap<String, CommandStatus>, StatusError> {
        Ok(self.entries.read().await.clone())
    }

    async fn clear(&self) -> Result<(), StatusError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Store backed by a single JSON object on disk
///
/// Writes go to a sibling temp file which is then renamed over the target.
#[derive(Debug)]
pub struct JsonFileStatusStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, CommandStatus>, StatusError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, CommandStatus>) -> Result<(), StatusError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusStore for JsonFileStatusStore {
    async fn record(&self, command_id: &str, status: CommandStatus) -> Result<(), StatusError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(command_id.to_string(), status);
        self.save(&entries).await
    }

    async fn last(&self, command_id: &str) -> Result<Option<CommandStatus>, StatusError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(command_id))
    }

    async fn all(&self) -> Result<BTreeMap<String, CommandStatus>, StatusError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn clear(&self) -> Result<(), StatusError> {
        let _guard = self.lock.lock().await;
        self.save(&BTreeMap::new()).await
    }
}

/// Runs commands and keeps the status store current
pub struct Reporter {
    executor: Arc<dyn CommandExecutor>,
    store: Arc<dyn StatusStore>,
}

impl Reporter {
    pub fn new(executor: Arc<dyn CommandExecutor>, store: Arc<dyn StatusStore>) -> Self {
        Self { executor, store }
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Run `request` and record its status under `command_id`
    #[instrument(skip(self, request), fields(executor = self.executor.executor_type()))]
    pub async fn run(&self, command_id: &str, request: CommandRequest) -> ExecutionResult {
        self.record(command_id, CommandStatus::executing()).await;

        let result = self.executor.execute(request).await;

        debug!(success = result.is_success(), "recording result");
        self.record(command_id, CommandStatus::from(&result)).await;
        result
    }

    async fn record(&self, command_id: &str, status: CommandStatus) {
        if let Err(e) = self.store.record(command_id, status).await {
            warn!(command_id, error = %e, "failed to persist command status");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::classify::ErrorCategory;
    use crate::result::SshTarget;

    struct FixedExecutor {
        result: ExecutionResult,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandExecutor for FixedExecutor {
        async fn execute(&self, _request: CommandRequest) -> ExecutionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn executor_type(&self) -> &'static str {
            "fixed"
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl StatusStore for BrokenStore {
        async fn record(&self, _id: &str, _status: CommandStatus) -> Result<(), StatusError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn last(&self, _id: &str) -> Result<Option<CommandStatus>, StatusError> {
            Ok(None)
        }

        async fn all(&self) -> Result<BTreeMap<String, CommandStatus>, StatusError> {
            Ok(BTreeMap::new())
        }

        async fn clear(&self) -> Result<(), StatusError> {
            Ok(())
        }
    }

    fn request() -> CommandRequest {
        CommandRequest::new(SshTarget::new("192.168.1.50", "pi", "pw"), "uptime")
    }

    #[tokio::test]
    async fn test_reporter_records_success() {
        let store = Arc::new(MemoryStatusStore::new());
        let executor = Arc::new(FixedExecutor {
            result: ExecutionResult::Success {
                output: "up 3 days\n".to_string(),
            },
            calls: AtomicUsize::new(0),
        });
        let reporter = Reporter::new(executor.clone(), store.clone());

        let result = reporter.run("btn-uptime", request()).await;

        assert!(result.is_success());
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
        let status = store.last("btn-uptime").await.unwrap().unwrap();
        assert_eq!(status.state, CommandState::Success);
        assert_eq!(status.message.as_deref(), Some("up 3 days\n"));
    }

    #[tokio::test]
    async fn test_reporter_records_failure_text() {
        let store = Arc::new(MemoryStatusStore::new());
        let executor = Arc::new(FixedExecutor {
            result: ExecutionResult::Failure {
                category: ErrorCategory::Timeout,
                message: "Connection timed out. The device is not responding.".to_string(),
            },
            calls: AtomicUsize::new(0),
        });
        let reporter = Reporter::new(executor, store.clone());

        reporter.run("btn-reboot", request()).await;

        let status = store.last("btn-reboot").await.unwrap().unwrap();
        assert_eq!(status.state, CommandState::Error);
        assert!(status.message.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_change_result() {
        let executor = Arc::new(FixedExecutor {
            result: ExecutionResult::Success {
                output: "ok".to_string(),
            },
            calls: AtomicUsize::new(0),
        });
        let reporter = Reporter::new(executor, Arc::new(BrokenStore));

        let result = reporter.run("btn", request()).await;
        assert_eq!(
            result,
            ExecutionResult::Success {
                output: "ok".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("status.json");

        let store = JsonFileStatusStore::new(&path);
        assert!(store.last("btn-1").await.unwrap().is_none());

        store
            .record(
                "btn-1",
                CommandStatus::new(CommandState::Success, Some("hello\n".to_string())),
            )
            .await
            .unwrap();
        store
            .record("btn-2", CommandStatus::executing())
            .await
            .unwrap();

        let reopened = JsonFileStatusStore::new(&path);
        let all = reopened.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["btn-1"].message.as_deref(), Some("hello\n"));
        assert_eq!(all["btn-2"].state, CommandState::Executing);

        reopened.clear().await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = JsonFileStatusStore::new(&path);
        assert!(matches!(store.all().await, Err(StatusError::Json(_))));
    }
}
