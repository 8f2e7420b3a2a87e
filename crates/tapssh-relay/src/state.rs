//! Application state shared across HTTP handlers

use std::collections::VecDeque;
use std::sync::Arc;

use tapssh_api::LogEntry;
use tapssh_exec::{ConnectionManager, ExecConfig, SshCommandExecutor, Transport};
use tokio::sync::Mutex;

use crate::config::Config;

/// Application state shared across all handlers
pub struct AppState {
    /// Opens SSH sessions for each request
    pub transport: Arc<dyn Transport>,
    /// Execution settings
    pub exec: ExecConfig,
    /// Most recent executions, oldest first
    logs: Mutex<VecDeque<LogEntry>>,
    log_capacity: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            exec: config.exec.clone(),
            logs: Mutex::new(VecDeque::new()),
            log_capacity: config.relay.log_capacity.max(1),
        }
    }

    /// Executor for one request
    ///
    /// Each request gets its own manager: the relay serves many devices and
    /// one caller must not tear down another caller's session.
    pub fn executor(&self) -> SshCommandExecutor {
        let manager = ConnectionManager::new(Arc::clone(&self.transport))
            .with_close_grace(self.exec.close_grace());
        SshCommandExecutor::from_config(Arc::new(manager), &self.exec)
    }

    /// Append a log entry, evicting the oldest past capacity
    pub async fn record(&self, entry: LogEntry) {
        let mut logs = self.logs.lock().await;
        if logs.len() == self.log_capacity {
            logs.pop_front();
        }
        logs.push_back(entry);
    }

    /// Up to `limit` entries, newest first
    pub async fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.logs
            .lock()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}
