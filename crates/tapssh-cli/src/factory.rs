//! Executor factory: picks direct SSH or relay from configuration

use std::sync::Arc;

use eyre::Result;
use tapssh_exec::{
    CommandExecutor, ConnectionManager, ExecConfig, RelayExecutor, RusshTransport,
    SshCommandExecutor, TransportConfig,
};

/// Create the executor selected by `config.transport`
///
/// `button_id` is forwarded to the relay for its execution log.
pub fn create_executor(config: &ExecConfig, button_id: &str) -> Result<Arc<dyn CommandExecutor>> {
    match &config.transport {
        TransportConfig::Direct => {
            let manager = ConnectionManager::new(Arc::new(RusshTransport::new()))
                .with_close_grace(config.close_grace());
            Ok(Arc::new(SshCommandExecutor::from_config(
                Arc::new(manager),
                config,
            )))
        }
        TransportConfig::Relay { .. } => {
            let executor = RelayExecutor::from_config(config)
                .map_err(|e| eyre::eyre!("failed to create relay executor: {e}"))?
                .with_button_id(button_id);
            Ok(Arc::new(executor))
        }
    }
}
