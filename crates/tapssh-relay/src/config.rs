//! Configuration loading and types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tapssh_exec::{ExecConfig, TransportConfig};

/// Top-level configuration for the relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub relay: RelayConfig,
    /// SSH execution settings for the hop this relay performs
    #[serde(default)]
    pub exec: ExecConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How many execution log entries to keep in memory
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_capacity: default_log_capacity(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_capacity() -> usize {
    500
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.normalized())
    }

    /// Load from default paths or use defaults
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("TAPSSH_RELAY_CONFIG") {
            return Self::load(Path::new(&path));
        }

        let paths = [
            PathBuf::from("tapssh-relay.toml"),
            PathBuf::from("/etc/tapssh/tapssh-relay.toml"),
            dirs::config_dir()
                .map(|p| p.join("tapssh/tapssh-relay.toml"))
                .unwrap_or_default(),
        ];

        for path in paths {
            if path.is_file() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }

    /// The relay always performs the SSH hop itself
    fn normalized(mut self) -> Self {
        if self.exec.transport != TransportConfig::Direct {
            tracing::warn!("relay cannot forward to another relay, using direct transport");
            self.exec.transport = TransportConfig::Direct;
        }
        self
    }
}
