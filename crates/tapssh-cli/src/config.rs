//! Configuration loading and types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tapssh_exec::ExecConfig;

/// Top-level configuration for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Execution settings
    #[serde(default)]
    pub exec: ExecConfig,
    /// Where command statuses are kept
    #[serde(default)]
    pub status: StatusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            exec: ExecConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

/// Status store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusConfig {
    /// JSON file holding the last status per command id
    pub path: Option<PathBuf>,
}

impl StatusConfig {
    /// Configured path, or `<data_dir>/tapssh/status.json`
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|p| p.join("tapssh/status.json"))
                .unwrap_or_else(|| PathBuf::from("tapssh-status.json"))
        })
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("TAPSSH_CONFIG") {
            return Self::load(Path::new(&path));
        }

        let paths = [
            PathBuf::from("tapssh.toml"),
            dirs::config_dir()
                .map(|p| p.join("tapssh/tapssh.toml"))
                .unwrap_or_default(),
        ];

        for path in paths {
            if path.is_file() {
                return Self::load(&path);
            }
        }

        Ok(Config::default())
    }
}
