//! Execution settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::Locale;

/// Deadline for a direct SSH session
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
/// Deadline for a request that goes through the relay
pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 60;
/// Upper bound on a single session close
pub const DEFAULT_CLOSE_GRACE_MS: u64 = 5_000;

/// Settings shared by every executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// End-to-end deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a forced close may take before it is abandoned
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,
    /// Language of user-facing messages
    #[serde(default)]
    pub locale: Locale,
    /// Direct SSH or relay
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            close_grace_ms: default_close_grace_ms(),
            locale: Locale::default(),
            transport: TransportConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_close_grace_ms() -> u64 {
    DEFAULT_CLOSE_GRACE_MS
}

fn default_relay_timeout_secs() -> u64 {
    DEFAULT_RELAY_TIMEOUT_SECS
}

impl ExecConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }

    /// Deadline that applies to one invocation with the configured transport
    ///
    /// When a request passes through the relay both deadlines apply and the
    /// shorter one wins.
    #[must_use]
    pub fn effective_timeout(&self) -> Duration {
        match &self.transport {
            TransportConfig::Direct => self.timeout(),
            TransportConfig::Relay { timeout_secs, .. } => {
                self.timeout().min(Duration::from_secs(*timeout_secs))
            }
        }
    }
}

/// How the SSH hop is performed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Open the SSH session from this process
    #[default]
    Direct,
    /// Ask a relay service to perform the SSH hop
    Relay {
        /// Base URL of the relay, e.g. `http://10.0.0.1:8001`
        url: String,
        /// Deadline for the HTTP round trip in seconds
        #[serde(default = "default_relay_timeout_secs")]
        timeout_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.transport, TransportConfig::Direct);
    }

    #[test]
    fn test_relay_uses_shorter_deadline() {
        let json = r#"{
            "timeout_secs": 30,
            "transport": {"mode": "relay", "url": "http://relay:8001"}
        }"#;
        let config: ExecConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.transport,
            TransportConfig::Relay {
                url: "http://relay:8001".to_string(),
                timeout_secs: 60,
            }
        );
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));

        let longer = ExecConfig {
            timeout_secs: 90,
            ..config
        };
        assert_eq!(longer.effective_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_locale_parses_lowercase() {
        let config: ExecConfig = serde_json::from_str(r#"{"locale": "tr"}"#).unwrap();
        assert_eq!(config.locale, Locale::Tr);
        assert_eq!(config.timeout_secs, 30);
    }
}
