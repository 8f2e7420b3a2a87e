//! Relay-proxied command executor
//!
//! Delegates the SSH hop to a tapssh relay over HTTP. The relay runs the
//! command with its own direct executor and reports a classified result.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tapssh_api::{ExecuteRequest, ExecuteResponse};
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::classify::{ErrorCategory, Locale, classify, describe};
use crate::config::{DEFAULT_RELAY_TIMEOUT_SECS, ExecConfig, TransportConfig};
use crate::error::SshError;
use crate::result::{CommandRequest, ExecutionResult};
use crate::traits::CommandExecutor;

/// Path of the execute endpoint on the relay
pub const EXECUTE_PATH: &str = "api/ssh/execute";

/// Errors building a relay executor
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Invalid relay URL
    #[error("invalid relay URL: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration does not select the relay transport
    #[error("transport is not configured as relay")]
    NotRelay,
}

/// Runs commands through a relay service
#[derive(Debug, Clone)]
pub struct RelayExecutor {
    client: Client,
    endpoint: Url,
    timeout: Duration,
    locale: Locale,
    button_id: String,
}

impl RelayExecutor {
    /// Create an executor for the relay at `base_url`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, RelayError> {
        Self::with_client(base_url, Client::new())
    }

    /// Create an executor with custom `reqwest::Client`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn with_client(base_url: impl AsRef<str>, client: Client) -> Result<Self, RelayError> {
        let mut base = Url::parse(base_url.as_ref())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            endpoint: base.join(EXECUTE_PATH)?,
            timeout: Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS),
            locale: Locale::default(),
            button_id: "unknown".to_string(),
        })
    }

    /// Create an executor from settings, applying the shorter deadline
    ///
    /// # Errors
    /// Returns `RelayError::NotRelay` for a direct transport, or a URL error.
    pub fn from_config(config: &ExecConfig) -> Result<Self, RelayError> {
        let TransportConfig::Relay { url, .. } = &config.transport else {
            return Err(RelayError::NotRelay);
        };
        Ok(Self::new(url)?
            .with_timeout(config.effective_timeout())
            .with_locale(config.locale))
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

    /// Identifier sent along with each request for the relay's log
    #[must_use]
    pub fn with_button_id(mut self, button_id: impl Into<String>) -> Self {
        self.button_id = button_id.into();
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, body: &ExecuteRequest) -> Result<ExecuteResponse, SshError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| self.relay_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SshError::Relay(format!("relay returned {status}: {message}")));
        }

        response.json().await.map_err(|e| self.relay_error(e))
    }

    fn relay_error(&self, e: reqwest::Error) -> SshError {
        if e.is_timeout() {
            return SshError::Timeout {
                timeout: self.timeout,
            };
        }
        // Keep the io cause ("refused" and friends) but not the relay URL
        let e = e.without_url();
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        SshError::Relay(message)
    }

    fn result_from(&self, response: ExecuteResponse) -> ExecutionResult {
        if response.success {
            let output = if response.output.is_empty() {
                self.locale.success_placeholder().to_string()
            } else {
                response.output
            };
            return ExecutionResult::Success { output };
        }

        let category = response
            .error_category
            .as_deref()
            .and_then(|c| c.parse::<ErrorCategory>().ok())
            .unwrap_or(ErrorCategory::Unknown);
        let raw = response.error.unwrap_or(response.output);
        describe(category, &raw, self.locale).into()
    }
}

#[async_trait]
impl CommandExecutor for RelayExecutor {
    #[instrument(
        skip(self, request),
        fields(relay = %self.endpoint, host = %request.target.host)
    )]
    async fn execute(&self, request: CommandRequest) -> ExecutionResult {
        let start = Instant::now();
        let body = ExecuteRequest {
            ssh: (&request).into(),
            button_id: self.button_id.clone(),
        };

        debug!(command = %request.command, timeout = ?self.timeout, "sending to relay");

        let err = match timeout(self.timeout, self.post(&body)).await {
            Ok(Ok(response)) => {
                debug!(
                    success = response.success,
                    remote_time = response.execution_time,
                    elapsed = ?start.elapsed(),
                    "relay responded"
                );
                return self.result_from(response);
            }
            Ok(Err(e)) => e,
            Err(_) => {
                error!(timeout = ?self.timeout, elapsed = ?start.elapsed(), "relay request timed out");
                SshError::Timeout {
                    timeout: self.timeout,
                }
            }
        };

        let classified = classify(&err, self.locale);
        warn!(error = %err, category = %classified.category, "relay execution failed");
        classified.into()
    }

    fn executor_type(&self) -> &'static str {
        "relay"
    }
}
