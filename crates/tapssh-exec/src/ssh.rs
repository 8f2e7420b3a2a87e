//! Password-authenticated SSH sessions using the russh crate

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::{ChannelMsg, Disconnect, client};
use tracing::{debug, info, instrument};

use crate::error::SshError;
use crate::result::{RemoteOutput, SshTarget};
use crate::traits::{Session, Transport};

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Devices live on the local network and are addressed by IP; there is
        // no known_hosts to check against.
        debug!("accepting server host key");
        Ok(true)
    }
}

/// Opens sessions over TCP with russh
#[derive(Debug, Clone, Default)]
pub struct RusshTransport {
    config: Arc<client::Config>,
}

impl RusshTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom russh client configuration
    #[must_use]
    pub fn with_config(config: client::Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl Transport for RusshTransport {
    #[instrument(skip(self, target), fields(host = %target.host, port = target.port))]
    async fn open(&self, target: &SshTarget) -> Result<Arc<dyn Session>, SshError> {
        if target.port == 0 {
            return Err(SshError::Connect("invalid port 0".to_string()));
        }

        info!(user = %target.username, "connecting to SSH");

        let mut handle = client::connect(
            self.config.clone(),
            (target.host.as_str(), target.port),
            SshClientHandler,
        )
        .await
        .map_err(|e| SshError::Connect(e.to_string()))?;

        let auth_res = handle
            .authenticate_password(&target.username, &target.password)
            .await
            .map_err(|e| SshError::Authentication(e.to_string()))?;

        if !auth_res.success() {
            // Best effort; the handle is dropped right after either way
            let _ = handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await;
            return Err(SshError::Authentication(format!(
                "password rejected for user {}",
                target.username
            )));
        }

        info!("SSH connected and authenticated");

        Ok(Arc::new(RusshSession {
            handle,
            host: target.host.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// A russh client handle plus a closed flag
pub struct RusshSession {
    handle: client::Handle<SshClientHandler>,
    host: String,
    closed: AtomicBool,
}

impl std::fmt::Debug for RusshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusshSession")
            .field("host", &self.host)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Session for RusshSession {
    #[instrument(skip(self, command), fields(host = %self.host))]
    async fn exec(&self, command: &str) -> Result<RemoteOutput, SshError> {
        if self.is_closed() {
            return Err(SshError::SessionClosed);
        }

        debug!(command = %command, "executing remote command");
        let start = Instant::now();

        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SshError::Exec(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| SshError::Exec(e.to_string()))?;

        // The remote shell does not separate the streams for us; keep them in
        // arrival order.
        let mut merged = Vec::new();
        let mut exit_status = None;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => merged.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, .. }) => merged.extend_from_slice(&data),
                Some(ChannelMsg::ExitStatus { exit_status: code }) => exit_status = Some(code),
                Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                    return Err(SshError::Exec(format!(
                        "remote command killed by signal {signal_name:?}"
                    )));
                }
                Some(ChannelMsg::Close) | None => break,
                _ => {}
            }
        }

        // Without an exit status a dropped connection looks exactly like a
        // command that simply stopped writing.
        let exit_status = exit_status.ok_or(SshError::SessionClosed)?;
        let merged = String::from_utf8_lossy(&merged).to_string();

        debug!(
            status = exit_status,
            bytes = merged.len(),
            duration = ?start.elapsed(),
            "remote command completed"
        );

        Ok(RemoteOutput {
            exit_status,
            merged,
        })
    }

    async fn close(&self) -> Result<(), SshError> {
        if self.closed.swap(true, Ordering::SeqCst) || self.handle.is_closed() {
            return Ok(());
        }

        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| SshError::Disconnect(e.to_string()))?;
        info!(host = %self.host, "SSH disconnected");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.handle.is_closed()
    }
}
