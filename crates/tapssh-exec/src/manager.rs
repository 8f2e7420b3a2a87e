//! Single-session connection manager
//!
//! The manager holds at most one live session. Starting a new session first
//! closes whatever is held; the previous holder's in-flight command then fails
//! and its own `end_session` becomes a no-op. Concurrent callers are resolved
//! last-writer-wins: every `begin_session` bumps a generation counter, and a
//! connect still in flight for an older generation is dropped and reports
//! `SshError::Superseded`. Nothing queues behind a pending connect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::DEFAULT_CLOSE_GRACE_MS;
use crate::error::SshError;
use crate::result::SshTarget;
use crate::traits::{Session, Transport};

/// Session handed out by [`ConnectionManager::begin_session`]
#[derive(Clone)]
pub struct SessionLease {
    id: u64,
    session: Arc<dyn Session>,
}

impl SessionLease {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }
}

impl std::fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLease")
            .field("id", &self.id)
            .field("closed", &self.session.is_closed())
            .finish()
    }
}

/// Owns the one current session
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    current: Mutex<Option<SessionLease>>,
    /// Bumped under the `current` lock by every `begin_session` and `close_current`
    generation: watch::Sender<u64>,
    /// Held by whoever is dialing; released as soon as that dial is superseded
    dialing: Mutex<()>,
    next_id: AtomicU64,
    close_grace: Duration,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("has_session", &self.has_session())
            .field("close_grace", &self.close_grace)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            current: Mutex::new(None),
            generation: watch::Sender::new(0),
            dialing: Mutex::new(()),
            next_id: AtomicU64::new(1),
            close_grace: Duration::from_millis(DEFAULT_CLOSE_GRACE_MS),
        }
    }

    /// Bound how long a single close may block
    #[must_use]
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Close any held session, then open a new one
    ///
    /// The previous session is closed before dialing starts. A call that
    /// arrives while this one is still connecting wins: this call's dial is
    /// dropped, or the session it produced is closed, and it returns
    /// `SshError::Superseded`. At most one session from this manager is open
    /// at any time.
    ///
    /// # Errors
    /// Returns `SshError::Connect` or `SshError::Authentication` if the new
    /// session cannot be established, and `SshError::Superseded` if a newer
    /// call took over first. Failures closing the previous session are logged
    /// and dropped.
    #[instrument(skip(self, target), fields(host = %target.host, port = target.port))]
    pub async fn begin_session(&self, target: &SshTarget) -> Result<SessionLease, SshError> {
        let (generation, previous) = {
            let mut current = self.current.lock().await;
            (self.bump_generation(), current.take())
        };

        if let Some(previous) = previous {
            info!(session_id = previous.id, "closing previous session");
            self.close_quietly(&previous).await;
        }

        // An older dial still holds this; it lets go once it sees the new generation
        let _dialing = tokio::select! {
            biased;
            () = self.superseded(generation) => return Err(self.superseded_error(generation)),
            guard = self.dialing.lock() => guard,
        };

        let session = tokio::select! {
            biased;
            () = self.superseded(generation) => return Err(self.superseded_error(generation)),
            opened = self.transport.open(target) => opened?,
        };
        let lease = SessionLease {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            session,
        };

        let installed = {
            let mut current = self.current.lock().await;
            let installed = *self.generation.borrow() == generation;
            if installed {
                *current = Some(lease.clone());
            }
            installed
        };

        if !installed {
            info!(session_id = lease.id, "newer session requested while connecting");
            self.close_quietly(&lease).await;
            return Err(SshError::Superseded);
        }

        debug!(session_id = lease.id, "session opened");
        Ok(lease)
    }

    /// Close a session; safe to call more than once and never fails
    pub async fn end_session(&self, lease: &SessionLease) {
        {
            let mut current = self.current.lock().await;
            if current.as_ref().is_some_and(|held| held.id == lease.id) {
                current.take();
            }
        }
        self.close_quietly(lease).await;
    }

    /// Force-close whatever session is held
    ///
    /// A connect still in flight is superseded as well.
    pub async fn close_current(&self) {
        let previous = {
            let mut current = self.current.lock().await;
            self.bump_generation();
            current.take()
        };
        if let Some(previous) = previous {
            self.close_quietly(&previous).await;
        }
    }

    /// Whether a session is currently tracked
    ///
    /// This is a best-effort synchronous check; it reports `false` while the
    /// slot is briefly locked by another call.
    pub fn has_session(&self) -> bool {
        self.current
            .try_lock()
            .map(|s| s.as_ref().is_some_and(|l| !l.session.is_closed()))
            .unwrap_or(false)
    }

    /// Must be called with the `current` lock held
    fn bump_generation(&self) -> u64 {
        let mut bumped = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            bumped = *g;
        });
        bumped
    }

    /// Resolves once a newer call has claimed the slot
    async fn superseded(&self, generation: u64) {
        let mut rx = self.generation.subscribe();
        loop {
            if *rx.borrow_and_update() != generation {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn superseded_error(&self, generation: u64) -> SshError {
        debug!(generation, "connect abandoned for a newer session");
        SshError::Superseded
    }

    async fn close_quietly(&self, lease: &SessionLease) {
        if lease.session.is_closed() {
            return;
        }

        match timeout(self.close_grace, lease.session.close()).await {
            Ok(Ok(())) => debug!(session_id = lease.id, "session closed"),
            Ok(Err(e)) => warn!(session_id = lease.id, error = %e, "ignoring close failure"),
            Err(_) => warn!(
                session_id = lease.id,
                grace = ?self.close_grace,
                "session close did not finish in time, abandoning"
            ),
        }
    }
}
