//! Scripted transport shared by the executor integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use tapssh_exec::{RemoteOutput, Session, SshError, SshTarget, Transport};

/// What the next `open` call does
#[derive(Debug, Clone)]
pub enum OpenScript {
    /// Fail to connect with this message
    Fail(SshError),
    /// Never finish connecting
    Hang,
    /// Connect; the session's `exec` behaves as given
    Session(ExecScript),
}

/// What `exec` does on a scripted session
#[derive(Debug, Clone)]
pub enum ExecScript {
    /// Finish with this status and merged output after an optional delay
    Output {
        status: u32,
        merged: String,
        delay: Duration,
    },
    /// Block until the session is closed, then fail
    HangUntilClosed,
    /// Fail straight away
    Fail(SshError),
}

impl ExecScript {
    pub fn ok(merged: &str) -> Self {
        ExecScript::Output {
            status: 0,
            merged: merged.to_string(),
            delay: Duration::ZERO,
        }
    }
}

/// Shared log of what the transport saw
#[derive(Debug, Default)]
pub struct Journal {
    pub events: Vec<String>,
    pub live: usize,
    pub max_live: usize,
    pub opened: usize,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    scripts: Arc<Mutex<VecDeque<OpenScript>>>,
    journal: Arc<Mutex<Journal>>,
    close_fails: bool,
    close_hangs: bool,
}

impl MockTransport {
    pub fn new(scripts: impl IntoIterator<Item = OpenScript>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Sessions report an error from `close`, though they do end up closed
    pub fn with_failing_close(mut self) -> Self {
        self.close_fails = true;
        self
    }

    /// `close` never returns
    pub fn with_hanging_close(mut self) -> Self {
        self.close_hangs = true;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.journal.lock().unwrap().events.clone()
    }

    pub fn live(&self) -> usize {
        self.journal.lock().unwrap().live
    }

    pub fn max_live(&self) -> usize {
        self.journal.lock().unwrap().max_live
    }

    pub fn opened(&self) -> usize {
        self.journal.lock().unwrap().opened
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, target: &SshTarget) -> Result<Arc<dyn Session>, SshError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OpenScript::Session(ExecScript::ok("")));

        let exec = match script {
            OpenScript::Fail(e) => {
                self.journal
                    .lock()
                    .unwrap()
                    .events
                    .push(format!("fail {}", target.host));
                return Err(e);
            }
            OpenScript::Hang => std::future::pending().await,
            OpenScript::Session(exec) => exec,
        };

        let id = {
            let mut journal = self.journal.lock().unwrap();
            journal.opened += 1;
            journal.live += 1;
            journal.max_live = journal.max_live.max(journal.live);
            let id = journal.opened;
            journal.events.push(format!("open {id}"));
            id
        };

        let (closed_tx, _) = watch::channel(false);
        Ok(Arc::new(MockSession {
            id,
            exec,
            closed: closed_tx,
            journal: Arc::clone(&self.journal),
            close_fails: self.close_fails,
            close_hangs: self.close_hangs,
        }))
    }
}

pub struct MockSession {
    id: usize,
    exec: ExecScript,
    closed: watch::Sender<bool>,
    journal: Arc<Mutex<Journal>>,
    close_fails: bool,
    close_hangs: bool,
}

#[async_trait]
impl Session for MockSession {
    async fn exec(&self, _command: &str) -> Result<RemoteOutput, SshError> {
        let mut closed = self.closed.subscribe();
        match &self.exec {
            ExecScript::Output {
                status,
                merged,
                delay,
            } => {
                tokio::select! {
                    () = tokio::time::sleep(*delay) => Ok(RemoteOutput {
                        exit_status: *status,
                        merged: merged.clone(),
                    }),
                    () = wait_closed(&mut closed) => Err(SshError::SessionClosed),
                }
            }
            ExecScript::HangUntilClosed => {
                wait_closed(&mut closed).await;
                Err(SshError::SessionClosed)
            }
            ExecScript::Fail(e) => Err(e.clone()),
        }
    }

    async fn close(&self) -> Result<(), SshError> {
        if self.close_hangs {
            std::future::pending::<()>().await;
        }
        let was_closed = self.closed.send_replace(true);
        if !was_closed {
            let mut journal = self.journal.lock().unwrap();
            journal.live -= 1;
            journal.events.push(format!("close {}", self.id));
        }
        if self.close_fails {
            return Err(SshError::Disconnect("socket already gone".to_string()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

async fn wait_closed(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

pub fn target() -> SshTarget {
    SshTarget::new("192.168.1.50", "pi", "correct")
}
