mod common;

use std::sync::Arc;
use std::time::Duration;

use tapssh_exec::{ConnectionManager, SshError};

use common::{ExecScript, MockTransport, OpenScript, target};

#[tokio::test]
async fn test_begin_closes_previous_before_opening() {
    let transport = MockTransport::new([
        OpenScript::Session(ExecScript::ok("")),
        OpenScript::Session(ExecScript::ok("")),
    ]);
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    let first = manager.begin_session(&target()).await.unwrap();
    let second = manager.begin_session(&target()).await.unwrap();

    assert!(first.session().is_closed());
    assert!(!second.session().is_closed());
    assert_ne!(first.id(), second.id());
    assert_eq!(transport.events(), vec!["open 1", "close 1", "open 2"]);
    assert_eq!(transport.max_live(), 1);
}

#[tokio::test]
async fn test_end_session_is_idempotent() {
    let transport = MockTransport::new([OpenScript::Session(ExecScript::ok(""))]);
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    let lease = manager.begin_session(&target()).await.unwrap();
    assert!(manager.has_session());

    manager.end_session(&lease).await;
    manager.end_session(&lease).await;

    assert!(!manager.has_session());
    assert_eq!(transport.events(), vec!["open 1", "close 1"]);
}

#[tokio::test]
async fn test_ending_displaced_lease_keeps_current() {
    let transport = MockTransport::new([
        OpenScript::Session(ExecScript::ok("")),
        OpenScript::Session(ExecScript::ok("")),
    ]);
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    let stale = manager.begin_session(&target()).await.unwrap();
    let current = manager.begin_session(&target()).await.unwrap();

    manager.end_session(&stale).await;

    assert!(manager.has_session());
    assert!(!current.session().is_closed());
}

#[tokio::test]
async fn test_connect_failure_leaves_nothing_open() {
    let transport = MockTransport::new([
        OpenScript::Session(ExecScript::ok("")),
        OpenScript::Fail(SshError::Connect("Connection refused".to_string())),
    ]);
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    let first = manager.begin_session(&target()).await.unwrap();
    let err = manager.begin_session(&target()).await.unwrap_err();

    assert!(matches!(err, SshError::Connect(_)));
    assert!(first.session().is_closed());
    assert!(!manager.has_session());
    assert_eq!(transport.live(), 0);
}

#[tokio::test]
async fn test_close_failures_are_swallowed() {
    let transport = MockTransport::new([
        OpenScript::Session(ExecScript::ok("")),
        OpenScript::Session(ExecScript::ok("")),
    ])
    .with_failing_close();
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    manager.begin_session(&target()).await.unwrap();
    let second = manager.begin_session(&target()).await.unwrap();
    manager.end_session(&second).await;

    assert_eq!(transport.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hung_close_is_abandoned_after_grace() {
    let transport = MockTransport::new([
        OpenScript::Session(ExecScript::ok("")),
        OpenScript::Session(ExecScript::ok("")),
    ])
    .with_hanging_close();
    let manager = ConnectionManager::new(Arc::new(transport.clone()))
        .with_close_grace(Duration::from_secs(2));
    let start = tokio::time::Instant::now();

    manager.begin_session(&target()).await.unwrap();
    let second = manager.begin_session(&target()).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(second.id(), 2);
    assert_eq!(transport.opened(), 2);
}

#[tokio::test]
async fn test_close_current() {
    let transport = MockTransport::new([OpenScript::Session(ExecScript::ok(""))]);
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    let lease = manager.begin_session(&target()).await.unwrap();
    manager.close_current().await;
    manager.close_current().await;

    assert!(lease.session().is_closed());
    assert!(!manager.has_session());
}

#[tokio::test(start_paused = true)]
async fn test_pending_connect_does_not_hold_up_next_call() {
    let transport = MockTransport::new([
        OpenScript::Hang,
        OpenScript::Session(ExecScript::ok("")),
    ]);
    let manager = Arc::new(ConnectionManager::new(Arc::new(transport.clone())));

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.begin_session(&target()).await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    let start = tokio::time::Instant::now();
    let second = manager.begin_session(&target()).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!second.session().is_closed());
    assert!(matches!(first.await.unwrap(), Err(SshError::Superseded)));
    assert!(manager.has_session());
    assert_eq!(transport.opened(), 1);
    assert_eq!(transport.max_live(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_close_current_abandons_pending_connect() {
    let transport = MockTransport::new([OpenScript::Hang]);
    let manager = Arc::new(ConnectionManager::new(Arc::new(transport.clone())));

    let pending = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.begin_session(&target()).await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    manager.close_current().await;

    assert!(matches!(pending.await.unwrap(), Err(SshError::Superseded)));
    assert!(!manager.has_session());
    assert_eq!(transport.opened(), 0);
}
