mod common;
use crate::common::builders::SourceConfigBuilder;
use crate::common::{eventually, init_tracing, mock_fs, next_records, with_timeout};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{AccessKind, CreateKind, EventKind};
use notify::Event;

use dirchanges::{ChangeKind, ChangeRecord, DirChangesError, DirectoryChangeSource};
use dirchanges_test_utils::scripted_backend::ScriptedBackend;

type TestResult = Result<(), Box<dyn Error>>;

fn create(path: &str) -> Event {
    Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from(path))
}

fn source_on(backend: &ScriptedBackend) -> DirectoryChangeSource {
    DirectoryChangeSource::with_backend(
        SourceConfigBuilder::new().build(),
        Arc::new(backend.clone()),
        Arc::new(mock_fs()),
    )
}

#[tokio::test]
async fn registration_failure_is_reported_at_start() -> TestResult {
    init_tracing();
    let backend = ScriptedBackend::new().fail_open("inotify limit reached");
    let source = source_on(&backend);

    match source.subscribe() {
        Err(DirChangesError::WatchPrimitive(msg)) => assert!(msg.contains("inotify limit")),
        Err(e) => panic!("Expected WatchPrimitive, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    assert_eq!(backend.opened(), 0);
    Ok(())
}

#[tokio::test]
async fn records_then_terminal_failure_then_nothing() -> TestResult {
    init_tracing();
    let backend = ScriptedBackend::new()
        .then_events(vec![create("/w/a"), create("/w/b")])
        .then_events(vec![])
        .then_fail(DirChangesError::WatchPrimitive("backend lost".into()))
        .then_events(vec![create("/w/never")]);
    let source = source_on(&backend);
    let mut sub = source.subscribe()?;
    sub.request(10);

    let got = next_records(&mut sub, 2).await;
    assert_eq!(
        got,
        vec![
            ChangeRecord::new("/w/a", ChangeKind::Creation),
            ChangeRecord::new("/w/b", ChangeKind::Creation),
        ]
    );

    match with_timeout(sub.next()).await {
        Some(Err(DirChangesError::WatchPrimitive(msg))) => assert_eq!(msg, "backend lost"),
        other => panic!("Expected WatchPrimitive, got: {:?}", other),
    }
    assert!(sub.next().await.is_none());

    with_timeout(sub.wait_released()).await;
    assert_eq!(backend.opened(), 1);
    assert_eq!(backend.live_sessions(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_and_unclassifiable_drains_keep_polling() -> TestResult {
    init_tracing();
    let backend = ScriptedBackend::new()
        .then_events(vec![])
        .then_events(vec![Event::new(EventKind::Access(AccessKind::Any)).add_path("/w/a".into())])
        .then_events(vec![])
        .then_events(vec![create("/w/late")]);
    let source = source_on(&backend);
    let mut sub = source.subscribe()?;
    sub.request(1);

    let got = next_records(&mut sub, 1).await;
    assert_eq!(got, vec![ChangeRecord::new("/w/late", ChangeKind::Creation)]);
    assert!(backend.drain_calls() >= 4);
    assert!(!sub.is_terminated());
    Ok(())
}

#[tokio::test]
async fn cancel_releases_the_session() -> TestResult {
    init_tracing();
    let backend = ScriptedBackend::new();
    let source = source_on(&backend);
    let mut sub = source.subscribe()?;
    assert_eq!(backend.live_sessions(), 1);

    sub.cancel();
    eventually(|| backend.live_sessions() == 0).await;
    assert_eq!(backend.opened(), 1);
    Ok(())
}

#[tokio::test]
async fn vanished_entry_error_does_not_end_the_stream() -> TestResult {
    init_tracing();
    let vanished = notify::Error::io(std::io::Error::from(std::io::ErrorKind::NotFound))
        .add_path(PathBuf::from("/w/vanished.tmp"));
    let backend = ScriptedBackend::new()
        .then_events(vec![create("/w/a")])
        .then_fail(DirChangesError::from_notify("/w", vanished))
        .then_events(vec![create("/w/b")]);
    let source = source_on(&backend);
    let mut sub = source.subscribe()?;
    sub.request(2);

    let got = next_records(&mut sub, 2).await;
    assert_eq!(
        got,
        vec![
            ChangeRecord::new("/w/a", ChangeKind::Creation),
            ChangeRecord::new("/w/b", ChangeKind::Creation),
        ]
    );
    assert!(!sub.is_terminated());
    assert_eq!(backend.live_sessions(), 1);
    Ok(())
}
