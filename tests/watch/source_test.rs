//! Reconnecting source against a flaky server.

use std::time::{Duration, Instant};

use resource_watcher::watch::{ChangeType, HttpTransport, ReconnectingSource, SourceState};

use crate::common::{chunk, event_chunk, Reply, TestServer};

const INTERVAL: Duration = Duration::from_millis(100);

#[tokio::test]
async fn recovers_from_every_failure_kind() {
    let server = TestServer::start(vec![
        Reply::status("500 Internal Server Error"),
        Reply::ok(format!("{}{}", event_chunk("ADDED", "a"), chunk("{not json"))),
        Reply::ok(format!("{}ff\r\nshort\n\r\n", event_chunk("ADDED", "b"))),
        Reply::ok(String::new()),
        Reply::ok(event_chunk("DELETED", "c")),
    ])
    .await;

    let mut source = ReconnectingSource::new(HttpTransport::new(), server.url.clone(), INTERVAL);
    let start = Instant::now();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(source.next_event().await.resource.id().to_string());
    }

    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(source.attempts(), 5);
    assert_eq!(server.connections(), 5);
    assert_eq!(source.state(), SourceState::Streaming);
    // One backoff after each of the four failed connections.
    assert!(start.elapsed() >= INTERVAL * 4);
}

#[tokio::test]
async fn clean_close_reconnects_after_interval() {
    let server = TestServer::start(vec![
        Reply::ok(event_chunk("ADDED", "first")),
        Reply::ok(event_chunk("MODIFIED", "first")),
    ])
    .await;

    let mut source = ReconnectingSource::new(HttpTransport::new(), server.url.clone(), INTERVAL);

    let first = source.next_event().await;
    assert_eq!(first.change_type, ChangeType::Added);
    assert_eq!(server.connections(), 1);

    let closed_at = Instant::now();
    let second = source.next_event().await;
    assert_eq!(second.change_type, ChangeType::Modified);
    assert_eq!(server.connections(), 2);
    assert!(closed_at.elapsed() >= INTERVAL);
}

#[tokio::test]
async fn at_most_one_attempt_per_interval() {
    let server = TestServer::start(Vec::new()).await;
    let mut source = ReconnectingSource::new(HttpTransport::new(), server.url.clone(), INTERVAL);

    let window = INTERVAL * 5 + INTERVAL / 2;
    let result = tokio::time::timeout(window, source.next_event()).await;

    assert!(result.is_err(), "no event can arrive from a failing server");
    let connections = server.connections();
    assert!(connections >= 1);
    assert!(
        connections <= 6,
        "expected at most 6 attempts in {window:?}, saw {connections}"
    );
}
