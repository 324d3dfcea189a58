//! End-to-end: HTTP watch stream to queue messages.

use std::time::Duration;

use resource_watcher::dispatch::{MessageKind, QueueError, QueueMessage, Watcher};
use resource_watcher::watch::{HttpTransport, ReconnectingSource};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::common::{chunk, event_chunk, Reply, TestServer};

const INTERVAL: Duration = Duration::from_millis(50);

async fn recv(rx: &mut mpsc::Receiver<QueueMessage>) -> QueueMessage {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("queue closed")
}

#[tokio::test]
async fn added_event_becomes_add_resource_message() {
    let server = TestServer::start(vec![Reply::ok(chunk(
        r#"{"type":"ADDED","object":{"id":"svc-1"}}"#,
    ))])
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let source = ReconnectingSource::new(HttpTransport::new(), server.url.clone(), INTERVAL);
    let task = tokio::spawn(async move { Watcher::new(source, tx).run().await });

    let message = recv(&mut rx).await;
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({"message": "add-resource", "target": "svc-1", "resource": {"id": "svc-1"}})
    );

    task.abort();
}

#[tokio::test]
async fn unknown_types_skipped_and_stream_survives_reconnects() {
    let server = TestServer::start(vec![
        Reply::ok(format!(
            "{}{}{}",
            event_chunk("FOO", "ignored"),
            event_chunk("added", "a"),
            event_chunk("ERROR", "ignored"),
        )),
        Reply::status("502 Bad Gateway"),
        Reply::ok(format!(
            "{}{}",
            event_chunk("Modified", "a"),
            event_chunk("DELETED", "a"),
        )),
    ])
    .await;

    let (tx, mut rx) = mpsc::channel(16);
    let source = ReconnectingSource::new(HttpTransport::new(), server.url.clone(), INTERVAL);
    let task = tokio::spawn(async move { Watcher::new(source, tx).run().await });

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let message = recv(&mut rx).await;
        assert_eq!(message.target(), "a");
        assert_eq!(message.target(), message.resource().id());
        kinds.push(message.message());
    }

    assert_eq!(
        kinds,
        vec![
            MessageKind::AddResource,
            MessageKind::UpdateResource,
            MessageKind::DeleteResource,
        ]
    );

    task.abort();
}

#[tokio::test]
async fn run_returns_when_queue_closes() {
    let server = TestServer::start(vec![Reply::ok(event_chunk("ADDED", "a"))]).await;

    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let source = ReconnectingSource::new(HttpTransport::new(), server.url.clone(), INTERVAL);
    let mut watcher = Watcher::new(source, tx);

    let result = timeout(Duration::from_secs(5), watcher.run())
        .await
        .expect("run should stop once the queue is closed");
    assert_eq!(result, Err(QueueError::Closed));
}
