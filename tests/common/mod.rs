//! Shared helpers: chunk encoding and a throwaway HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

/// Encode one payload the way the watch endpoint frames it.
pub fn chunk(payload: &str) -> String {
    format!("{:x}\r\n{payload}\n\r\n", payload.len() + 1)
}

/// Encode an event with the given change type and resource id.
pub fn event_chunk(change: &str, id: &str) -> String {
    chunk(&format!(
        r#"{{"type":"{change}","object":{{"id":"{id}","kind":"Service"}}}}"#
    ))
}

/// A canned HTTP response for one connection.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: &'static str,
    pub body: String,
}

impl Reply {
    pub fn ok(body: String) -> Self {
        Self {
            status: "200 OK",
            body,
        }
    }

    pub fn status(status: &'static str) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Local HTTP server answering each connection with the next reply, then
/// closing it. Once the replies run out every request gets a 503.
pub struct TestServer {
    pub url: Url,
    connections: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);

        tokio::spawn(async move {
            let mut replies = replies.into_iter();
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = replies
                    .next()
                    .unwrap_or_else(|| Reply::status("503 Service Unavailable"));

                let mut stream = BufReader::new(stream);
                let mut line = String::new();
                loop {
                    line.clear();
                    if stream.read_line(&mut line).await.unwrap_or(0) == 0 || line == "\r\n" {
                        break;
                    }
                }

                let head = if reply.status.starts_with('2') {
                    format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n",
                        reply.status
                    )
                } else {
                    format!("HTTP/1.1 {}\r\nContent-Length: 0\r\n\r\n", reply.status)
                };
                let stream = stream.get_mut();
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(reply.body.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            url: Url::parse(&format!("http://{addr}/api/v1beta1/watch/services")).unwrap(),
            connections,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}
