//! Reconnecting event source.
//!
//! Wraps [`StreamReader`] in an unbounded retry loop with a fixed backoff:
//!
//! ```text
//! Connecting --ok--> Streaming --error / clean close--> Backoff --sleep--> Connecting
//!     |                                                    ^
//!     +------------------------error-----------------------+
//! ```
//!
//! There is no terminal state. A clean close of the watch stream is handled
//! exactly like an error.

use std::time::Duration;

use futures_core::Stream;
use url::Url;

use super::error::WatchError;
use super::events::ChangeEvent;
use super::reader::StreamReader;
use super::transport::WatchTransport;

/// Connection state of a [`ReconnectingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// About to open a new connection.
    Connecting,
    /// Reading events from an open connection.
    Streaming,
    /// Waiting out the reconnect interval.
    Backoff,
}

/// Infinite, never-failing sequence of change events.
#[derive(Debug)]
pub struct ReconnectingSource<T> {
    transport: T,
    url: Url,
    interval: Duration,
    state: SourceState,
    reader: Option<StreamReader>,
    attempts: u64,
}

impl<T: WatchTransport> ReconnectingSource<T> {
    /// Create a source. No connection is made until the first pull.
    #[must_use]
    pub fn new(transport: T, url: Url, interval: Duration) -> Self {
        Self {
            transport,
            url,
            interval,
            state: SourceState::Connecting,
            reader: None,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Number of connection attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Pull the next event, reconnecting as often as needed.
    pub async fn next_event(&mut self) -> ChangeEvent {
        loop {
            match self.state {
                SourceState::Connecting => self.connect().await,
                SourceState::Streaming => {
                    if let Some(event) = self.read().await {
                        return event;
                    }
                }
                SourceState::Backoff => {
                    tracing::debug!(
                        interval_secs = self.interval.as_secs_f64(),
                        "Waiting before reconnect"
                    );
                    tokio::time::sleep(self.interval).await;
                    self.state = SourceState::Connecting;
                }
            }
        }
    }

    /// Turn the source into an endless stream.
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> {
        futures_util::stream::unfold(self, |mut source| async move {
            let event = source.next_event().await;
            Some((event, source))
        })
    }

    async fn connect(&mut self) {
        self.attempts += 1;
        tracing::info!(url = %self.url, attempt = self.attempts, "Connecting to watch stream");

        match StreamReader::connect(&self.transport, &self.url).await {
            Ok(reader) => {
                self.reader = Some(reader);
                self.state = SourceState::Streaming;
            }
            Err(e) => self.fail(&e),
        }
    }

    async fn read(&mut self) -> Option<ChangeEvent> {
        let Some(reader) = self.reader.as_mut() else {
            self.state = SourceState::Backoff;
            return None;
        };

        match reader.next_event().await {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                tracing::warn!(
                    url = %self.url,
                    events = reader.events_read(),
                    "Watch stream closed"
                );
                self.reader = None;
                self.state = SourceState::Backoff;
                None
            }
            Err(e) => {
                self.reader = None;
                self.fail(&e);
                None
            }
        }
    }

    fn fail(&mut self, error: &WatchError) {
        tracing::error!(
            url = %self.url,
            kind = ?error.kind(),
            error = %error,
            "Connection failed"
        );
        self.state = SourceState::Backoff;
    }
}
