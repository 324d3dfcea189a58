//! Watcher dispatcher: the process main loop.

use crate::watch::{ChangeEvent, ReconnectingSource, WatchTransport};

use super::queue::{EgressQueue, QueueError, QueueMessage};

/// Pulls change events forever and republishes them onto the egress queue.
///
/// Holds its configuration through the source and its output through the
/// queue handle; meant to be spawned on its own task by the caller.
#[derive(Debug)]
pub struct Watcher<T, Q> {
    source: ReconnectingSource<T>,
    queue: Q,
    dispatched: u64,
    skipped: u64,
}

impl<T, Q> Watcher<T, Q>
where
    T: WatchTransport,
    Q: EgressQueue,
{
    #[must_use]
    pub fn new(source: ReconnectingSource<T>, queue: Q) -> Self {
        Self {
            source,
            queue,
            dispatched: 0,
            skipped: 0,
        }
    }

    /// Number of messages pushed so far.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Number of events skipped for an unknown change type.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Run until the queue closes.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Closed` once nothing consumes the queue anymore.
    /// Stream failures never surface here.
    pub async fn run(&mut self) -> Result<(), QueueError> {
        loop {
            let event = self.source.next_event().await;
            self.dispatch(event).await?;
        }
    }

    /// Translate one event and push it. Returns whether a message was sent.
    ///
    /// # Errors
    ///
    /// Returns the queue's error if the push fails.
    pub async fn dispatch(&mut self, event: ChangeEvent) -> Result<bool, QueueError> {
        tracing::debug!(
            change = %event.change_type,
            id = %event.resource.id(),
            "Received event"
        );

        let change = event.change_type.clone();
        let Some(message) = QueueMessage::from_event(event) else {
            // New change types are expected over time; not an error.
            tracing::debug!(change = %change, "Skipping unknown event type");
            self.skipped += 1;
            return Ok(false);
        };

        self.queue.push(message).await?;
        self.dispatched += 1;
        Ok(true)
    }
}
