//! Queue messages and the egress queue seam.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::watch::{ChangeEvent, ChangeType, Resource};

/// Kind of work a queue message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    AddResource,
    DeleteResource,
    UpdateResource,
}

impl MessageKind {
    /// Map a change type to a message kind. Unknown types have none.
    #[must_use]
    pub fn for_change(change: &ChangeType) -> Option<Self> {
        match change {
            ChangeType::Added => Some(Self::AddResource),
            ChangeType::Deleted => Some(Self::DeleteResource),
            ChangeType::Modified => Some(Self::UpdateResource),
            ChangeType::Unknown(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddResource => "add-resource",
            Self::DeleteResource => "delete-resource",
            Self::UpdateResource => "update-resource",
        }
    }
}

/// Message pushed onto the egress queue.
///
/// `target` is always the id of `resource`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMessage {
    message: MessageKind,
    target: String,
    resource: Resource,
}

impl QueueMessage {
    /// Build a message for a resource.
    #[must_use]
    pub fn new(message: MessageKind, resource: Resource) -> Self {
        Self {
            message,
            target: resource.id().to_string(),
            resource,
        }
    }

    /// Translate a change event, or `None` for unknown change types.
    #[must_use]
    pub fn from_event(event: ChangeEvent) -> Option<Self> {
        let kind = MessageKind::for_change(&event.change_type)?;
        Some(Self::new(kind, event.resource))
    }

    #[must_use]
    pub fn message(&self) -> MessageKind {
        self.message
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// Errors reported by an egress queue.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Every consumer of the queue has gone away.
    #[error("Egress queue closed")]
    Closed,
}

/// Destination for queue messages.
///
/// Implementations must tolerate concurrent producers; the watcher does no
/// locking of its own.
#[async_trait]
pub trait EgressQueue: Send + Sync {
    /// Push one message, waiting if the queue applies backpressure.
    async fn push(&self, message: QueueMessage) -> Result<(), QueueError>;
}

#[async_trait]
impl EgressQueue for mpsc::Sender<QueueMessage> {
    async fn push(&self, message: QueueMessage) -> Result<(), QueueError> {
        self.send(message).await.map_err(|_| QueueError::Closed)
    }
}

#[async_trait]
impl EgressQueue for mpsc::UnboundedSender<QueueMessage> {
    async fn push(&self, message: QueueMessage) -> Result<(), QueueError> {
        self.send(message).map_err(|_| QueueError::Closed)
    }
}
