//! Dispatch of change events onto the egress queue.

mod queue;
mod watcher;

pub use queue::{EgressQueue, MessageKind, QueueError, QueueMessage};
pub use watcher::Watcher;
