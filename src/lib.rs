//! Resource Watcher - republishes orchestrator watch events onto a work queue.

pub mod config;
pub mod dispatch;
pub mod watch;
