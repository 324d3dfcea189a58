//! Dispatcher tests.

mod watcher_test;
