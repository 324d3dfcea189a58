//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Configuration for a resource watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Base URL of the orchestrator API server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Resource collection to watch.
    #[serde(default = "default_resource")]
    pub resource: String,
    /// Fixed delay between reconnect attempts, in seconds.
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_version() -> String {
    "v1beta1".to_string()
}

fn default_resource() -> String {
    "services".to_string()
}

fn default_reconnect_interval_secs() -> u64 {
    5
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            resource: default_resource(),
            reconnect_interval_secs: default_reconnect_interval_secs(),
        }
    }
}

impl WatcherConfig {
    /// Check the values that cannot be expressed by the types alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a zero reconnect interval or an
    /// empty path segment, and `ConfigError::InvalidEndpoint` if the
    /// endpoint is not a URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reconnect_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Invalid("api_version is empty".to_string()));
        }
        if self.resource.trim().is_empty() {
            return Err(ConfigError::Invalid("resource is empty".to_string()));
        }
        self.watch_url().map(|_| ())
    }

    /// The reconnect interval as a `Duration`.
    #[must_use]
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }

    /// Build `{endpoint}/api/{api_version}/watch/{resource}`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEndpoint` if the result is not a valid URL.
    pub fn watch_url(&self) -> Result<Url, ConfigError> {
        let raw = format!(
            "{}/api/{}/watch/{}",
            self.endpoint.trim_end_matches('/'),
            self.api_version.trim_matches('/'),
            self.resource.trim_matches('/'),
        );
        Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}
