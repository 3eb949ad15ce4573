//! Resolution-related client options.
//!
//! Only the options that influence contact-point resolution and bootstrap
//! live here; loading them from a file is left to the embedding client.
//! With the `json` feature, [`ResolutionConfig::from_json`] accepts the
//! kebab-case keys used by driver configuration files.

use crate::session::retry::RetryConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Options consumed once when a session starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResolutionConfig {
    /// Resolve hostname contact points eagerly (default: true)
    pub resolve_contact_points: bool,
    /// Retry the first connection when every contact point fails (default: false)
    pub reconnect_on_init: bool,
    /// Raw `host:port` contact points, in preference order
    pub contact_points: Vec<String>,
    /// Upper bound for one resolver call in milliseconds (default: 5000, 0 means default)
    pub resolve_timeout_ms: u64,
    /// Upper bound for one connection attempt in milliseconds (default: 5000, 0 means default)
    pub connect_timeout_ms: u64,
    /// Backoff schedule used when `reconnect_on_init` is set
    pub reconnection: RetryConfig,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            resolve_contact_points: true,
            reconnect_on_init: false,
            contact_points: Vec::new(),
            resolve_timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            reconnection: RetryConfig::default(),
        }
    }
}

impl ResolutionConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable eager contact point resolution.
    pub fn resolve_contact_points(mut self, enabled: bool) -> Self {
        self.resolve_contact_points = enabled;
        self
    }

    /// Enable or disable retries of the initial connection.
    pub fn reconnect_on_init(mut self, enabled: bool) -> Self {
        self.reconnect_on_init = enabled;
        self
    }

    /// Replace the contact point list.
    pub fn contact_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contact_points = points.into_iter().map(Into::into).collect();
        self
    }

    /// Append one contact point.
    pub fn add_contact_point(mut self, point: impl Into<String>) -> Self {
        self.contact_points.push(point.into());
        self
    }

    /// Set the per-lookup timeout.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the per-connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the reconnect-on-init schedule.
    pub fn reconnection(mut self, retry: RetryConfig) -> Self {
        self.reconnection = retry;
        self
    }

    pub fn resolve_timeout_duration(&self) -> Duration {
        timeout_or_default("resolve-timeout-ms", self.resolve_timeout_ms)
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        timeout_or_default("connect-timeout-ms", self.connect_timeout_ms)
    }

    /// Parse a config from JSON. Missing keys keep their defaults.
    #[cfg(feature = "json")]
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

fn saturating_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

// A zero bound would fail every lookup and connect on the spot.
fn timeout_or_default(option: &str, ms: u64) -> Duration {
    if ms == 0 {
        warn!(option, default_ms = DEFAULT_TIMEOUT_MS, "zero timeout configured, using default");
        return Duration::from_millis(DEFAULT_TIMEOUT_MS);
    }
    Duration::from_millis(ms)
}
