//! Fetcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::relay::{default_relays, RelayEndpoint};

/// Default number of attempts per relay.
pub const DEFAULT_ATTEMPTS_PER_RELAY: u32 = 2;

/// Default fixed wait between attempts (milliseconds).
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;

/// Default per-request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the resilient fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Relays tried in order.
    pub relays: Vec<RelayEndpoint>,
    /// Requests issued per relay before moving to the next one.
    pub attempts_per_relay: u32,
    /// Fixed wait after a failed attempt.
    pub backoff_ms: u64,
    /// Timeout applied to each individual request.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            relays: default_relays(),
            attempts_per_relay: DEFAULT_ATTEMPTS_PER_RELAY,
            backoff_ms: DEFAULT_BACKOFF_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl FetchConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the relay list.
    pub fn with_relays(mut self, relays: Vec<RelayEndpoint>) -> Self {
        self.relays = relays;
        self
    }

    /// Set attempts per relay (at least one).
    pub fn with_attempts_per_relay(mut self, attempts: u32) -> Self {
        self.attempts_per_relay = attempts.max(1);
        self
    }

    /// Set the wait between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Upper bound on requests a single fetch may issue.
    pub fn max_attempts(&self) -> u32 {
        self.relays.len() as u32 * self.attempts_per_relay.max(1)
    }
}
