//! Resilient fetcher: ordered relay fallback with fixed-interval retries.
//!
//! Relays are tried strictly in sequence, never raced, so a paid relay is
//! never billed for a duplicate request. Within one relay a failed attempt
//! (non-success status, transport error, or undecodable body) waits a fixed
//! backoff and retries until the per-relay attempt budget is spent.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::FetchConfig;
use super::redact_url;
use crate::error::{AcquisitionError, AcquisitionResult, AttemptError, FetchFailure};

/// How the caller wants the successful body handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Text,
}

/// A successfully retrieved body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Json(Value),
    Text(String),
}

/// Anything that can retrieve a payload for a target URL.
///
/// Source adapters depend on this trait rather than on the HTTP client, so
/// they can be driven by canned payloads in tests.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    /// Retrieve `target_url`, failing only once every option is exhausted.
    async fn fetch(&self, target_url: &str, kind: PayloadKind) -> Result<RawPayload, FetchFailure>;

    /// Retrieve and return structured JSON.
    ///
    /// A fetcher may hand back text for a JSON request. That body is decoded
    /// here, after retrieval has already succeeded, so a bad body is reported
    /// as [`AcquisitionError::Decode`] rather than as a failed attempt.
    async fn fetch_json(&self, target_url: &str) -> AcquisitionResult<Value> {
        match self.fetch(target_url, PayloadKind::Json).await? {
            RawPayload::Json(value) => Ok(value),
            RawPayload::Text(text) => serde_json::from_str(&text)
                .map_err(|e| AcquisitionError::Decode(e.to_string())),
        }
    }

    /// Retrieve and return the raw body text.
    async fn fetch_text(&self, target_url: &str) -> Result<String, FetchFailure> {
        match self.fetch(target_url, PayloadKind::Text).await? {
            RawPayload::Text(text) => Ok(text),
            RawPayload::Json(value) => Ok(value.to_string()),
        }
    }
}

/// HTTP implementation of [`PayloadFetcher`] over a list of relays.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ResilientFetcher {
    /// Create a fetcher for the given relay configuration.
    pub fn new(config: FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("acq/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Issue one request and decode the body.
    async fn attempt(&self, url: &str, kind: PayloadKind) -> Result<RawPayload, AttemptError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = resp.status();
        debug!(status = status.as_u16(), "relay responded");
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| AttemptError::Decode(e.to_string()))?;

        match kind {
            PayloadKind::Json => serde_json::from_str(text.trim_start_matches('\u{feff}'))
                .map(RawPayload::Json)
                .map_err(|e| AttemptError::Decode(e.to_string())),
            PayloadKind::Text => {
                debug!(
                    preview = %text.chars().take(100).collect::<String>(),
                    "received text payload"
                );
                Ok(RawPayload::Text(text))
            }
        }
    }
}

#[async_trait]
impl PayloadFetcher for ResilientFetcher {
    async fn fetch(&self, target_url: &str, kind: PayloadKind) -> Result<RawPayload, FetchFailure> {
        let per_relay = self.config.attempts_per_relay.max(1);
        let max_attempts = self.config.max_attempts();
        let target = redact_url(target_url);

        let mut attempts = 0u32;
        let mut last_error = AttemptError::NoRelays;

        for relay in &self.config.relays {
            let url = relay.wrap(target_url);

            for attempt in 1..=per_relay {
                attempts += 1;
                debug!(relay = relay.label(), attempt, target = %target, "fetching");

                match self.attempt(&url, kind).await {
                    Ok(payload) => return Ok(payload),
                    Err(err) => {
                        warn!(
                            relay = relay.label(),
                            attempt,
                            error = %err,
                            "relay attempt failed"
                        );
                        last_error = err;
                        if attempts < max_attempts {
                            tokio::time::sleep(self.config.backoff()).await;
                        }
                    }
                }
            }

            info!(relay = relay.label(), "relay exhausted, falling back");
        }

        Err(FetchFailure {
            attempts,
            last_error,
        })
    }
}
