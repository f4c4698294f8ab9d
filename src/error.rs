//! Error taxonomy for ingestion.
//!
//! Four failure families reach the caller:
//! - [`FetchFailure`]: every relay and attempt was exhausted
//! - [`AcquisitionError::Source`]: the upstream answered but flagged an API error
//! - [`AcquisitionError::Decode`]: a retrieved body could not be decoded
//! - [`AcquisitionError::Configuration`]: a required credential is missing
//!
//! The budget engine has no error type; it degrades arithmetically instead.

use thiserror::Error;

/// The failure observed on a single relay attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The relay answered with a non-success HTTP status.
    #[error("HTTP error: {0}")]
    Status(u16),
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// A success response whose body could not be read or decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// No relay endpoints were configured, so nothing was attempted.
    #[error("network error: failed to fetch data from all relays")]
    NoRelays,
}

/// Raised by the fetcher once all relays and attempts are exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fetch failed after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    /// Total number of requests issued across all relays.
    pub attempts: u32,
    /// The last error observed before giving up.
    pub last_error: AttemptError,
}

/// Errors surfaced by the source adapters and the service facade.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Network/transport exhaustion.
    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    /// The upstream API signaled an application-level error.
    #[error("{source_name} error ({code}): {message}")]
    Source {
        source_name: String,
        code: String,
        message: String,
    },

    /// A body was retrieved but is not valid JSON.
    #[error("undecodable payload: {0}")]
    Decode(String),

    /// A credential required by the requested source is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for ingestion operations.
pub type AcquisitionResult<T> = Result<T, AcquisitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_carries_last_error() {
        let failure = FetchFailure {
            attempts: 4,
            last_error: AttemptError::Status(503),
        };
        assert_eq!(
            failure.to_string(),
            "fetch failed after 4 attempt(s): HTTP error: 503"
        );
    }

    #[test]
    fn test_attempt_error_messages() {
        assert_eq!(AttemptError::Status(404).to_string(), "HTTP error: 404");
        assert_eq!(
            AttemptError::Transport("timed out".to_string()).to_string(),
            "transport error: timed out"
        );
        assert_eq!(
            AttemptError::Decode("expected value".to_string()).to_string(),
            "decode error: expected value"
        );
        assert_eq!(
            AttemptError::NoRelays.to_string(),
            "network error: failed to fetch data from all relays"
        );
    }

    #[test]
    fn test_fetch_failure_converts_unmodified() {
        let failure = FetchFailure {
            attempts: 2,
            last_error: AttemptError::Transport("connection refused".to_string()),
        };
        let err: AcquisitionError = failure.clone().into();
        match err {
            AcquisitionError::Fetch(inner) => assert_eq!(inner, failure),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_source_error_message() {
        let err = AcquisitionError::Source {
            source_name: "catalog".to_string(),
            code: "100".to_string(),
            message: "invalid key".to_string(),
        };
        assert_eq!(err.to_string(), "catalog error (100): invalid key");
    }
}
