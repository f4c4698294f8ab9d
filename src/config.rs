//! Application configuration: an optional TOML file layered under `ACQ_*`
//! environment variables.
//!
//! ```toml
//! catalog_key = "ttb..."
//! recommendation_key = "..."
//! state_dir = ".acq"
//!
//! [fetch]
//! attempts_per_relay = 2
//! backoff_ms = 1000
//! timeout_secs = 30
//!
//! [[fetch.relays]]
//! kind = "query"
//! base = "https://api.allorigins.win/raw"
//! param = "url"
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `ACQ_FETCH__BACKOFF_MS=250`.

use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::FetchConfig;

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "acq.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ACQ";

/// Default directory for persisted settings and board.
pub const DEFAULT_STATE_DIR: &str = ".acq";

/// Errors raised while assembling configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read or values could not be deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Override for one upstream endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Replaces the public endpoint, e.g. for a local mirror.
    pub base_url: Option<String>,
}

/// Top-level configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog (bookstore API) credential.
    pub catalog_key: Option<String>,
    /// Recommendation feed credential.
    pub recommendation_key: Option<String>,
    /// Where settings.json and board.json live.
    pub state_dir: PathBuf,
    pub fetch: FetchConfig,
    pub catalog: EndpointConfig,
    pub recommendation: EndpointConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_key: None,
            recommendation_key: None,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            fetch: FetchConfig::default(),
            catalog: EndpointConfig::default(),
            recommendation: EndpointConfig::default(),
        }
    }
}

// Keys never reach logs or panic messages.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(key: &Option<String>) -> &'static str {
            if key.is_some() {
                "***"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("AppConfig")
            .field("catalog_key", &mask(&self.catalog_key))
            .field("recommendation_key", &mask(&self.recommendation_key))
            .field("state_dir", &self.state_dir)
            .field("fetch", &self.fetch)
            .field("catalog", &self.catalog)
            .field("recommendation", &self.recommendation)
            .finish()
    }
}

impl AppConfig {
    /// Load from `path` (required) or `acq.toml` (optional), then the environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> ConfigResult<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_string_lossy().into_owned(), true),
            None => (DEFAULT_CONFIG_FILE.to_string(), false),
        };

        let loaded: AppConfig = Config::builder()
            .add_source(File::new(&file, FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()
    }

    fn validate(self) -> ConfigResult<Self> {
        if self.fetch.attempts_per_relay == 0 {
            return Err(ConfigError::Invalid(
                "fetch.attempts_per_relay must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    /// Override the state directory.
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    /// Catalog key, trimmed; `None` when unset or blank.
    pub fn catalog_key(&self) -> Option<&str> {
        trimmed(&self.catalog_key)
    }

    /// Recommendation key, trimmed; `None` when unset or blank.
    pub fn recommendation_key(&self) -> Option<&str> {
        trimmed(&self.recommendation_key)
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RelayEndpoint;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("acq.toml");
        std::fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load_with_prefix(None, "ACQTEST_DEFAULTS").expect("load");
        assert_eq!(config.fetch, FetchConfig::default());
        assert_eq!(config.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
        assert!(config.catalog_key().is_none());
    }

    #[test]
    fn test_file_values() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = write_config(
            &temp_dir,
            r#"
catalog_key = "  ttb-secret  "
recommendation_key = "   "
state_dir = "/var/lib/acq"

[fetch]
attempts_per_relay = 3
backoff_ms = 10

[[fetch.relays]]
kind = "direct"

[catalog]
base_url = "http://localhost:9000/ttb/api"
"#,
        );

        let config = AppConfig::load_with_prefix(Some(&path), "ACQTEST_FILE").expect("load");
        assert_eq!(config.catalog_key(), Some("ttb-secret"));
        assert_eq!(config.recommendation_key(), None);
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/acq"));
        assert_eq!(config.fetch.attempts_per_relay, 3);
        assert_eq!(config.fetch.backoff_ms, 10);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.relays, vec![RelayEndpoint::Direct]);
        assert_eq!(
            config.catalog.base_url.as_deref(),
            Some("http://localhost:9000/ttb/api")
        );
        assert!(config.recommendation.base_url.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = write_config(&temp_dir, "catalog_key = \"from-file\"\n");
        std::env::set_var("ACQTEST_ENV_CATALOG_KEY", "from-env");
        std::env::set_var("ACQTEST_ENV_FETCH__BACKOFF_MS", "250");

        let config = AppConfig::load_with_prefix(Some(&path), "ACQTEST_ENV").expect("load");
        assert_eq!(config.catalog_key(), Some("from-env"));
        assert_eq!(config.fetch.backoff_ms, 250);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let missing = temp_dir.path().join("nope.toml");
        let err = AppConfig::load_with_prefix(Some(&missing), "ACQTEST_MISSING").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = write_config(&temp_dir, "[fetch]\nattempts_per_relay = 0\n");
        let err = AppConfig::load_with_prefix(Some(&path), "ACQTEST_ZERO").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_debug_masks_keys() {
        let config = AppConfig {
            catalog_key: Some("ttb-secret".to_string()),
            ..AppConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("ttb-secret"));
        assert!(rendered.contains("***"));
    }
}
