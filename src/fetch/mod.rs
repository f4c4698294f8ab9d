//! Outbound retrieval through relay endpoints.
//!
//! # Overview
//!
//! - **RelayEndpoint**: wraps a target URL in one indirection scheme
//! - **FetchConfig**: relay order, attempts per relay, backoff, timeout
//! - **ResilientFetcher**: the sequential relay/attempt loop over `reqwest`
//! - **PayloadFetcher**: the seam the source adapters depend on
//!
//! # Example
//!
//! ```ignore
//! use acquisition_engine::fetch::{FetchConfig, PayloadFetcher, ResilientFetcher};
//!
//! let fetcher = ResilientFetcher::new(FetchConfig::default());
//! let body = fetcher.fetch_json("https://www.aladin.co.kr/ttb/api/ItemList.aspx?...").await?;
//! ```

mod client;
mod config;
mod relay;

pub use client::{PayloadFetcher, PayloadKind, RawPayload, ResilientFetcher};
pub use config::{FetchConfig, DEFAULT_ATTEMPTS_PER_RELAY, DEFAULT_BACKOFF_MS};
pub use relay::{default_relays, RelayEndpoint};

use reqwest::Url;

/// Query parameters that carry credentials.
const SECRET_PARAMS: &[&str] = &["ttbkey", "key"];

/// Mask credential query parameters so a URL can be logged.
///
/// Names are compared after percent-decoding. A URL that does not parse
/// loses its whole query string.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.split('?').next().unwrap_or_default().to_string();
    };
    if parsed.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(name, value)| {
            let value = if SECRET_PARAMS.contains(&name.as_ref()) {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.into()
}
