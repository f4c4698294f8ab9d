//! Relay endpoint builders.
//!
//! A relay wraps the real target URL in another URL that forwards the
//! request. Each variant is one indirection scheme.

use serde::{Deserialize, Serialize};

/// One relay endpoint in the fallback list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayEndpoint {
    /// `<base>?<param>=<encoded target>`
    Query { base: String, param: String },
    /// `<base><encoded target>`
    Prefix { base: String },
    /// The target URL unchanged.
    Direct,
}

impl RelayEndpoint {
    /// Relay that passes the target as a named query parameter.
    pub fn query(base: impl Into<String>, param: impl Into<String>) -> Self {
        RelayEndpoint::Query {
            base: base.into(),
            param: param.into(),
        }
    }

    /// Relay that appends the encoded target to a fixed prefix.
    pub fn prefix(base: impl Into<String>) -> Self {
        RelayEndpoint::Prefix { base: base.into() }
    }

    /// Wrap `target_url` according to this relay's scheme.
    pub fn wrap(&self, target_url: &str) -> String {
        match self {
            RelayEndpoint::Query { base, param } => {
                let sep = if base.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}{}={}",
                    base,
                    sep,
                    param,
                    urlencoding::encode(target_url)
                )
            }
            RelayEndpoint::Prefix { base } => {
                format!("{}{}", base, urlencoding::encode(target_url))
            }
            RelayEndpoint::Direct => target_url.to_string(),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            RelayEndpoint::Query { base, .. } | RelayEndpoint::Prefix { base } => base,
            RelayEndpoint::Direct => "direct",
        }
    }
}

/// The public relays used when nothing else is configured.
pub fn default_relays() -> Vec<RelayEndpoint> {
    vec![
        RelayEndpoint::query("https://api.allorigins.win/raw", "url"),
        RelayEndpoint::prefix("https://corsproxy.io/?"),
    ]
}
