//! Cache providers.
//!
//! An adapter wraps one external cache layer. Adapters report whether they
//! are configured; an unconfigured adapter is skipped without a network call
//! or a log line.

mod cdn;
mod config;
mod proxy;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;

use super::keys::{KeyTarget, PathTarget};

pub use cdn::KeyedCdnAdapter;
pub use config::{
    DEFAULT_APP_DOMAIN, DEFAULT_APP_PROTOCOL, DEFAULT_CDN_API_BASE, DEFAULT_REQUEST_TIMEOUT,
    ProviderConfig,
};
pub use proxy::ReverseProxyAdapter;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured")]
    Unconfigured { provider: &'static str },
    #[error("{provider} purge url is invalid: {source}")]
    InvalidUrl {
        provider: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{provider} purge request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} purge returned status {status}")]
    Status {
        provider: &'static str,
        status: StatusCode,
    },
    #[error("{provider} panicked during purge")]
    Panicked { provider: &'static str },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Unconfigured { provider }
            | ProviderError::InvalidUrl { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::Panicked { provider } => provider,
        }
    }
}

/// A cache layer that can purge by URL path.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    async fn purge_path(&self, path: &PathTarget) -> Result<(), ProviderError>;
}

/// A cache layer that can additionally purge by surrogate key.
#[async_trait]
pub trait KeyedProvider: ProviderAdapter {
    async fn purge_key(&self, key: &KeyTarget) -> Result<(), ProviderError>;
}

/// Shared HTTP client with a bounded per-request timeout.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("edgecache/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

/// HTTP `PURGE`, understood by both the CDN edge and the proxy cache module.
fn purge_method() -> Method {
    // Valid token; the fallback is unreachable.
    Method::from_bytes(b"PURGE").unwrap_or(Method::POST)
}

/// Maps a purge response status to the adapter result.
///
/// A missing entry means the target is already not cached.
fn check_status(provider: &'static str, status: StatusCode) -> Result<(), ProviderError> {
    if status.is_success() || status == StatusCode::NOT_FOUND {
        Ok(())
    } else {
        Err(ProviderError::Status { provider, status })
    }
}
