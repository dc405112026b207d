//! Keyed CDN adapter.
//!
//! Purges surrogate keys through the CDN API (`POST
//! /service/{service_id}/purge/{key}`, one call per key, hard purge) and
//! single URLs with a `PURGE` request against the public origin.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::cache::keys::{KeyTarget, PathTarget};

use super::{
    KeyedProvider, ProviderAdapter, ProviderConfig, ProviderError, check_status, purge_method,
};

const NAME: &str = "cdn";
const API_KEY_HEADER: &str = "Fastly-Key";
const SOFT_PURGE_HEADER: &str = "Fastly-Soft-Purge";
/// Hard invalidation: the next request always goes to the origin.
const SOFT_PURGE: bool = false;

#[derive(Clone)]
struct Credentials {
    api_key: String,
    service_id: String,
}

pub struct KeyedCdnAdapter {
    client: Client,
    credentials: Option<Credentials>,
    api_base: String,
    site_origin: String,
}

impl KeyedCdnAdapter {
    pub fn new(config: &ProviderConfig, client: Client) -> Self {
        let credentials = config.cdn_configured().then(|| Credentials {
            api_key: config.cdn_api_key.clone().unwrap_or_default().trim().to_string(),
            service_id: config
                .cdn_service_id
                .clone()
                .unwrap_or_default()
                .trim()
                .to_string(),
        });

        Self {
            client,
            credentials,
            api_base: config.cdn_api_base.clone(),
            site_origin: config.site_origin(),
        }
    }

    fn credentials(&self) -> Result<&Credentials, ProviderError> {
        self.credentials
            .as_ref()
            .ok_or(ProviderError::Unconfigured { provider: NAME })
    }

    fn key_url(&self, service_id: &str, key: &KeyTarget) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.api_base).map_err(|source| ProviderError::InvalidUrl {
            provider: NAME,
            source,
        })?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl {
                provider: NAME,
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(["service", service_id, "purge", key.as_str()]);
        Ok(url)
    }

    /// Public URL of `path`; the host is always the configured origin.
    fn page_url(&self, path: &PathTarget) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.site_origin).map_err(|source| ProviderError::InvalidUrl {
            provider: NAME,
            source,
        })?;
        let (path, query) = match path.as_str().split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path.as_str(), None),
        };
        url.set_path(path);
        url.set_query(query);
        Ok(url)
    }
}

#[async_trait]
impl ProviderAdapter for KeyedCdnAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn purge_path(&self, path: &PathTarget) -> Result<(), ProviderError> {
        let credentials = self.credentials()?;
        let url = self.page_url(path)?;
        debug!(provider = NAME, %url, "Purging URL");

        let response = self
            .client
            .request(purge_method(), url)
            .header(API_KEY_HEADER, &credentials.api_key)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: NAME,
                source,
            })?;

        check_status(NAME, response.status())
    }
}

#[async_trait]
impl KeyedProvider for KeyedCdnAdapter {
    async fn purge_key(&self, key: &KeyTarget) -> Result<(), ProviderError> {
        let credentials = self.credentials()?;
        let url = self.key_url(&credentials.service_id, key)?;
        debug!(provider = NAME, %key, "Purging surrogate key");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &credentials.api_key)
            .header(SOFT_PURGE_HEADER, if SOFT_PURGE { "1" } else { "0" })
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: NAME,
                source,
            })?;

        check_status(NAME, response.status())
    }
}
