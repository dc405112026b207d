//! Reverse-proxy adapter: `PURGE {base_url}{path}`.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::cache::keys::PathTarget;

use super::{ProviderAdapter, ProviderConfig, ProviderError, check_status, purge_method};

const NAME: &str = "proxy";

pub struct ReverseProxyAdapter {
    client: Client,
    base_url: Option<String>,
}

impl ReverseProxyAdapter {
    pub fn new(config: &ProviderConfig, client: Client) -> Self {
        let base_url = config
            .proxy_configured()
            .then(|| config.proxy_url.clone().unwrap_or_default())
            .map(|url| url.trim().trim_end_matches('/').to_string());

        Self { client, base_url }
    }

    fn purge_url(&self, path: &PathTarget) -> Result<Url, ProviderError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(ProviderError::Unconfigured { provider: NAME })?;
        Url::parse(&format!("{base}{path}")).map_err(|source| ProviderError::InvalidUrl {
            provider: NAME,
            source,
        })
    }
}

#[async_trait]
impl ProviderAdapter for ReverseProxyAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn purge_path(&self, path: &PathTarget) -> Result<(), ProviderError> {
        let url = self.purge_url(path)?;
        debug!(provider = NAME, %url, "Purging URL");

        let response = self
            .client
            .request(purge_method(), url)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: NAME,
                source,
            })?;

        check_status(NAME, response.status())
    }
}
