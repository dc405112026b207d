//! Provider configuration.
//!
//! Built once from the resolved settings and handed to adapters at
//! construction. A provider whose fields are incomplete is disabled.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_CDN_API_BASE: &str = "https://api.fastly.com";
pub const DEFAULT_APP_DOMAIN: &str = "localhost:3000";
pub const DEFAULT_APP_PROTOCOL: &str = "https://";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct ProviderConfig {
    /// CDN API credential.
    pub cdn_api_key: Option<String>,
    /// CDN service identifier.
    pub cdn_service_id: Option<String>,
    /// Base URL of the CDN API.
    pub cdn_api_base: String,
    /// Base URL of the reverse proxy purge endpoint.
    pub proxy_url: Option<String>,
    /// Public host the CDN caches pages under, e.g. `dev.to`.
    pub app_domain: String,
    /// Scheme prefix for `app_domain`, e.g. `https://`.
    pub app_protocol: String,
    pub request_timeout: Duration,
}

impl ProviderConfig {
    /// Both providers disabled.
    pub fn disabled() -> Self {
        Self {
            cdn_api_key: None,
            cdn_service_id: None,
            cdn_api_base: DEFAULT_CDN_API_BASE.to_string(),
            proxy_url: None,
            app_domain: DEFAULT_APP_DOMAIN.to_string(),
            app_protocol: DEFAULT_APP_PROTOCOL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn cdn_configured(&self) -> bool {
        present(self.cdn_api_key.as_deref()) && present(self.cdn_service_id.as_deref())
    }

    pub fn proxy_configured(&self) -> bool {
        present(self.proxy_url.as_deref())
    }

    /// Origin the CDN caches public pages under.
    pub fn site_origin(&self) -> String {
        format!("{}{}", self.app_protocol, self.app_domain.trim_end_matches('/'))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("cdn_api_key", &self.cdn_api_key.as_ref().map(|_| "<redacted>"))
            .field("cdn_service_id", &self.cdn_service_id)
            .field("cdn_api_base", &self.cdn_api_base)
            .field("proxy_url", &self.proxy_url)
            .field("app_domain", &self.app_domain)
            .field("app_protocol", &self.app_protocol)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl From<&crate::config::ProviderSettings> for ProviderConfig {
    fn from(settings: &crate::config::ProviderSettings) -> Self {
        Self {
            cdn_api_key: settings.fastly_api_key.clone(),
            cdn_service_id: settings.fastly_service_id.clone(),
            cdn_api_base: settings.fastly_api_base.clone(),
            proxy_url: settings.nginx_url.clone(),
            app_domain: settings.app_domain.clone(),
            app_protocol: settings.app_protocol.clone(),
            request_timeout: settings.request_timeout,
        }
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}
