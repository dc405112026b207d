//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::provider::{
    DEFAULT_APP_DOMAIN, DEFAULT_APP_PROTOCOL, DEFAULT_CDN_API_BASE, DEFAULT_REQUEST_TIMEOUT,
};

pub use cli::{BustArgs, CliArgs, Command, GlobalOverrides, InvalidateArgs, PurgeArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "edgecache";
const ENV_PREFIX: &str = "EDGECACHE";
const DEFAULT_ESTABLISHED_YEAR: i32 = 2016;
const MIN_ESTABLISHED_YEAR: i32 = 1970;
const MAX_ESTABLISHED_YEAR: i32 = 9999;
const DEFAULT_AUTO_CONSUME_INTERVAL_MS: u64 = 5000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;
const DEFAULT_QUEUE_MAX_LEN: usize = 10_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub providers: ProviderSettings,
    pub timeframes: TimeframeSettings,
    pub queue: QueueSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// External cache layers. Blank credentials leave the provider disabled.
#[derive(Clone)]
pub struct ProviderSettings {
    pub fastly_api_key: Option<String>,
    pub fastly_service_id: Option<String>,
    pub fastly_api_base: String,
    pub nginx_url: Option<String>,
    pub app_domain: String,
    pub app_protocol: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("fastly_api_key", &self.fastly_api_key.as_ref().map(|_| "<redacted>"))
            .field("fastly_service_id", &self.fastly_service_id)
            .field("fastly_api_base", &self.fastly_api_base)
            .field("nginx_url", &self.nginx_url)
            .field("app_domain", &self.app_domain)
            .field("app_protocol", &self.app_protocol)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TimeframeSettings {
    pub community_established_year: i32,
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub auto_consume_interval_ms: u64,
    pub consume_batch_limit: usize,
    pub max_len: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    providers: RawProviderSettings,
    timeframes: RawTimeframeSettings,
    queue: RawQueueSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(key) = overrides.fastly_api_key.as_ref() {
            self.providers.fastly_api_key = Some(key.clone());
        }
        if let Some(id) = overrides.fastly_service_id.as_ref() {
            self.providers.fastly_service_id = Some(id.clone());
        }
        if let Some(url) = overrides.nginx_url.as_ref() {
            self.providers.nginx_url = Some(url.clone());
        }
        if let Some(domain) = overrides.app_domain.as_ref() {
            self.providers.app_domain = Some(domain.clone());
        }
        if let Some(timeout) = overrides.request_timeout_ms {
            self.providers.request_timeout_ms = Some(timeout);
        }
        if let Some(year) = overrides.established_year {
            self.timeframes.community_established_year = Some(year);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            providers,
            timeframes,
            queue,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            providers: build_provider_settings(providers)?,
            timeframes: build_timeframe_settings(timeframes)?,
            queue: build_queue_settings(queue)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_provider_settings(providers: RawProviderSettings) -> Result<ProviderSettings, LoadError> {
    let fastly_api_base = non_blank(providers.fastly_api_base)
        .unwrap_or_else(|| DEFAULT_CDN_API_BASE.to_string());
    url::Url::parse(&fastly_api_base).map_err(|err| {
        LoadError::invalid("providers.fastly_api_base", format!("invalid url: {err}"))
    })?;

    let nginx_url = non_blank(providers.nginx_url);
    if let Some(url) = nginx_url.as_deref() {
        url::Url::parse(url).map_err(|err| {
            LoadError::invalid("providers.nginx_url", format!("invalid url: {err}"))
        })?;
    }

    let app_protocol =
        non_blank(providers.app_protocol).unwrap_or_else(|| DEFAULT_APP_PROTOCOL.to_string());
    if !app_protocol.ends_with("://") {
        return Err(LoadError::invalid(
            "providers.app_protocol",
            "must end with `://`, e.g. `https://`",
        ));
    }

    let request_timeout = match providers.request_timeout_ms {
        Some(0) => {
            return Err(LoadError::invalid(
                "providers.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_REQUEST_TIMEOUT,
    };

    Ok(ProviderSettings {
        fastly_api_key: non_blank(providers.fastly_api_key),
        fastly_service_id: non_blank(providers.fastly_service_id),
        fastly_api_base,
        nginx_url,
        app_domain: non_blank(providers.app_domain)
            .unwrap_or_else(|| DEFAULT_APP_DOMAIN.to_string()),
        app_protocol,
        request_timeout,
    })
}

fn build_timeframe_settings(
    timeframes: RawTimeframeSettings,
) -> Result<TimeframeSettings, LoadError> {
    let year = timeframes
        .community_established_year
        .unwrap_or(DEFAULT_ESTABLISHED_YEAR);
    if !(MIN_ESTABLISHED_YEAR..=MAX_ESTABLISHED_YEAR).contains(&year) {
        return Err(LoadError::invalid(
            "timeframes.community_established_year",
            format!("must be between {MIN_ESTABLISHED_YEAR} and {MAX_ESTABLISHED_YEAR}"),
        ));
    }

    Ok(TimeframeSettings {
        community_established_year: year,
    })
}

fn build_queue_settings(queue: RawQueueSettings) -> Result<QueueSettings, LoadError> {
    let auto_consume_interval_ms = queue
        .auto_consume_interval_ms
        .unwrap_or(DEFAULT_AUTO_CONSUME_INTERVAL_MS);
    if auto_consume_interval_ms == 0 {
        return Err(LoadError::invalid(
            "queue.auto_consume_interval_ms",
            "must be greater than zero",
        ));
    }

    let consume_batch_limit = queue
        .consume_batch_limit
        .unwrap_or(DEFAULT_CONSUME_BATCH_LIMIT);
    if consume_batch_limit == 0 {
        return Err(LoadError::invalid(
            "queue.consume_batch_limit",
            "must be greater than zero",
        ));
    }

    let max_len = queue.max_len.unwrap_or(DEFAULT_QUEUE_MAX_LEN);
    if max_len == 0 {
        return Err(LoadError::invalid(
            "queue.max_len",
            "must be greater than zero",
        ));
    }

    Ok(QueueSettings {
        auto_consume_interval_ms,
        consume_batch_limit,
        max_len,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawProviderSettings {
    fastly_api_key: Option<String>,
    fastly_service_id: Option<String>,
    fastly_api_base: Option<String>,
    nginx_url: Option<String>,
    app_domain: Option<String>,
    app_protocol: Option<String>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTimeframeSettings {
    community_established_year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQueueSettings {
    auto_consume_interval_ms: Option<u64>,
    consume_batch_limit: Option<usize>,
    max_len: Option<usize>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
