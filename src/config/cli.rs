use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the edgecache binary.
#[derive(Debug, Parser)]
#[command(name = "edgecache", version, about = "Edge cache invalidation tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "EDGECACHE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Bust URL paths on every configured provider.
    Bust(BustArgs),
    /// Purge surrogate keys, falling back to paths without a keyed provider.
    Purge(PurgeArgs),
    /// Plan and execute the invalidation for a changed record (JSON).
    Invalidate(InvalidateArgs),
    /// Print the current time-window boundaries.
    Timeframes,
}

#[derive(Debug, Args, Clone)]
pub struct BustArgs {
    /// Paths to bust, e.g. `/about`.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// Skip the `?i=i` variant of each path.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub exact: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PurgeArgs {
    /// Surrogate keys, e.g. `articles/42`.
    #[arg(value_name = "KEY", required = true)]
    pub keys: Vec<String>,

    /// Path to bust instead when the keyed provider is not configured.
    #[arg(long = "fallback", value_name = "PATH")]
    pub fallbacks: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct InvalidateArgs {
    /// JSON file holding `{"kind": ..., "entity": {...}}`; `-` reads stdin.
    /// With `--defer` it may also hold an array of such documents.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath, default_value = "-")]
    pub input: PathBuf,

    /// Print the planned request without contacting any provider.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Queue every document, then drain the queue in merged batches.
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "dry_run")]
    pub defer: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the CDN API key.
    #[arg(long = "fastly-api-key", value_name = "KEY", global = true)]
    pub fastly_api_key: Option<String>,

    /// Override the CDN service id.
    #[arg(long = "fastly-service-id", value_name = "ID", global = true)]
    pub fastly_service_id: Option<String>,

    /// Override the reverse proxy purge URL.
    #[arg(long = "nginx-url", value_name = "URL", global = true)]
    pub nginx_url: Option<String>,

    /// Override the public application domain.
    #[arg(long = "app-domain", value_name = "HOST", global = true)]
    pub app_domain: Option<String>,

    /// Override the provider request timeout.
    #[arg(long = "request-timeout-ms", value_name = "MILLIS", global = true)]
    pub request_timeout_ms: Option<u64>,

    /// Override the founding year anchoring the oldest time window.
    #[arg(long = "established-year", value_name = "YEAR", global = true)]
    pub established_year: Option<i32>,
}
