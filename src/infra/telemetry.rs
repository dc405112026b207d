use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "edgecache_purge_total",
            Unit::Count,
            "Provider purge calls, labelled by provider, target kind and outcome."
        );
        describe_histogram!(
            "edgecache_bust_ms",
            Unit::Milliseconds,
            "Latency of executing one invalidation request in milliseconds."
        );
        describe_gauge!(
            "edgecache_queue_len",
            Unit::Count,
            "Current number of deferred busts waiting in the queue."
        );
        describe_counter!(
            "edgecache_queue_dropped_total",
            Unit::Count,
            "Deferred busts dropped because the queue was full."
        );
        describe_histogram!(
            "edgecache_consume_ms",
            Unit::Milliseconds,
            "Queue consumption latency in milliseconds."
        );
    });
}
