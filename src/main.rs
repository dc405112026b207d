use std::process;
use std::sync::Arc;

use edgecache::{
    application::{commands, error::AppError},
    cache::{EdgeCache, ProviderConfig, QueueConfig, TimeWindowPlanner},
    config,
    infra::{error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let planner = TimeWindowPlanner::system(settings.timeframes.community_established_year);
    let providers = ProviderConfig::from(&settings.providers);
    let engine = Arc::new(EdgeCache::from_config(&providers, planner).map_err(InfraError::from)?);
    let queue = QueueConfig::from(&settings.queue);

    info!(
        providers = ?engine.active_providers(),
        keyed = engine.keyed_active(),
        "edgecache ready"
    );

    let outcome = commands::execute(&cli_args.command, &engine, &queue).await?;
    if outcome.has_failures() {
        warn!("Some provider calls failed; see the report for details");
    }

    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|err| AppError::unexpected(format!("failed to render outcome: {err}")))?;
    println!("{rendered}");

    Ok(())
}
