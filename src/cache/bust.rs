//! Path busting fan-out.
//!
//! Sends each path to every configured provider. Providers are called
//! concurrently and independently: one failing (or panicking) provider never
//! stops the others and never surfaces to the caller.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};

use super::keys::PathTarget;
use super::provider::{ProviderAdapter, ProviderError};

const METRIC_PURGE_TOTAL: &str = "edgecache_purge_total";

/// Adapter calls issued by one bust or purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub attempted: usize,
    pub failed: usize,
}

impl PurgeReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }

    pub fn absorb(&mut self, other: PurgeReport) {
        self.attempted += other.attempted;
        self.failed += other.failed;
    }

    pub(crate) fn from_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut report, ok| {
                report.attempted += 1;
                if !ok {
                    report.failed += 1;
                }
                report
            })
    }
}

/// Logs and counts one adapter call; returns whether it succeeded.
pub(crate) fn record_outcome(
    provider: &'static str,
    target_kind: &'static str,
    target: &str,
    result: Result<(), ProviderError>,
) -> bool {
    match result {
        Ok(()) => {
            debug!(provider, target_kind, target, "Purge succeeded");
            counter!(METRIC_PURGE_TOTAL, "provider" => provider, "target" => target_kind, "outcome" => "ok")
                .increment(1);
            true
        }
        Err(error) => {
            warn!(provider, target_kind, target, error = %error, "Purge failed");
            counter!(METRIC_PURGE_TOTAL, "provider" => provider, "target" => target_kind, "outcome" => "error")
                .increment(1);
            false
        }
    }
}

/// Converts a panic inside an adapter call into a failed outcome.
pub(crate) async fn isolate<F>(provider: &'static str, call: F) -> Result<(), ProviderError>
where
    F: Future<Output = Result<(), ProviderError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Panicked { provider }),
    }
}

#[derive(Clone, Default)]
pub struct PathBustOrchestrator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl PathBustOrchestrator {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    /// Names of the adapters that would be called right now.
    pub fn configured(&self) -> Vec<&'static str> {
        self.adapters
            .iter()
            .filter(|adapter| adapter.is_configured())
            .map(|adapter| adapter.name())
            .collect()
    }

    pub async fn bust(&self, path: &PathTarget) -> PurgeReport {
        let calls = self
            .adapters
            .iter()
            .filter(|adapter| adapter.is_configured())
            .map(|adapter| async move {
                let name = adapter.name();
                let result = isolate(name, adapter.purge_path(path)).await;
                record_outcome(name, "path", path.as_str(), result)
            });

        PurgeReport::from_outcomes(join_all(calls).await)
    }

    pub async fn bust_all(&self, paths: &[PathTarget]) -> PurgeReport {
        let mut report = PurgeReport::default();
        for path in paths {
            report.absorb(self.bust(path).await);
        }
        report
    }
}
