//! Invalidation engine.
//!
//! Turns a changed record into an [`InvalidationRequest`] and carries it out
//! against the configured providers. Nothing here returns an error: provider
//! and indexer failures are logged, counted and folded into the report.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, info, instrument, warn};

use super::bust::{PathBustOrchestrator, PurgeReport};
use super::index::{NoopIndexer, SearchIndexer};
use super::keys::PathTarget;
use super::policy::{Content, InvalidationPolicy, PolicyContext};
use super::provider::{KeyedCdnAdapter, ProviderConfig, ReverseProxyAdapter, http_client};
use super::purge::KeyPurgeOrchestrator;
use super::request::{Followup, InvalidationRequest};
use super::timeframe::TimeWindowPlanner;

const METRIC_BUST_MS: &str = "edgecache_bust_ms";

pub struct EdgeCache {
    context: PolicyContext,
    paths: PathBustOrchestrator,
    keys: KeyPurgeOrchestrator,
    indexer: Arc<dyn SearchIndexer>,
}

impl EdgeCache {
    pub fn new(
        context: PolicyContext,
        paths: PathBustOrchestrator,
        keys: KeyPurgeOrchestrator,
    ) -> Self {
        Self {
            context,
            paths,
            keys,
            indexer: Arc::new(NoopIndexer),
        }
    }

    /// Wire the HTTP adapters described by `config`.
    ///
    /// The CDN adapter serves both as the keyed provider and as a path
    /// adapter; the reverse proxy only busts paths.
    pub fn from_config(
        config: &ProviderConfig,
        planner: TimeWindowPlanner,
    ) -> Result<Self, reqwest::Error> {
        let client = http_client(config.request_timeout)?;
        let cdn = Arc::new(KeyedCdnAdapter::new(config, client.clone()));
        let proxy = Arc::new(ReverseProxyAdapter::new(config, client));

        let paths = PathBustOrchestrator::new(vec![cdn.clone(), proxy]);
        let keys = KeyPurgeOrchestrator::new(Some(cdn), paths.clone());

        debug!(
            cdn = config.cdn_configured(),
            proxy = config.proxy_configured(),
            "Edge cache providers wired"
        );

        Ok(Self::new(PolicyContext::new(planner), paths, keys))
    }

    pub fn with_indexer(mut self, indexer: Arc<dyn SearchIndexer>) -> Self {
        self.indexer = indexer;
        self
    }

    pub fn context(&self) -> &PolicyContext {
        &self.context
    }

    /// Provider names that would receive path busts right now.
    pub fn active_providers(&self) -> Vec<&'static str> {
        self.paths.configured()
    }

    /// Whether keys currently go to the keyed provider rather than fallbacks.
    pub fn keyed_active(&self) -> bool {
        self.keys.keyed_active()
    }

    /// Compute the request for `content` without side effects.
    pub fn plan(&self, content: &Content) -> InvalidationRequest {
        content.invalidation(&self.context)
    }

    #[instrument(skip_all, fields(kind = content.kind()))]
    pub async fn invalidate(&self, content: &Content) -> PurgeReport {
        let request = self.plan(content);
        self.execute(&request).await
    }

    /// Carry out a request: direct paths and keyed purges run concurrently,
    /// followups run once both have finished.
    pub async fn execute(&self, request: &InvalidationRequest) -> PurgeReport {
        if request.is_empty() {
            debug!("Nothing to invalidate");
            return PurgeReport::default();
        }

        let started_at = Instant::now();
        info!(
            paths = ?request.paths,
            keys = ?request.keys,
            fallback_paths = ?request.fallback_paths,
            "Invalidating edge cache"
        );

        // A fallback that is also a direct path is busted once.
        let fallback_paths: Vec<PathTarget> = if self.keys.keyed_active() {
            Vec::new()
        } else {
            request
                .fallback_paths
                .iter()
                .filter(|path| !request.paths.contains(path))
                .cloned()
                .collect()
        };

        let (mut report, keyed) = futures::join!(
            self.paths.bust_all(&request.paths),
            self.keys.purge_keys(&request.keys, &fallback_paths),
        );
        report.absorb(keyed);

        for followup in &request.followups {
            self.run_followup(followup).await;
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_BUST_MS).record(elapsed_ms);
        info!(
            attempted = report.attempted,
            failed = report.failed,
            elapsed_ms,
            "Edge cache invalidated"
        );

        report
    }

    async fn run_followup(&self, followup: &Followup) {
        match followup {
            Followup::Reindex { key } => {
                if let Err(error) = self.indexer.reindex(key).await {
                    warn!(key = %key, error = %error, "Search reindex failed");
                }
            }
        }
    }
}
