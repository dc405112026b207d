//! Drains the bust queue and executes the merged plan.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::bust::PurgeReport;
use super::config::QueueConfig;
use super::engine::EdgeCache;
use super::events::BustQueue;
use super::planner::BustPlan;

const METRIC_CONSUME_MS: &str = "edgecache_consume_ms";

pub struct BustConsumer {
    config: QueueConfig,
    engine: Arc<EdgeCache>,
    queue: Arc<BustQueue>,
}

impl BustConsumer {
    pub fn new(config: QueueConfig, engine: Arc<EdgeCache>, queue: Arc<BustQueue>) -> Self {
        Self {
            config,
            engine,
            queue,
        }
    }

    /// Execute one batch. Returns true if any events were processed.
    #[instrument(skip(self))]
    pub async fn consume(&self) -> bool {
        self.consume_batch().await.is_some()
    }

    /// Execute one batch and return its report, or `None` if the queue was empty.
    pub async fn consume_batch(&self) -> Option<PurgeReport> {
        let started_at = Instant::now();
        let events = self.queue.drain(self.config.batch_limit());
        if events.is_empty() {
            return None;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|event| event.id).collect();
        let plan = BustPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Edge cache consumption starting"
        );

        let report = self.engine.execute(&plan.request).await;

        info!(
            event_count,
            attempted = report.attempted,
            failed = report.failed,
            "Edge cache consumption complete"
        );
        histogram!(METRIC_CONSUME_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        Some(report)
    }

    /// Keep consuming until the queue is empty.
    pub async fn consume_all(&self) -> PurgeReport {
        let mut report = PurgeReport::default();
        while let Some(batch) = self.consume_batch().await {
            report.absorb(batch);
        }
        report
    }

    /// Consume on a fixed interval until the handle is aborted.
    pub fn spawn_auto_consume(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.config.auto_consume_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // Skip the first immediate tick
            loop {
                interval.tick().await;
                if !self.consume().await {
                    debug!("Edge cache queue idle");
                }
            }
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::bust::PathBustOrchestrator;
    use crate::cache::policy::test_support::context;
    use crate::cache::purge::KeyPurgeOrchestrator;
    use crate::cache::request::InvalidationRequest;
    use crate::cache::testing::{FakeAdapter, FakeBehavior};

    fn setup(batch: usize) -> (Arc<FakeAdapter>, Arc<BustQueue>, Arc<BustConsumer>) {
        let proxy = Arc::new(FakeAdapter::new("proxy", FakeBehavior::Succeed));
        let paths = PathBustOrchestrator::new(vec![proxy.clone()]);
        let keys = KeyPurgeOrchestrator::new(None, paths.clone());
        let engine = Arc::new(EdgeCache::new(context(), paths, keys));
        let queue = Arc::new(BustQueue::new());
        let config = QueueConfig {
            auto_consume_interval_ms: 10,
            consume_batch_limit: batch,
            ..QueueConfig::default()
        };
        let consumer = Arc::new(BustConsumer::new(config, engine, queue.clone()));
        (proxy, queue, consumer)
    }

    fn request(paths: &[&str]) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();
        for path in paths {
            request.bust(*path);
        }
        request
    }

    #[tokio::test]
    async fn empty_queue_consumes_nothing() {
        let (proxy, _queue, consumer) = setup(10);
        assert!(!consumer.consume().await);
        assert_eq!(proxy.calls(), 0);
    }

    #[tokio::test]
    async fn batch_merges_shared_paths() {
        let (proxy, queue, consumer) = setup(10);
        queue.publish("tag", request(&["/tags", "/t/rust"]));
        queue.publish("tag", request(&["/tags", "/t/go"]));

        assert!(consumer.consume().await);
        assert_eq!(proxy.paths(), vec!["/tags", "/t/rust", "/t/go"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn consume_all_walks_every_batch() {
        let (proxy, queue, consumer) = setup(1);
        for path in ["/a", "/b", "/c"] {
            queue.publish("page", request(&[path]));
        }

        let report = consumer.consume_all().await;
        assert_eq!(report.attempted, 3);
        assert_eq!(proxy.paths(), vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn auto_consume_drains_in_background() {
        let (proxy, queue, consumer) = setup(10);
        queue.publish("sidebar", request(&["/sidebars/home"]));

        let handle = consumer.spawn_auto_consume();
        for _ in 0..100 {
            if queue.is_empty() && proxy.calls() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(proxy.paths(), vec!["/sidebars/home"]);
    }
}
