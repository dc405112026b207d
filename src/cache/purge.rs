//! Surrogate-key purging with path fallback.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use super::bust::{PathBustOrchestrator, PurgeReport, isolate, record_outcome};
use super::keys::{KeyTarget, PathTarget};
use super::provider::KeyedProvider;

/// Purges keys on the keyed provider, or busts fallback paths when it is
/// not configured. The two routes are mutually exclusive per call.
#[derive(Clone)]
pub struct KeyPurgeOrchestrator {
    keyed: Option<Arc<dyn KeyedProvider>>,
    paths: PathBustOrchestrator,
}

impl KeyPurgeOrchestrator {
    pub fn new(keyed: Option<Arc<dyn KeyedProvider>>, paths: PathBustOrchestrator) -> Self {
        Self { keyed, paths }
    }

    /// Whether keys would currently go to the keyed provider.
    pub fn keyed_active(&self) -> bool {
        self.keyed
            .as_ref()
            .is_some_and(|provider| provider.is_configured())
    }

    /// One keyed call per key; fallbacks are ignored on this route.
    pub async fn purge_keys(&self, keys: &[KeyTarget], fallback_paths: &[PathTarget]) -> PurgeReport {
        match self.keyed.as_ref().filter(|provider| provider.is_configured()) {
            Some(provider) => {
                let calls = keys.iter().map(|key| async move {
                    let name = provider.name();
                    let result = isolate(name, provider.purge_key(key)).await;
                    record_outcome(name, "key", key.as_str(), result)
                });
                PurgeReport::from_outcomes(join_all(calls).await)
            }
            None => {
                if !keys.is_empty() {
                    debug!(
                        keys = keys.len(),
                        fallbacks = fallback_paths.len(),
                        "Keyed provider not configured; busting fallback paths"
                    );
                }
                self.paths.bust_all(fallback_paths).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::provider::ProviderAdapter;
    use crate::cache::testing::{FakeAdapter, FakeBehavior};

    fn keys(values: &[&str]) -> Vec<KeyTarget> {
        values.iter().copied().map(KeyTarget::from).collect()
    }

    fn paths(values: &[&str]) -> Vec<PathTarget> {
        values.iter().copied().map(PathTarget::from).collect()
    }

    #[tokio::test]
    async fn keyed_provider_gets_one_call_per_key_and_no_paths() {
        let cdn = Arc::new(FakeAdapter::new("cdn", FakeBehavior::Succeed));
        let proxy = Arc::new(FakeAdapter::new("proxy", FakeBehavior::Succeed));
        let bust = PathBustOrchestrator::new(vec![cdn.clone(), proxy.clone()]);
        let orchestrator = KeyPurgeOrchestrator::new(Some(cdn.clone()), bust);

        let report = orchestrator
            .purge_keys(&keys(&["articles/1", "comments/2"]), &paths(&["/a", "/b"]))
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(cdn.keys(), vec!["articles/1", "comments/2"]);
        assert!(cdn.paths().is_empty());
        assert_eq!(proxy.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_keyed_provider_busts_exactly_the_fallbacks() {
        let cdn = Arc::new(FakeAdapter::unconfigured("cdn"));
        let proxy = Arc::new(FakeAdapter::new("proxy", FakeBehavior::Succeed));
        let bust = PathBustOrchestrator::new(vec![cdn.clone(), proxy.clone()]);
        let orchestrator = KeyPurgeOrchestrator::new(Some(cdn.clone()), bust);
        assert!(!orchestrator.keyed_active());

        let report = orchestrator
            .purge_keys(&keys(&["articles/1"]), &paths(&["/a", "/b"]))
            .await;

        assert_eq!(report.attempted, 2);
        assert!(cdn.keys().is_empty());
        assert_eq!(proxy.paths(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn failing_key_does_not_stop_the_rest() {
        let cdn = Arc::new(FakeAdapter::new("cdn", FakeBehavior::Fail));
        let orchestrator =
            KeyPurgeOrchestrator::new(Some(cdn.clone()), PathBustOrchestrator::default());

        let report = orchestrator
            .purge_keys(&keys(&["tags/1", "tags"]), &[])
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(cdn.keys(), vec!["tags/1", "tags"]);
        assert!(cdn.is_configured());
    }

    #[tokio::test]
    async fn no_providers_at_all_is_a_no_op() {
        let orchestrator = KeyPurgeOrchestrator::new(None, PathBustOrchestrator::default());
        let report = orchestrator
            .purge_keys(&keys(&["articles/1"]), &paths(&["/a"]))
            .await;
        assert_eq!(report, PurgeReport::default());
    }
}
