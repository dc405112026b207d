//! Deferred-bust queue configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_AUTO_CONSUME_INTERVAL_MS: u64 = 5000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;
const DEFAULT_MAX_LEN: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Auto-consume interval (ms) for deferred busts.
    pub auto_consume_interval_ms: u64,
    /// Maximum events per consumption batch.
    pub consume_batch_limit: usize,
    /// Pending events kept before the oldest are dropped.
    pub max_len: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            auto_consume_interval_ms: DEFAULT_AUTO_CONSUME_INTERVAL_MS,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl From<&crate::config::QueueSettings> for QueueConfig {
    fn from(settings: &crate::config::QueueSettings) -> Self {
        Self {
            auto_consume_interval_ms: settings.auto_consume_interval_ms,
            consume_batch_limit: settings.consume_batch_limit,
            max_len: settings.max_len,
        }
    }
}

impl QueueConfig {
    pub fn auto_consume_interval(&self) -> Duration {
        Duration::from_millis(self.auto_consume_interval_ms.max(1))
    }

    /// Batch limit clamped to at least one event.
    pub fn batch_limit(&self) -> usize {
        self.consume_batch_limit.max(1)
    }

    pub fn queue_max_len(&self) -> usize {
        self.max_len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.auto_consume_interval_ms, 5000);
        assert_eq!(config.consume_batch_limit, 100);
        assert_eq!(config.max_len, 10_000);
    }

    #[test]
    fn zero_values_are_clamped() {
        let config = QueueConfig {
            auto_consume_interval_ms: 0,
            consume_batch_limit: 0,
            max_len: 0,
        };
        assert_eq!(config.auto_consume_interval(), Duration::from_millis(1));
        assert_eq!(config.batch_limit(), 1);
        assert_eq!(config.queue_max_len(), 1);
    }
}
