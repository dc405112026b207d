//! Search-index collaborator for `Followup::Reindex`.

use async_trait::async_trait;
use thiserror::Error;

use super::keys::KeyTarget;

#[derive(Debug, Error)]
#[error("reindex of {key} failed: {message}")]
pub struct IndexError {
    pub key: KeyTarget,
    pub message: String,
}

impl IndexError {
    pub fn new(key: &KeyTarget, message: impl Into<String>) -> Self {
        Self {
            key: key.clone(),
            message: message.into(),
        }
    }
}

/// Refreshes the search document backing a record.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn reindex(&self, key: &KeyTarget) -> Result<(), IndexError>;
}

/// Indexer for deployments without a search backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexer;

#[async_trait]
impl SearchIndexer for NoopIndexer {
    async fn reindex(&self, _key: &KeyTarget) -> Result<(), IndexError> {
        Ok(())
    }
}
