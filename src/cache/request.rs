//! Invalidation requests produced by the content policies.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys::{KeyTarget, PathTarget};

/// Collaborator calls to run after the cache has been busted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Followup {
    /// Refresh the search document of a record synchronously.
    Reindex { key: KeyTarget },
}

/// Paths and surrogate keys made stale by one content mutation.
///
/// `fallback_paths` are only busted when no keyed provider is configured.
/// All collections keep insertion order and never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidationRequest {
    pub paths: Vec<PathTarget>,
    pub keys: Vec<KeyTarget>,
    pub fallback_paths: Vec<PathTarget>,
    pub followups: Vec<Followup>,
}

impl InvalidationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bust a single path as given.
    pub fn bust(&mut self, path: impl Into<String>) -> &mut Self {
        push_unique(&mut self.paths, PathTarget::new(path));
        self
    }

    /// Bust a path and its `?i=i` variant.
    pub fn bust_pair(&mut self, path: impl Into<String>) -> &mut Self {
        for target in PathTarget::pair(path) {
            push_unique(&mut self.paths, target);
        }
        self
    }

    /// Purge a surrogate key; `fallbacks` stand in for it without a keyed provider.
    pub fn purge<I>(&mut self, key: KeyTarget, fallbacks: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        push_unique(&mut self.keys, key);
        for path in fallbacks {
            push_unique(&mut self.fallback_paths, PathTarget::new(path));
        }
        self
    }

    pub fn followup(&mut self, followup: Followup) -> &mut Self {
        push_unique(&mut self.followups, followup);
        self
    }

    /// Fold another request into this one.
    pub fn merge(&mut self, other: InvalidationRequest) -> &mut Self {
        for path in other.paths {
            push_unique(&mut self.paths, path);
        }
        for key in other.keys {
            push_unique(&mut self.keys, key);
        }
        for path in other.fallback_paths {
            push_unique(&mut self.fallback_paths, path);
        }
        for followup in other.followups {
            push_unique(&mut self.followups, followup);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
            && self.keys.is_empty()
            && self.fallback_paths.is_empty()
            && self.followups.is_empty()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.iter().any(|target| target.as_str() == path)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|target| target.as_str() == key)
    }
}

impl fmt::Display for InvalidationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationRequest {{ paths: {}, keys: {}, fallback_paths: {}, followups: {} }}",
            self.paths.len(),
            self.keys.len(),
            self.fallback_paths.len(),
            self.followups.len(),
        )
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
