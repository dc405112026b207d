//! In-memory providers that record what they were asked to purge.
//!
//! Lets embedders and the test suites drive the engine without a network.

use std::sync::Mutex;

use async_trait::async_trait;

use super::keys::{KeyTarget, PathTarget};
use super::lock::mutex_lock;
use super::provider::{KeyedProvider, ProviderAdapter, ProviderError};

const SOURCE: &str = "cache::testing";

/// How a [`FakeAdapter`] answers purge calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    Succeed,
    /// Return a provider error after recording the call.
    Fail,
    /// Panic after recording the call.
    Panic,
}

/// Recording adapter; every call is stored before the behavior applies.
#[derive(Debug)]
pub struct FakeAdapter {
    name: &'static str,
    configured: bool,
    behavior: FakeBehavior,
    paths: Mutex<Vec<String>>,
    keys: Mutex<Vec<String>>,
}

impl FakeAdapter {
    pub fn new(name: &'static str, behavior: FakeBehavior) -> Self {
        Self {
            name,
            configured: true,
            behavior,
            paths: Mutex::new(Vec::new()),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            configured: false,
            ..Self::new(name, FakeBehavior::Succeed)
        }
    }

    /// Paths purged so far, in call order.
    pub fn paths(&self) -> Vec<String> {
        mutex_lock(&self.paths, SOURCE, "paths").clone()
    }

    /// Keys purged so far, in call order.
    pub fn keys(&self) -> Vec<String> {
        mutex_lock(&self.keys, SOURCE, "keys").clone()
    }

    pub fn calls(&self) -> usize {
        self.paths().len() + self.keys().len()
    }

    fn answer(&self) -> Result<(), ProviderError> {
        match self.behavior {
            FakeBehavior::Succeed => Ok(()),
            FakeBehavior::Fail => Err(ProviderError::Status {
                provider: self.name,
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            }),
            FakeBehavior::Panic => panic!("{} adapter blew up", self.name),
        }
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn purge_path(&self, path: &PathTarget) -> Result<(), ProviderError> {
        mutex_lock(&self.paths, SOURCE, "purge_path").push(path.as_str().to_string());
        self.answer()
    }
}

#[async_trait]
impl KeyedProvider for FakeAdapter {
    async fn purge_key(&self, key: &KeyTarget) -> Result<(), ProviderError> {
        mutex_lock(&self.keys, SOURCE, "purge_key").push(key.as_str().to_string());
        self.answer()
    }
}
