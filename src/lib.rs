//! Edge-cache invalidation engine.
//!
//! Translates content mutations into the cache coordinates (paths and
//! surrogate keys) that became stale and purges them through the configured
//! CDN and reverse-proxy providers.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
