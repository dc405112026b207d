//! Edge cache invalidation.
//!
//! When a record changes, every cached page it appears on has to be evicted
//! from the layers in front of the application:
//!
//! - **Keyed CDN**: purged by surrogate key (`articles/42`) when configured,
//!   and by URL otherwise
//! - **Reverse proxy**: purged by URL path only
//!
//! Content policies ([`policy`]) map a record to an [`InvalidationRequest`];
//! the [`EdgeCache`] engine fans it out to the providers, and the
//! [`CacheTrigger`] queues it for deferred execution.
//!
//! ## Configuration
//!
//! ```toml
//! [providers]
//! fastly_api_key = "..."
//! fastly_service_id = "..."
//! nginx_url = "http://127.0.0.1:8080"
//!
//! [queue]
//! auto_consume_interval_ms = 5000
//! consume_batch_limit = 100
//! ```

mod bust;
mod config;
mod consumer;
mod engine;
mod events;
mod index;
mod keys;
mod lock;
mod planner;
pub mod policy;
pub mod provider;
mod purge;
mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod timeframe;
mod trigger;

pub use bust::{PathBustOrchestrator, PurgeReport};
pub use config::QueueConfig;
pub use consumer::BustConsumer;
pub use engine::EdgeCache;
pub use events::{BustEvent, BustQueue, Epoch};
pub use index::{IndexError, NoopIndexer, SearchIndexer};
pub use keys::{KeyTarget, PathTarget, SurrogateKeyed, VARIANT_QUERY};
pub use planner::BustPlan;
pub use policy::{Content, InvalidationPolicy, PolicyContext};
pub use provider::{KeyedProvider, ProviderAdapter, ProviderConfig, ProviderError};
pub use purge::KeyPurgeOrchestrator;
pub use request::{Followup, InvalidationRequest};
pub use timeframe::{Clock, FixedClock, SystemClock, TimeBucket, TimeWindowPlanner};
pub use trigger::CacheTrigger;
