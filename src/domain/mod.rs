//! Content records consumed by the invalidation policies.

pub mod entities;
