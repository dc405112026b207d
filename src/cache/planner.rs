//! Batch plan generation.
//!
//! Folds a drained batch of bust events into one request so a path or key
//! shared by several events is purged once.

use std::collections::HashSet;
use std::fmt;

use super::events::BustEvent;
use super::request::InvalidationRequest;

#[derive(Debug, Default)]
pub struct BustPlan {
    pub request: InvalidationRequest,
    /// Events that contributed, after dedupe.
    pub events: usize,
    /// Content kinds in first-seen order.
    pub kinds: Vec<&'static str>,
}

impl fmt::Display for BustPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BustPlan {{ events: {}, kinds: {:?}, request: {} }}",
            self.events, self.kinds, self.request
        )
    }
}

impl BustPlan {
    /// Dedupes by event id and merges in epoch order.
    pub fn from_events(mut events: Vec<BustEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids = HashSet::new();

        events.sort_by_key(|event| event.epoch);
        for event in events {
            if !seen_ids.insert(event.id) {
                continue;
            }
            plan.events += 1;
            if !plan.kinds.contains(&event.kind) {
                plan.kinds.push(event.kind);
            }
            plan.request.merge(event.request);
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
    }
}
