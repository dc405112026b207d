//! Deferred bust queue.
//!
//! Write paths that cannot afford provider round-trips publish their
//! invalidation request here; the consumer drains and executes it later.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::config::QueueConfig;
use super::lock::mutex_lock;
use super::request::InvalidationRequest;

const SOURCE: &str = "cache::events";
const METRIC_QUEUE_LEN: &str = "edgecache_queue_len";
const METRIC_QUEUE_DROPPED: &str = "edgecache_queue_dropped_total";

/// Monotonic per-process sequence number.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct BustEvent {
    /// Idempotency key; replays of the same event are executed once.
    pub id: Uuid,
    pub epoch: Epoch,
    /// Content kind the request was planned for.
    pub kind: &'static str,
    pub request: InvalidationRequest,
    pub enqueued_at: OffsetDateTime,
}

impl BustEvent {
    pub fn new(kind: &'static str, request: InvalidationRequest, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            request,
            enqueued_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Bounded FIFO of planned requests awaiting execution.
///
/// When full, the oldest event is dropped to make room.
pub struct BustQueue {
    queue: Mutex<VecDeque<BustEvent>>,
    epoch_counter: AtomicU64,
    max_len: usize,
}

impl BustQueue {
    pub fn new() -> Self {
        Self::with_max_len(QueueConfig::default().queue_max_len())
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
            max_len: max_len.max(1),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Enqueue a request; empty requests are dropped. Returns the event id.
    pub fn publish(&self, kind: &'static str, request: InvalidationRequest) -> Option<Uuid> {
        if request.is_empty() {
            return None;
        }

        let event = BustEvent::new(kind, request, self.next_epoch());
        let id = event.id;
        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = kind,
            request = %event.request,
            "Edge cache bust enqueued"
        );

        self.push(event);
        Some(id)
    }

    /// Re-enqueue an existing event, keeping its id.
    pub fn push(&self, event: BustEvent) {
        let mut queue = mutex_lock(&self.queue, SOURCE, "push");
        while queue.len() >= self.max_len {
            let Some(dropped) = queue.pop_front() else {
                break;
            };
            warn!(
                event_id = %dropped.id,
                event_epoch = dropped.epoch,
                event_kind = dropped.kind,
                max_len = self.max_len,
                "Edge cache queue full; dropping oldest bust"
            );
            counter!(METRIC_QUEUE_DROPPED).increment(1);
        }
        queue.push_back(event);
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);
    }

    /// Remove up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<BustEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let events = queue.drain(..count).collect();
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);
        events
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending event without executing it.
    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
        gauge!(METRIC_QUEUE_LEN).set(0.0);
    }
}

impl Default for BustQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();
        request.bust(path);
        request
    }

    #[test]
    fn publish_assigns_increasing_epochs() {
        let queue = BustQueue::new();
        queue.publish("page", request("/a"));
        queue.publish("page", request("/b"));

        let events = queue.drain(10);
        assert_eq!(events.len(), 2);
        assert!(events[0].epoch < events[1].epoch);
        assert_ne!(events[0].id, events[1].id);
    }

    #[test]
    fn empty_requests_are_not_queued() {
        let queue = BustQueue::new();
        assert!(queue.publish("comment", InvalidationRequest::new()).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_respects_limit_and_order() {
        let queue = BustQueue::new();
        for path in ["/a", "/b", "/c"] {
            queue.publish("page", request(path));
        }

        let first = queue.drain(2);
        assert_eq!(first.len(), 2);
        assert!(first[0].request.contains_path("/a"));
        assert!(first[1].request.contains_path("/b"));
        assert_eq!(queue.len(), 1);

        let rest = queue.drain(10);
        assert!(rest[0].request.contains_path("/c"));
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_drops_oldest_events() {
        let queue = BustQueue::with_max_len(2);
        for path in ["/a", "/b", "/c"] {
            queue.publish("page", request(path));
        }

        assert_eq!(queue.len(), 2);
        let events = queue.drain(10);
        assert!(events[0].request.contains_path("/b"));
        assert!(events[1].request.contains_path("/c"));
    }

    #[test]
    fn clear_discards_pending_events() {
        let queue = BustQueue::new();
        queue.publish("events", request("/events"));
        queue.clear();
        assert!(queue.drain(10).is_empty());
    }
}
