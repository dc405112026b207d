use tracing::debug;

use crate::cache::request::InvalidationRequest;
use crate::domain::entities::{Page, non_blank};

use super::{InvalidationPolicy, PolicyContext};

pub const EVENTS_PATH: &str = "/events";
pub const SIDEBAR_PATH: &str = "/sidebars/home";

impl InvalidationPolicy for Page {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();

        let Some(slug) = non_blank(self.slug.as_deref()) else {
            debug!(page_id = ?self.id, "Page has no slug; nothing to bust");
            return request;
        };

        request
            .bust_pair(format!("/page/{slug}"))
            .bust_pair(format!("/{slug}"));
        request
    }
}

pub(super) fn events_invalidation() -> InvalidationRequest {
    let mut request = InvalidationRequest::new();
    request.bust_pair(EVENTS_PATH);
    request
}

pub(super) fn sidebar_invalidation() -> InvalidationRequest {
    let mut request = InvalidationRequest::new();
    request.bust(SIDEBAR_PATH);
    request
}
