use tracing::error;

use crate::cache::keys::SurrogateKeyed;
use crate::cache::request::InvalidationRequest;
use crate::domain::entities::{Tag, non_blank};

use super::{InvalidationPolicy, PolicyContext};

const TAG_INDEX_PATH: &str = "/tags";

impl InvalidationPolicy for Tag {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();

        // The tag pages below are busted by path already.
        if let Some(key) = self.record_key() {
            request.purge(key, None::<String>);
        }

        let Some(name) = non_blank(self.name.as_deref()) else {
            error!(tag_id = ?self.id, "Tag bust requested without a tag name");
            return request;
        };

        request
            .bust_pair(format!("/t/{name}"))
            .bust_pair(format!("/t/{name}/"))
            .bust(TAG_INDEX_PATH);

        request
    }
}
