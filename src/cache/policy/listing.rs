use tracing::error;

use crate::cache::keys::SurrogateKeyed;
use crate::cache::request::InvalidationRequest;
use crate::domain::entities::{Listing, non_blank};

use super::{InvalidationPolicy, PolicyContext};

const LISTINGS_PATH: &str = "/listings";

impl InvalidationPolicy for Listing {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();

        request
            .purge(Listing::table_key(), None::<String>)
            .bust_pair(LISTINGS_PATH);

        let Some(category) = non_blank(self.category.as_deref()) else {
            error!(listing_id = ?self.id, "Listing bust requested without a category");
            return request;
        };

        if let Some(slug) = non_blank(self.slug.as_deref()) {
            request.bust_pair(format!("{LISTINGS_PATH}/{category}/{slug}"));
        }
        request.bust(format!("{LISTINGS_PATH}/{category}"));

        request
    }
}
