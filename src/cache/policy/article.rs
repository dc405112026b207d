use time::Duration;
use tracing::debug;

use crate::cache::keys::SurrogateKeyed;
use crate::cache::request::InvalidationRequest;
use crate::domain::entities::{Article, non_blank};

use super::{InvalidationPolicy, PolicyContext};

const HOME_PATH: &str = "/";
const LATEST_PATH: &str = "/latest";
const DISCUSS_TAG: &str = "discuss";

/// Articles this fresh still sit on the `latest` listings.
const LATEST_WINDOW: Duration = Duration::hours(1);
/// Featured discussion threads stay on the home feed this long.
const DISCUSS_FEATURE_WINDOW: Duration = Duration::hours(35);

impl InvalidationPolicy for Article {
    fn invalidation(&self, ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();
        let path = non_blank(self.path.as_deref());

        if let Some(key) = self.record_key() {
            request.purge(key, path.map(str::to_string));
        }

        match path {
            Some(path) => {
                request.bust_pair(path);
                request.bust_pair(format!("{path}/"));
                if let Some(password) = non_blank(self.password.as_deref()) {
                    request.bust_pair(format!("{path}?preview={password}"));
                }
            }
            None => debug!(article_id = ?self.id, "Article has no path to bust"),
        }

        if let Some(slug) = non_blank(self.organization_slug.as_deref()) {
            request.bust_pair(format!("/{slug}"));
        }

        let now = ctx.now();
        if self.featured_at.is_some_and(|featured| featured > now) {
            request.bust_pair(HOME_PATH);
        }

        let Some(published_at) = self.published_at else {
            return request;
        };
        let tags: Vec<&str> = self
            .tags
            .iter()
            .filter_map(|tag| non_blank(Some(tag.as_str())))
            .collect();

        if published_at > now - LATEST_WINDOW {
            request.bust_pair(LATEST_PATH);
            for tag in &tags {
                request.bust_pair(format!("/t/{tag}/latest"));
            }
        }

        for bucket in ctx.buckets() {
            if !bucket.contains(published_at) {
                continue;
            }
            let label = bucket.label();
            request.bust_pair(format!("/top/{label}"));
            for tag in &tags {
                request.bust_pair(format!("/t/{tag}/top/{label}"));
            }
        }

        request
    }
}

/// Pages showing an article's comment count.
pub fn comment_count_invalidation(article: &Article, ctx: &PolicyContext) -> InvalidationRequest {
    let mut request = InvalidationRequest::new();

    if let Some(path) = non_blank(article.path.as_deref()) {
        request.bust_pair(format!("{path}/comments"));
    }

    let recently_featured = article
        .featured_at
        .is_some_and(|featured| featured > ctx.now() - DISCUSS_FEATURE_WINDOW);
    if recently_featured && article.has_tag(DISCUSS_TAG) {
        request.bust_pair(HOME_PATH);
    }

    request
}
