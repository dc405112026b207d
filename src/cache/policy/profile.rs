use tracing::{debug, error};

use crate::cache::request::InvalidationRequest;
use crate::domain::entities::{Organization, User, non_blank};

use super::{InvalidationPolicy, PolicyContext};

impl InvalidationPolicy for User {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();

        let Some(username) = non_blank(self.username.as_deref()) else {
            debug!(user_id = ?self.id, "User has no username; nothing to bust");
            return request;
        };

        request
            .bust_pair(format!("/{username}"))
            .bust_pair(format!("/{username}/comments"))
            .bust(format!("/{username}/comments/?i=i"))
            .bust_pair(format!("/live/{username}"))
            .bust(format!("/feed/{username}"));

        request
    }
}

impl InvalidationPolicy for Organization {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();

        match non_blank(self.slug.as_deref()) {
            Some(slug) => {
                request.bust_pair(format!("/{slug}"));
            }
            None => error!(
                organization_id = ?self.id,
                "Organization bust requested without a slug"
            ),
        }

        for path in &self.article_paths {
            if let Some(path) = non_blank(Some(path.as_str())) {
                request.bust_pair(path);
            }
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::policy::test_support::{context, paths};

    #[test]
    fn user_pages() {
        let user = User {
            id: Some(1),
            username: Some("ben".to_string()),
        };
        let request = user.invalidation(&context());

        assert_eq!(
            paths(&request),
            vec![
                "/ben",
                "/ben?i=i",
                "/ben/comments",
                "/ben/comments?i=i",
                "/ben/comments/?i=i",
                "/live/ben",
                "/live/ben?i=i",
                "/feed/ben",
            ]
        );
        assert!(request.keys.is_empty());
    }

    #[test]
    fn user_without_username_is_empty() {
        assert!(User::default().invalidation(&context()).is_empty());
    }

    #[test]
    fn organization_and_its_articles() {
        let organization = Organization {
            id: Some(2),
            slug: Some("acme".to_string()),
            article_paths: vec!["/acme/launch".to_string(), "/acme/recap".to_string()],
        };
        let request = organization.invalidation(&context());

        assert!(request.contains_path("/acme"));
        assert!(request.contains_path("/acme?i=i"));
        assert!(request.contains_path("/acme/launch"));
        assert!(request.contains_path("/acme/recap?i=i"));
    }

    #[test]
    fn organization_without_slug_still_busts_articles() {
        let organization = Organization {
            id: Some(2),
            slug: None,
            article_paths: vec!["/acme/launch".to_string(), " ".to_string()],
        };
        let request = organization.invalidation(&context());

        assert_eq!(paths(&request), vec!["/acme/launch", "/acme/launch?i=i"]);
    }
}
