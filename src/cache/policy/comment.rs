use tracing::{debug, error};

use crate::cache::keys::SurrogateKeyed;
use crate::cache::request::{Followup, InvalidationRequest};
use crate::domain::entities::{Comment, Commentable};

use super::article::comment_count_invalidation;
use super::{InvalidationPolicy, PolicyContext};

/// Cached pages affected by a comment on `commentable`.
///
/// Purges the commentable's key and, when the comment itself is known, the
/// comment's key too; both fall back to the corresponding paths.
pub fn comment_invalidation(
    commentable: Option<&Commentable>,
    comment: Option<&Comment>,
    ctx: &PolicyContext,
) -> InvalidationRequest {
    let mut request = InvalidationRequest::new();

    let Some(commentable) = commentable else {
        error!(
            comment_id = ?comment.and_then(|c| c.id),
            "Comment bust requested without a commentable"
        );
        return request;
    };

    let mut fallbacks: Vec<String> = commentable.path().into_iter().collect();
    if let Some(path) = comment.and_then(Comment::path) {
        fallbacks.push(path);
    }

    match commentable.record_key() {
        Some(key) => {
            request.purge(key, fallbacks.clone());
        }
        None => {
            debug!("Commentable has no record key; busting its paths directly");
            for path in &fallbacks {
                request.bust(path.as_str());
            }
        }
    }

    if let Some(key) = comment.and_then(Comment::record_key) {
        request.purge(key, fallbacks);
    }

    if let Some(article) = commentable.as_article() {
        request.merge(comment_count_invalidation(article, ctx));
    }

    request
}

impl InvalidationPolicy for Commentable {
    fn invalidation(&self, ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = comment_invalidation(Some(self), None, ctx);

        if let Some(path) = self.path() {
            request.bust(format!("{path}/comments"));
        }
        if let Some(key) = self.record_key() {
            request.followup(Followup::Reindex { key });
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::PathTarget;
    use crate::cache::policy::test_support::context;
    use crate::domain::entities::{Article, PodcastEpisode};

    fn article() -> Commentable {
        Commentable::Article(Article {
            id: Some(9),
            path: Some("/ben/post-1".to_string()),
            tags: vec!["rust".to_string()],
            ..Default::default()
        })
    }

    fn comment() -> Comment {
        Comment {
            id: Some(77),
            id_code: Some("2bc".to_string()),
            username: Some("amy".to_string()),
        }
    }

    #[test]
    fn commentable_only_purges_its_key() {
        let request = comment_invalidation(Some(&article()), None, &context());

        assert_eq!(request.keys.len(), 1);
        assert!(request.contains_key("articles/9"));
        assert_eq!(request.fallback_paths, vec![PathTarget::new("/ben/post-1")]);
    }

    #[test]
    fn comment_purges_both_keys_with_both_fallbacks() {
        let request = comment_invalidation(Some(&article()), Some(&comment()), &context());

        assert!(request.contains_key("articles/9"));
        assert!(request.contains_key("comments/77"));
        assert_eq!(
            request.fallback_paths,
            vec![
                PathTarget::new("/ben/post-1"),
                PathTarget::new("/amy/comment/2bc")
            ]
        );
    }

    #[test]
    fn article_commentable_adds_comment_count_bust() {
        let request = comment_invalidation(Some(&article()), Some(&comment()), &context());
        assert!(request.contains_path("/ben/post-1/comments"));
        assert!(request.contains_path("/ben/post-1/comments?i=i"));
    }

    #[test]
    fn podcast_episode_commentable_skips_article_bust() {
        let episode = Commentable::PodcastEpisode(PodcastEpisode {
            id: Some(3),
            slug: Some("ep-3".to_string()),
            podcast_slug: Some("devpod".to_string()),
        });
        let request = comment_invalidation(Some(&episode), Some(&comment()), &context());

        assert!(request.paths.is_empty());
        assert!(request.contains_key("podcast_episodes/3"));
        assert!(request.contains_key("comments/77"));
    }

    #[test]
    fn missing_commentable_yields_empty_request() {
        let request = comment_invalidation(None, Some(&comment()), &context());
        assert!(request.is_empty());
    }

    #[test]
    fn commentable_policy_busts_comments_page_and_reindexes() {
        let request = article().invalidation(&context());

        assert!(request.contains_key("articles/9"));
        assert!(request.contains_path("/ben/post-1/comments"));
        assert_eq!(
            request.followups,
            vec![Followup::Reindex {
                key: "articles/9".into()
            }]
        );
    }

    #[test]
    fn unsaved_commentable_busts_paths_directly() {
        let draft = Commentable::Article(Article {
            path: Some("/ben/draft".to_string()),
            ..Default::default()
        });
        let request = comment_invalidation(Some(&draft), None, &context());

        assert!(request.keys.is_empty());
        assert!(request.contains_path("/ben/draft"));
    }
}
