use tracing::error;

use crate::cache::keys::SurrogateKeyed;
use crate::cache::request::InvalidationRequest;
use crate::domain::entities::{Podcast, PodcastEpisode, non_blank};

use super::{InvalidationPolicy, PolicyContext};

const PODCAST_INDEX_PATH: &str = "/pod";

impl InvalidationPolicy for Podcast {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();
        match self.path() {
            Some(path) => {
                request.bust(path);
            }
            None => error!(podcast_id = ?self.id, "Podcast bust requested without a slug"),
        }
        request
    }
}

impl InvalidationPolicy for PodcastEpisode {
    fn invalidation(&self, _ctx: &PolicyContext) -> InvalidationRequest {
        let mut request = InvalidationRequest::new();
        let path = self.path();

        let fallbacks: Vec<String> = path
            .iter()
            .cloned()
            .chain([PODCAST_INDEX_PATH.to_string()])
            .collect();

        match self.record_key() {
            Some(key) => {
                request.purge(key, fallbacks.clone());
            }
            None => error!("Podcast episode bust requested without an id"),
        }
        request.purge(PodcastEpisode::table_key(), fallbacks);

        match (path, non_blank(self.podcast_slug.as_deref())) {
            (Some(path), Some(podcast_slug)) => {
                request
                    .bust(path)
                    .bust(format!("/{podcast_slug}"))
                    .bust(PODCAST_INDEX_PATH);
            }
            _ => error!(
                episode_id = ?self.id,
                slug = ?self.slug,
                podcast_slug = ?self.podcast_slug,
                "Podcast episode bust requested without a resolvable path"
            ),
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::PathTarget;
    use crate::cache::policy::test_support::{context, paths};

    fn episode() -> PodcastEpisode {
        PodcastEpisode {
            id: Some(11),
            slug: Some("ep-11".to_string()),
            podcast_slug: Some("devpod".to_string()),
        }
    }

    #[test]
    fn podcast_busts_its_path() {
        let podcast = Podcast {
            id: Some(1),
            slug: Some("devpod".to_string()),
        };
        assert_eq!(paths(&podcast.invalidation(&context())), vec!["/devpod"]);
        assert!(Podcast::default().invalidation(&context()).is_empty());
    }

    #[test]
    fn episode_busts_paths_and_purges_keys() {
        let request = episode().invalidation(&context());

        assert_eq!(paths(&request), vec!["/devpod/ep-11", "/devpod", "/pod"]);
        assert!(request.contains_key("podcast_episodes/11"));
        assert!(request.contains_key("podcast_episodes"));
        assert_eq!(
            request.fallback_paths,
            vec![PathTarget::new("/devpod/ep-11"), PathTarget::new("/pod")]
        );
    }

    #[test]
    fn episode_without_podcast_degrades_to_keys() {
        let request = PodcastEpisode {
            podcast_slug: None,
            ..episode()
        }
        .invalidation(&context());

        assert!(request.paths.is_empty());
        assert!(request.contains_key("podcast_episodes/11"));
        assert_eq!(request.fallback_paths, vec![PathTarget::new("/pod")]);
    }
}
