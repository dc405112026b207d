//! Content invalidation policies.
//!
//! Each content kind maps a changed record to the `InvalidationRequest` that
//! covers every cached page it can appear on. Policies are pure: no I/O, no
//! panics, and incomplete records degrade to a smaller request.

mod article;
mod comment;
mod listing;
mod podcast;
mod profile;
mod site;
mod tag;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::entities::{
    Article, Comment, Commentable, Listing, Organization, Page, Podcast, PodcastEpisode, Tag, User,
};

use super::request::InvalidationRequest;
use super::timeframe::{TimeBucket, TimeWindowPlanner};

pub use article::comment_count_invalidation;
pub use comment::comment_invalidation;
pub use site::{EVENTS_PATH, SIDEBAR_PATH};

/// Shared inputs for policy evaluation.
#[derive(Debug, Clone)]
pub struct PolicyContext {
    planner: TimeWindowPlanner,
}

impl PolicyContext {
    pub fn new(planner: TimeWindowPlanner) -> Self {
        Self { planner }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.planner.now()
    }

    pub fn buckets(&self) -> Vec<TimeBucket> {
        self.planner.buckets()
    }

    pub fn planner(&self) -> &TimeWindowPlanner {
        &self.planner
    }
}

/// Maps a changed record to the cache coordinates it made stale.
pub trait InvalidationPolicy {
    fn invalidation(&self, ctx: &PolicyContext) -> InvalidationRequest;
}

/// Every content kind the engine knows how to invalidate.
///
/// Callers already know which kind they mutated and pick the variant
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum Content {
    Article(Article),
    Comment {
        #[serde(default)]
        commentable: Option<Commentable>,
        #[serde(default)]
        comment: Option<Comment>,
    },
    Commentable(Commentable),
    Tag(Tag),
    User(User),
    Organization(Organization),
    Listing(Listing),
    Page(Page),
    Events,
    Podcast(Podcast),
    PodcastEpisode(PodcastEpisode),
    Sidebar,
}

impl Content {
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Article(_) => "article",
            Content::Comment { .. } => "comment",
            Content::Commentable(_) => "commentable",
            Content::Tag(_) => "tag",
            Content::User(_) => "user",
            Content::Organization(_) => "organization",
            Content::Listing(_) => "listing",
            Content::Page(_) => "page",
            Content::Events => "events",
            Content::Podcast(_) => "podcast",
            Content::PodcastEpisode(_) => "podcast_episode",
            Content::Sidebar => "sidebar",
        }
    }
}

impl InvalidationPolicy for Content {
    fn invalidation(&self, ctx: &PolicyContext) -> InvalidationRequest {
        match self {
            Content::Article(article) => article.invalidation(ctx),
            Content::Comment {
                commentable,
                comment,
            } => comment_invalidation(commentable.as_ref(), comment.as_ref(), ctx),
            Content::Commentable(commentable) => commentable.invalidation(ctx),
            Content::Tag(tag) => tag.invalidation(ctx),
            Content::User(user) => user.invalidation(ctx),
            Content::Organization(organization) => organization.invalidation(ctx),
            Content::Listing(listing) => listing.invalidation(ctx),
            Content::Page(page) => page.invalidation(ctx),
            Content::Events => site::events_invalidation(),
            Content::Podcast(podcast) => podcast.invalidation(ctx),
            Content::PodcastEpisode(episode) => episode.invalidation(ctx),
            Content::Sidebar => site::sidebar_invalidation(),
        }
    }
}
