//! Read-only snapshots of the content records whose cached pages the engine
//! invalidates.
//!
//! Every field the engine reads is optional or defaulted: a mutation hook may
//! hand over a partially loaded record, and invalidation must degrade rather
//! than fail in that case.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: Option<i64>,
    /// Canonical path, e.g. `/ben/hello-world-4jk2`.
    pub path: Option<String>,
    /// Preview password for unpublished drafts.
    pub password: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    /// When the article was featured; a future value pins it on the home feed.
    #[serde(with = "time::serde::rfc3339::option")]
    pub featured_at: Option<OffsetDateTime>,
    pub tags: Vec<String>,
    pub organization_slug: Option<String>,
}

impl Article {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: Option<i64>,
    pub id_code: Option<String>,
    /// Username of the comment author.
    pub username: Option<String>,
}

impl Comment {
    pub fn path(&self) -> Option<String> {
        let username = non_blank(self.username.as_deref())?;
        let code = non_blank(self.id_code.as_deref())?;
        Some(format!("/{username}/comment/{code}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Option<i64>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub id: Option<i64>,
    pub slug: Option<String>,
    /// Paths of every article published under the organization.
    pub article_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Listing {
    pub id: Option<i64>,
    pub category: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: Option<i64>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Podcast {
    pub id: Option<i64>,
    pub slug: Option<String>,
}

impl Podcast {
    pub fn path(&self) -> Option<String> {
        non_blank(self.slug.as_deref()).map(|slug| format!("/{slug}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastEpisode {
    pub id: Option<i64>,
    pub slug: Option<String>,
    pub podcast_slug: Option<String>,
}

impl PodcastEpisode {
    pub fn path(&self) -> Option<String> {
        let podcast = non_blank(self.podcast_slug.as_deref())?;
        let slug = non_blank(self.slug.as_deref())?;
        Some(format!("/{podcast}/{slug}"))
    }
}

/// A record that accepts comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Commentable {
    Article(Article),
    PodcastEpisode(PodcastEpisode),
}

impl Commentable {
    pub fn path(&self) -> Option<String> {
        match self {
            Commentable::Article(article) => non_blank(article.path.as_deref()).map(str::to_string),
            Commentable::PodcastEpisode(episode) => episode.path(),
        }
    }

    pub fn as_article(&self) -> Option<&Article> {
        match self {
            Commentable::Article(article) => Some(article),
            Commentable::PodcastEpisode(_) => None,
        }
    }
}

/// Returns the trimmed value when it is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
