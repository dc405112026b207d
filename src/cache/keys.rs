//! Cache coordinates.
//!
//! Defines `PathTarget` for URL-addressed purges and `KeyTarget` for
//! surrogate-key purges, plus the record-key convention content records use
//! to tag their rendered responses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    Article, Comment, Commentable, Listing, Organization, Page, Podcast, PodcastEpisode, Tag, User,
};

/// Query suffix the edge stores as a separate cache entry for every page.
pub const VARIANT_QUERY: &str = "i=i";

/// A canonical URL path (optionally carrying a query string) to purge.
///
/// Always starts with `/`, so it can only ever address the configured host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PathTarget(String);

impl PathTarget {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with('/') {
            Self(path)
        } else {
            Self(format!("/{path}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The same page addressed with the preview/variant query appended.
    pub fn variant(&self) -> Self {
        let separator = if self.0.contains('?') { '&' } else { '?' };
        Self(format!("{}{separator}{VARIANT_QUERY}", self.0))
    }

    /// Canonical path followed by its variant.
    pub fn pair(path: impl Into<String>) -> [Self; 2] {
        let canonical = Self::new(path);
        let variant = canonical.variant();
        [canonical, variant]
    }

    pub fn is_variant(&self) -> bool {
        self.0.ends_with(VARIANT_QUERY)
    }
}

impl fmt::Display for PathTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathTarget {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PathTarget {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<PathTarget> for String {
    fn from(value: PathTarget) -> Self {
        value.0
    }
}

/// An opaque surrogate key attached to responses at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTarget(String);

impl KeyTarget {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key shared by every response rendered from one record: `{table}/{id}`.
    pub fn record(table: &str, id: i64) -> Self {
        Self(format!("{table}/{id}"))
    }

    /// Key shared by every response rendered from any record of a table.
    pub fn table(table: &str) -> Self {
        Self(table.to_string())
    }
}

impl fmt::Display for KeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyTarget {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Records that tag their rendered responses with surrogate keys.
pub trait SurrogateKeyed {
    /// Table name used as the key namespace.
    const TABLE: &'static str;

    fn record_id(&self) -> Option<i64>;

    /// Key for `purge`: this record only. `None` for unsaved records.
    fn record_key(&self) -> Option<KeyTarget> {
        self.record_id().map(|id| KeyTarget::record(Self::TABLE, id))
    }

    /// Key for `purge_all`: every record of this type.
    fn table_key() -> KeyTarget {
        KeyTarget::table(Self::TABLE)
    }
}

macro_rules! surrogate_keyed {
    ($($ty:ty => $table:literal),+ $(,)?) => {
        $(
            impl SurrogateKeyed for $ty {
                const TABLE: &'static str = $table;

                fn record_id(&self) -> Option<i64> {
                    self.id
                }
            }
        )+
    };
}

surrogate_keyed! {
    Article => "articles",
    Comment => "comments",
    Tag => "tags",
    User => "users",
    Organization => "organizations",
    Listing => "listings",
    Page => "pages",
    Podcast => "podcasts",
    PodcastEpisode => "podcast_episodes",
}

impl Commentable {
    pub fn record_key(&self) -> Option<KeyTarget> {
        match self {
            Commentable::Article(article) => article.record_key(),
            Commentable::PodcastEpisode(episode) => episode.record_key(),
        }
    }
}
