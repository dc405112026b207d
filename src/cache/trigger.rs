//! Cache trigger service.
//!
//! Entry point for write paths: plans the bust for a changed record, queues
//! it, and optionally drains the queue right away.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::consumer::BustConsumer;
use super::engine::EdgeCache;
use super::events::BustQueue;
use super::policy::Content;
use crate::domain::entities::{Article, Comment, Commentable, Tag, User};

/// Publishes planned busts and owns the consumer that executes them.
///
/// ```ignore
/// // After an article is saved:
/// trigger.article_changed(&article).await;
/// ```
pub struct CacheTrigger {
    engine: Arc<EdgeCache>,
    queue: Arc<BustQueue>,
    consumer: Arc<BustConsumer>,
}

impl CacheTrigger {
    pub fn new(engine: Arc<EdgeCache>, queue: Arc<BustQueue>, consumer: Arc<BustConsumer>) -> Self {
        Self {
            engine,
            queue,
            consumer,
        }
    }

    /// Plan and enqueue; with `consume_now` the queue is drained before returning.
    pub async fn trigger(&self, content: &Content, consume_now: bool) -> Option<Uuid> {
        let request = self.engine.plan(content);
        let id = self.queue.publish(content.kind(), request);
        if id.is_none() {
            debug!(kind = content.kind(), "Trigger produced nothing to bust");
        }

        if consume_now {
            self.consumer.consume_all().await;
        }
        id
    }

    pub async fn article_changed(&self, article: &Article) -> Option<Uuid> {
        self.trigger(&Content::Article(article.clone()), true).await
    }

    /// A comment was created, edited or removed on `commentable`.
    pub async fn comment_changed(
        &self,
        commentable: &Commentable,
        comment: Option<&Comment>,
    ) -> Option<Uuid> {
        let content = Content::Comment {
            commentable: Some(commentable.clone()),
            comment: comment.cloned(),
        };
        self.trigger(&content, true).await
    }

    pub async fn tag_changed(&self, tag: &Tag) -> Option<Uuid> {
        self.trigger(&Content::Tag(tag.clone()), true).await
    }

    pub async fn user_changed(&self, user: &User) -> Option<Uuid> {
        self.trigger(&Content::User(user.clone()), true).await
    }

    /// Deferred variant: queued only, picked up by the auto-consume loop.
    pub async fn enqueue(&self, content: &Content) -> Option<Uuid> {
        self.trigger(content, false).await
    }

    pub fn engine(&self) -> &Arc<EdgeCache> {
        &self.engine
    }

    pub fn queue(&self) -> &Arc<BustQueue> {
        &self.queue
    }

    pub fn consumer(&self) -> &Arc<BustConsumer> {
        &self.consumer
    }
}
