use std::sync::Arc;

use edgecache::cache::testing::{FakeAdapter, FakeBehavior};
use edgecache::cache::{
    BustConsumer, BustQueue, CacheTrigger, Content, EdgeCache, FixedClock, KeyPurgeOrchestrator,
    PathBustOrchestrator, PolicyContext, QueueConfig, TimeWindowPlanner,
};
use edgecache::domain::entities::{Article, Comment, Commentable, Listing, Page, Tag, User};
use time::OffsetDateTime;
use time::macros::datetime;

const NOW: OffsetDateTime = datetime!(2024-06-15 12:00 UTC);

struct Harness {
    cdn: Arc<FakeAdapter>,
    proxy: Arc<FakeAdapter>,
    clock: Arc<FixedClock>,
    engine: EdgeCache,
}

fn harness(cdn: FakeAdapter, proxy: FakeAdapter) -> Harness {
    let cdn = Arc::new(cdn);
    let proxy = Arc::new(proxy);
    let clock = Arc::new(FixedClock::new(NOW));
    let planner = TimeWindowPlanner::new(clock.clone(), 2016);

    let paths = PathBustOrchestrator::new(vec![cdn.clone(), proxy.clone()]);
    let keys = KeyPurgeOrchestrator::new(Some(cdn.clone()), paths.clone());
    let engine = EdgeCache::new(PolicyContext::new(planner), paths, keys);

    Harness {
        cdn,
        proxy,
        clock,
        engine,
    }
}

fn both_up() -> Harness {
    harness(
        FakeAdapter::new("cdn", FakeBehavior::Succeed),
        FakeAdapter::new("proxy", FakeBehavior::Succeed),
    )
}

fn proxy_only() -> Harness {
    harness(
        FakeAdapter::unconfigured("cdn"),
        FakeAdapter::new("proxy", FakeBehavior::Succeed),
    )
}

fn article() -> Article {
    Article {
        id: Some(42),
        path: Some("/ben/hello-4jk2".to_string()),
        published_at: Some(datetime!(2024-06-13 09:00 UTC)),
        tags: vec!["rust".to_string(), "webdev".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn tag_rename_busts_exact_path_set() {
    let h = proxy_only();
    h.engine
        .invalidate(&Content::Tag(Tag {
            id: Some(7),
            name: Some("ruby".to_string()),
        }))
        .await;

    assert_eq!(
        h.proxy.paths(),
        vec!["/t/ruby", "/t/ruby?i=i", "/t/ruby/", "/t/ruby/?i=i", "/tags"]
    );
    assert_eq!(h.cdn.calls(), 0);
}

#[tokio::test]
async fn page_bust_sends_every_path_to_both_adapters() {
    let h = both_up();
    h.engine
        .invalidate(&Content::Page(Page {
            id: Some(1),
            slug: Some("code-of-conduct".to_string()),
        }))
        .await;

    let expected = vec![
        "/page/code-of-conduct",
        "/page/code-of-conduct?i=i",
        "/code-of-conduct",
        "/code-of-conduct?i=i",
    ];
    assert_eq!(h.cdn.paths(), expected);
    assert_eq!(h.proxy.paths(), expected);
}

#[tokio::test]
async fn every_busted_path_carries_its_variant() {
    let h = proxy_only();
    h.engine.invalidate(&Content::Article(article())).await;

    let busted = h.proxy.paths();
    for path in busted.iter().filter(|path| !path.contains("i=i")) {
        let variant = if path.contains('?') {
            format!("{path}&i=i")
        } else {
            format!("{path}?i=i")
        };
        assert!(busted.contains(&variant), "{path} busted without {variant}");
    }
}

#[tokio::test]
async fn article_busts_each_tag_timeframe_listing() {
    let h = both_up();
    h.engine.invalidate(&Content::Article(article())).await;

    let busted = h.proxy.paths();
    for label in ["week", "month", "year", "infinity"] {
        assert!(busted.contains(&format!("/top/{label}")));
        for tag in ["rust", "webdev"] {
            assert!(busted.contains(&format!("/t/{tag}/top/{label}")));
            assert!(busted.contains(&format!("/t/{tag}/top/{label}?i=i")));
        }
    }
    assert_eq!(h.cdn.keys(), vec!["articles/42"]);
}

#[tokio::test]
async fn timeframe_buckets_follow_the_clock() {
    let h = both_up();

    h.engine.invalidate(&Content::Article(article())).await;
    assert!(h.proxy.paths().contains(&"/top/week".to_string()));

    // Three weeks on, the article has dropped out of the weekly listing.
    h.clock.advance(time::Duration::weeks(3));
    let later = harness_paths_after(&h, article()).await;
    assert!(!later.contains(&"/top/week".to_string()));
    assert!(later.contains(&"/top/month".to_string()));
}

async fn harness_paths_after(h: &Harness, article: Article) -> Vec<String> {
    let before = h.proxy.paths().len();
    h.engine.invalidate(&Content::Article(article)).await;
    h.proxy.paths().split_off(before)
}

#[tokio::test]
async fn comment_with_keyed_provider_purges_keys_only() {
    let h = both_up();
    let commentable = Commentable::Article(Article {
        id: Some(9),
        path: Some("/amy/post-1".to_string()),
        ..Default::default()
    });
    let comment = Comment {
        id: Some(77),
        id_code: Some("2bc".to_string()),
        username: Some("sam".to_string()),
    };

    h.engine
        .invalidate(&Content::Comment {
            commentable: Some(commentable),
            comment: Some(comment),
        })
        .await;

    assert_eq!(h.cdn.keys(), vec!["articles/9", "comments/77"]);
    // Only the comment-count pages are busted directly; fallbacks are not.
    assert!(!h.proxy.paths().contains(&"/amy/post-1".to_string()));
    assert!(!h.proxy.paths().contains(&"/sam/comment/2bc".to_string()));
    assert!(h.proxy.paths().contains(&"/amy/post-1/comments".to_string()));
}

#[tokio::test]
async fn comment_without_keyed_provider_busts_fallbacks() {
    let h = proxy_only();
    let commentable = Commentable::Article(Article {
        id: Some(9),
        path: Some("/amy/post-1".to_string()),
        ..Default::default()
    });
    let comment = Comment {
        id: Some(77),
        id_code: Some("2bc".to_string()),
        username: Some("sam".to_string()),
    };

    h.engine
        .invalidate(&Content::Comment {
            commentable: Some(commentable),
            comment: Some(comment),
        })
        .await;

    let busted = h.proxy.paths();
    assert!(busted.contains(&"/amy/post-1".to_string()));
    assert!(busted.contains(&"/sam/comment/2bc".to_string()));
    assert!(h.cdn.keys().is_empty());
}

#[tokio::test]
async fn no_configured_providers_is_silent_no_op() {
    let h = harness(
        FakeAdapter::unconfigured("cdn"),
        FakeAdapter::unconfigured("proxy"),
    );

    let report = h
        .engine
        .invalidate(&Content::User(User {
            id: Some(1),
            username: Some("ben".to_string()),
        }))
        .await;

    assert_eq!(report.attempted, 0);
    assert_eq!(h.cdn.calls() + h.proxy.calls(), 0);
}

#[tokio::test]
async fn failing_provider_does_not_block_the_other() {
    let h = harness(
        FakeAdapter::new("cdn", FakeBehavior::Fail),
        FakeAdapter::new("proxy", FakeBehavior::Succeed),
    );

    let report = h
        .engine
        .invalidate(&Content::Listing(Listing {
            id: Some(3),
            category: Some("jobs".to_string()),
            slug: Some("rust-dev".to_string()),
        }))
        .await;

    assert!(h.proxy.paths().contains(&"/listings/jobs/rust-dev".to_string()));
    assert!(report.failed > 0);
    assert!(report.succeeded() > 0);
}

#[tokio::test]
async fn repeated_invalidation_issues_identical_calls() {
    let h = both_up();
    let content = Content::Article(article());

    h.engine.invalidate(&content).await;
    let first_paths = h.proxy.paths();
    let first_keys = h.cdn.keys();

    h.engine.invalidate(&content).await;
    let all_paths = h.proxy.paths();
    let all_keys = h.cdn.keys();

    assert_eq!(&all_paths[first_paths.len()..], first_paths.as_slice());
    assert_eq!(&all_keys[first_keys.len()..], first_keys.as_slice());
}

#[tokio::test]
async fn deferred_trigger_batches_until_consumed() {
    let h = both_up();
    let engine = Arc::new(h.engine);
    let queue = Arc::new(BustQueue::new());
    let consumer = Arc::new(BustConsumer::new(
        QueueConfig::default(),
        engine.clone(),
        queue.clone(),
    ));
    let trigger = CacheTrigger::new(engine, queue.clone(), consumer.clone());

    for name in ["ruby", "go"] {
        trigger
            .enqueue(&Content::Tag(Tag {
                id: None,
                name: Some(name.to_string()),
            }))
            .await;
    }
    assert_eq!(queue.len(), 2);
    assert_eq!(h.proxy.calls(), 0);

    assert!(consumer.consume().await);
    let busted = h.proxy.paths();
    assert_eq!(busted.iter().filter(|path| *path == "/tags").count(), 1);
    assert!(busted.contains(&"/t/go/".to_string()));
}

#[tokio::test]
async fn unrooted_article_path_stays_on_the_site() {
    let h = both_up();
    h.engine
        .invalidate(&Content::Article(Article {
            id: Some(3),
            path: Some("evil.example/x".to_string()),
            ..Default::default()
        }))
        .await;

    let busted = h.cdn.paths();
    assert!(!busted.is_empty());
    assert!(busted.iter().all(|path| path.starts_with('/')));
    assert!(busted.contains(&"/evil.example/x".to_string()));
}
