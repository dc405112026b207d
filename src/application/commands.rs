//! CLI command execution against an [`EdgeCache`].

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{
    BustConsumer, BustQueue, CacheTrigger, Content, EdgeCache, InvalidationRequest, KeyTarget,
    PathTarget, PurgeReport, QueueConfig, TimeBucket,
};
use crate::config::{BustArgs, Command, InvalidateArgs, PurgeArgs};

use super::error::AppError;

const STDIN_MARKER: &str = "-";

/// Machine-readable result of one command.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Outcome {
    Bust {
        paths: Vec<PathTarget>,
        providers: Vec<&'static str>,
        report: PurgeReport,
    },
    Purge {
        keys: Vec<KeyTarget>,
        keyed: bool,
        report: PurgeReport,
    },
    Invalidate {
        kind: &'static str,
        request: InvalidationRequest,
        /// Absent on a dry run.
        report: Option<PurgeReport>,
    },
    Deferred {
        documents: usize,
        /// Ids of the queued events; documents with nothing to bust are skipped.
        events: Vec<Uuid>,
        report: PurgeReport,
    },
    Timeframes {
        #[serde(with = "time::serde::rfc3339")]
        now: OffsetDateTime,
        buckets: Vec<BucketView>,
    },
}

impl Outcome {
    /// Whether any provider call failed.
    pub fn has_failures(&self) -> bool {
        match self {
            Outcome::Bust { report, .. }
            | Outcome::Purge { report, .. }
            | Outcome::Deferred { report, .. } => report.failed > 0,
            Outcome::Invalidate { report, .. } => report.is_some_and(|report| report.failed > 0),
            Outcome::Timeframes { .. } => false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketView {
    pub label: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub boundary: OffsetDateTime,
}

impl From<&TimeBucket> for BucketView {
    fn from(bucket: &TimeBucket) -> Self {
        Self {
            label: bucket.label(),
            boundary: bucket.boundary(),
        }
    }
}

pub async fn execute(
    command: &Command,
    engine: &Arc<EdgeCache>,
    queue: &QueueConfig,
) -> Result<Outcome, AppError> {
    match command {
        Command::Bust(args) => Ok(bust(args, engine).await),
        Command::Purge(args) => Ok(purge(args, engine).await),
        Command::Invalidate(args) if args.defer => defer(args, engine, queue).await,
        Command::Invalidate(args) => invalidate(args, engine).await,
        Command::Timeframes => Ok(timeframes(engine)),
    }
}

async fn bust(args: &BustArgs, engine: &EdgeCache) -> Outcome {
    let mut request = InvalidationRequest::new();
    for path in &args.paths {
        if args.exact {
            request.bust(path.as_str());
        } else {
            request.bust_pair(path.as_str());
        }
    }

    let report = engine.execute(&request).await;
    Outcome::Bust {
        paths: request.paths,
        providers: engine.active_providers(),
        report,
    }
}

async fn purge(args: &PurgeArgs, engine: &EdgeCache) -> Outcome {
    let mut request = InvalidationRequest::new();
    for key in &args.keys {
        request.purge(KeyTarget::new(key.as_str()), args.fallbacks.iter().cloned());
    }

    let report = engine.execute(&request).await;
    Outcome::Purge {
        keys: request.keys,
        keyed: engine.keyed_active(),
        report,
    }
}

async fn invalidate(args: &InvalidateArgs, engine: &EdgeCache) -> Result<Outcome, AppError> {
    let raw = read_input(&args.input)?;
    let content = parse_content(&raw)?;
    let kind = content.kind();
    let request = engine.plan(&content);

    if args.dry_run {
        info!(kind, request = %request, "Dry run; no provider contacted");
        return Ok(Outcome::Invalidate {
            kind,
            request,
            report: None,
        });
    }

    let report = engine.execute(&request).await;
    Ok(Outcome::Invalidate {
        kind,
        request,
        report: Some(report),
    })
}

/// Queue each document through the trigger, then drain in merged batches.
async fn defer(
    args: &InvalidateArgs,
    engine: &Arc<EdgeCache>,
    config: &QueueConfig,
) -> Result<Outcome, AppError> {
    let raw = read_input(&args.input)?;
    let contents = parse_contents(&raw)?;

    let queue = Arc::new(BustQueue::with_max_len(config.queue_max_len()));
    let consumer = Arc::new(BustConsumer::new(
        config.clone(),
        Arc::clone(engine),
        Arc::clone(&queue),
    ));
    let trigger = CacheTrigger::new(Arc::clone(engine), queue, consumer);

    let mut events = Vec::with_capacity(contents.len());
    for content in &contents {
        if let Some(id) = trigger.enqueue(content).await {
            events.push(id);
        }
    }
    info!(
        documents = contents.len(),
        queued = trigger.queue().len(),
        "Deferred busts queued"
    );

    let report = trigger.consumer().consume_all().await;
    Ok(Outcome::Deferred {
        documents: contents.len(),
        events,
        report,
    })
}

fn timeframes(engine: &EdgeCache) -> Outcome {
    let context = engine.context();
    Outcome::Timeframes {
        now: context.now(),
        buckets: context.buckets().iter().map(BucketView::from).collect(),
    }
}

/// Decode a `{"kind": ..., "entity": ...}` document.
pub fn parse_content(raw: &str) -> Result<Content, AppError> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::input(format!("failed to parse content: {err}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Documents {
    Many(Vec<Content>),
    One(Box<Content>),
}

/// Decode one document or an array of them.
pub fn parse_contents(raw: &str) -> Result<Vec<Content>, AppError> {
    let documents: Documents = serde_json::from_str(raw)
        .map_err(|err| AppError::input(format!("failed to parse content: {err}")))?;
    Ok(match documents {
        Documents::Many(contents) => contents,
        Documents::One(content) => vec![*content],
    })
}

fn read_input(path: &Path) -> Result<String, AppError> {
    if path.as_os_str() == STDIN_MARKER {
        debug!("Reading content from stdin");
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|err| AppError::input(format!("failed to read stdin: {err}")))?;
        return Ok(raw);
    }

    std::fs::read_to_string(path).map_err(|err| {
        AppError::input(format!("failed to read `{}`: {err}", path.display()))
    })
}
