#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cnp_core::config::{DedupConfig, PipelineConfig};
use cnp_core::{
    ArticleRecord, ArticleSource, ContentExtractor, EnrichedArticle, Error, Extraction, Outcome, PostComposer,
    PostPayload, PublishError, PublishReceipt, Publisher, Ranker, Result, Sleeper, SourceKind, Summarizer,
};
use cnp_pipeline::{Orchestrator, PipelineParts};
use cnp_storage::DedupStore;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub const PACING: Duration = Duration::from_secs(45);

pub struct StaticSource {
    pub kind: SourceKind,
    pub records: Vec<ArticleRecord>,
}

#[async_trait]
impl ArticleSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<ArticleRecord>> {
        Ok(self.records.clone())
    }
}

/// Serves bodies by link; unknown links fail.
#[derive(Default)]
pub struct MapExtractor {
    pub bodies: HashMap<String, String>,
}

#[async_trait]
impl ContentExtractor for MapExtractor {
    async fn extract(&self, link: &str) -> Result<Extraction> {
        let text = self
            .bodies
            .get(link)
            .cloned()
            .ok_or_else(|| Error::Extraction(format!("no body for {}", link)))?;
        Ok(Extraction {
            title: String::new(),
            summary: text.split_whitespace().take(5).collect::<Vec<_>>().join(" "),
            text,
            publish_date: None,
        })
    }
}

/// Returns every candidate, optionally padded with copies to simulate an
/// over-eager ranker.
#[derive(Default)]
pub struct PassThroughRanker {
    pub pad_to: usize,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl Ranker for PassThroughRanker {
    async fn rank(&self, candidates: Vec<EnrichedArticle>) -> Outcome<Vec<EnrichedArticle>> {
        *self.calls.lock().unwrap() += 1;
        let mut ranked = candidates.clone();
        let mut i = 0;
        while ranked.len() < self.pad_to && !candidates.is_empty() {
            let mut copy = candidates[i % candidates.len()].clone();
            copy.link = format!("{}#copy{}", copy.link, i);
            ranked.push(copy);
            i += 1;
        }
        Outcome::Fresh(ranked)
    }
}

#[derive(Default)]
pub struct CountingSummarizer {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, full_text: &str) -> Outcome<String> {
        *self.calls.lock().unwrap() += 1;
        Outcome::Fresh(full_text.chars().take(50).collect())
    }
}

#[derive(Default)]
pub struct PlainComposer {
    pub composed: Mutex<Vec<String>>,
}

#[async_trait]
impl PostComposer for PlainComposer {
    async fn compose(&self, article: &EnrichedArticle) -> Result<PostPayload> {
        self.composed.lock().unwrap().push(article.link.clone());
        Ok(PostPayload::new(
            format!("{} {}", article.title, article.snippet),
            None,
            article.link.clone(),
            article.full_text.clone(),
            PACING,
        ))
    }
}

/// Plays back scripted results, then succeeds.
#[derive(Default)]
pub struct ScriptedPublisher {
    pub script: Mutex<VecDeque<std::result::Result<(), PublishError>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedPublisher {
    pub fn failing_with(errors: Vec<PublishError>) -> Self {
        Self {
            script: Mutex::new(errors.into_iter().map(Err).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn publish(&self, payload: &PostPayload) -> std::result::Result<PublishReceipt, PublishError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(payload.link().to_string());
            calls.len()
        };
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))?;
        Ok(PublishReceipt { post_id: n.to_string() })
    }
}

/// Records requested sleeps and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Cancels the token on the first sleep and never wakes up.
pub struct CancellingSleeper {
    pub token: CancellationToken,
}

#[async_trait]
impl Sleeper for CancellingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.token.cancel();
        std::future::pending::<()>().await;
    }
}

/// Blocks every sleep until released, announcing when a sleep starts.
#[derive(Default)]
pub struct GateSleeper {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl Sleeper for GateSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

pub fn record(title: &str, link: &str) -> ArticleRecord {
    ArticleRecord::candidate(title, format!("{} snippet", title), link)
}

pub async fn store_in(dir: &Path) -> Arc<DedupStore> {
    Arc::new(DedupStore::load(dir.join("posted.json"), DedupConfig::default()).await)
}

pub struct Harness {
    pub ranker: Arc<PassThroughRanker>,
    pub summarizer: Arc<CountingSummarizer>,
    pub composer: Arc<PlainComposer>,
    pub publisher: Arc<ScriptedPublisher>,
    pub store: Arc<DedupStore>,
}

impl Harness {
    pub fn new(store: Arc<DedupStore>, publisher: ScriptedPublisher, ranker: PassThroughRanker) -> Self {
        Self {
            ranker: Arc::new(ranker),
            summarizer: Arc::new(CountingSummarizer::default()),
            composer: Arc::new(PlainComposer::default()),
            publisher: Arc::new(publisher),
            store,
        }
    }

    pub fn orchestrator(
        &self,
        records: Vec<ArticleRecord>,
        extractor: MapExtractor,
        sleeper: Arc<dyn Sleeper>,
    ) -> Orchestrator {
        let parts = PipelineParts {
            sources: vec![Arc::new(StaticSource {
                kind: SourceKind::Feed,
                records,
            })],
            extractor: Arc::new(extractor),
            store: self.store.clone(),
            ranker: self.ranker.clone(),
            summarizer: self.summarizer.clone(),
            composer: self.composer.clone(),
            publisher: self.publisher.clone(),
        };
        Orchestrator::new(parts, PipelineConfig::default()).with_sleeper(sleeper)
    }
}
