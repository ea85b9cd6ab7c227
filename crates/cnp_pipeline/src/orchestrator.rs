use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cnp_core::config::PipelineConfig;
use cnp_core::{
    fetch_all, ArticleRecord, ArticleSource, ContentExtractor, EnrichedArticle, PostComposer, PostPayload, Publisher,
    Ranker, Sleeper, Summarizer, TokioSleeper,
};
use cnp_storage::{normalize_url, DedupStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::{BackoffPolicy, PublishEvent, PublishState};
use crate::queue::{bounded, QueueConsumer, QueueProducer};

/// Collaborators of one pipeline.
pub struct PipelineParts {
    pub sources: Vec<Arc<dyn ArticleSource>>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub store: Arc<DedupStore>,
    pub ranker: Arc<dyn Ranker>,
    pub summarizer: Arc<dyn Summarizer>,
    pub composer: Arc<dyn PostComposer>,
    pub publisher: Arc<dyn Publisher>,
}

/// Counters of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    /// Records that passed dedup and were queued for ranking.
    pub processed: usize,
    pub duplicates: usize,
    pub unextracted: usize,
    pub ranked: usize,
    pub composed: usize,
    pub posted: usize,
    pub abandoned: usize,
    pub cancelled: bool,
}

pub struct Orchestrator {
    parts: PipelineParts,
    config: PipelineConfig,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Orchestrator {
    pub fn new(parts: PipelineParts, config: PipelineConfig) -> Self {
        Self {
            parts,
            backoff: BackoffPolicy::from_config(&config),
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn store(&self) -> &Arc<DedupStore> {
        &self.parts.store
    }

    /// Run one fetch-to-publish cycle. Never fails; problems are logged and
    /// reflected in the report.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        if cancel.is_cancelled() {
            info!("Shutdown already requested, not starting the cycle");
            report.cancelled = true;
            return report;
        }

        let records = fetch_all(&self.parts.sources).await;
        report.fetched = records.len();
        if records.is_empty() {
            info!("📰 No articles fetched, nothing to do");
            return report;
        }
        info!("📰 Fetched {} candidate articles", records.len());

        let records = self.enrich(records).await;

        let (article_tx, mut article_rx) = bounded(self.config.queue_capacity);
        let ((), batch) = tokio::join!(self.filter(records, article_tx, &mut report), article_rx.drain());

        if cancel.is_cancelled() {
            report.cancelled = true;
            return self.summarize(report);
        }

        let mut ranked = self.rank(batch).await;
        ranked.truncate(self.config.max_posts_per_run);
        report.ranked = ranked.len();

        let (post_tx, post_rx) = bounded(self.config.queue_capacity);
        let (composed, (posted, abandoned, cancelled)) =
            tokio::join!(self.compose(ranked, post_tx, cancel), self.publish_all(post_rx, cancel));
        report.composed = composed;
        report.posted = posted;
        report.abandoned = abandoned;
        report.cancelled = cancelled;

        self.summarize(report)
    }

    /// Fill missing bodies through the extractor. Order is preserved.
    async fn enrich(&self, records: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
        let extractor = &self.parts.extractor;
        stream::iter(records)
            .map(|mut record| async move {
                if !record.has_body() {
                    match extractor.extract(&record.link).await {
                        Ok(extraction) => record.enrich(extraction),
                        Err(e) => debug!("Extraction failed for {}: {}", record.link, e),
                    }
                }
                record
            })
            .buffered(self.config.enrich_concurrency.max(1))
            .collect()
            .await
    }

    async fn filter(&self, records: Vec<ArticleRecord>, queue: QueueProducer<EnrichedArticle>, report: &mut CycleReport) {
        let store = &self.parts.store;
        let mut seen = HashSet::new();

        for record in records {
            let mut article = match EnrichedArticle::try_from(record) {
                Ok(article) => article,
                Err(record) => {
                    report.unextracted += 1;
                    debug!("Skipping {} without a body", record.link);
                    continue;
                }
            };

            if !seen.insert(normalize_url(&article.link)) || store.is_known(&article.link, &article.full_text).await {
                report.duplicates += 1;
                info!("🔍 Already seen: {}", article.link);
                continue;
            }
            if store.is_duplicate(&article.full_text).await {
                report.duplicates += 1;
                info!("🔍 Skipping near-duplicate: {}", article.title);
                continue;
            }

            if article.snippet.chars().count() > self.config.snippet_limit {
                let summary = self.parts.summarizer.summarize(&article.full_text).await;
                if let Some(reason) = summary.reason() {
                    warn!("Snippet condensed by truncation for {}: {}", article.link, reason);
                }
                article.snippet = summary.into_value();
            }

            if let Err(closed) = queue.push(article).await {
                error!("Article queue closed, dropping {}", closed.0.link);
                break;
            }
            report.processed += 1;
        }
    }

    async fn rank(&self, batch: Vec<EnrichedArticle>) -> Vec<EnrichedArticle> {
        if batch.is_empty() {
            return batch;
        }
        let outcome = self.parts.ranker.rank(batch).await;
        if let Some(reason) = outcome.reason() {
            warn!("🏆 Ranking degraded to input order: {}", reason);
        }
        let ranked = outcome.into_value();
        info!("🏆 Ranker selected {} articles", ranked.len());
        ranked
    }

    async fn compose(&self, articles: Vec<EnrichedArticle>, queue: QueueProducer<PostPayload>, cancel: &CancellationToken) -> usize {
        let mut composed = 0;
        for article in articles {
            if cancel.is_cancelled() {
                break;
            }
            match self.parts.composer.compose(&article).await {
                Ok(payload) => {
                    if queue.push(payload).await.is_err() {
                        break;
                    }
                    composed += 1;
                }
                Err(e) => error!("Failed to compose post for {}: {}", article.link, e),
            }
        }
        composed
    }

    /// Publish queued payloads in order. Returns (posted, abandoned, cancelled).
    async fn publish_all(&self, mut queue: QueueConsumer<PostPayload>, cancel: &CancellationToken) -> (usize, usize, bool) {
        let (mut posted, mut abandoned) = (0, 0);
        let mut pause: Option<Duration> = None;

        while let Some(payload) = queue.pop().await {
            if let Some(delay) = pause.take() {
                info!(delay_secs = delay.as_secs(), "⏳ Pacing before next post");
                if !self.pause(delay, cancel).await {
                    break;
                }
            }
            if cancel.is_cancelled() {
                break;
            }

            match self.publish_with_retries(&payload, cancel).await {
                PublishState::Published { receipt, attempts } => {
                    info!(link = %payload.link(), attempts, "🐦 Published post {}", receipt.post_id);
                    self.parts.store.record_publication(payload.link(), payload.full_text()).await;
                    posted += 1;
                    pause = Some(payload.recommended_delay());
                }
                PublishState::Abandoned { reason, attempts } => {
                    error!(link = %payload.link(), attempts, "🐦 Giving up on post: {}", reason);
                    abandoned += 1;
                }
                other => error!("Publish ended in non-terminal state {:?}", other),
            }
        }

        let cancelled = cancel.is_cancelled();
        if cancelled {
            let skipped = queue.drain().await.len();
            if skipped > 0 {
                warn!("Shutdown requested, {} composed posts left unpublished", skipped);
            }
        }
        (posted, abandoned, cancelled)
    }

    /// Drive one payload through the publish state machine. The publish call
    /// itself is never interrupted; only backoff waits observe cancellation.
    async fn publish_with_retries(&self, payload: &PostPayload, cancel: &CancellationToken) -> PublishState {
        let mut state = PublishState::Pending.on(PublishEvent::Start, &self.backoff);
        loop {
            let event = match &state {
                PublishState::Publishing { attempt } => {
                    debug!(link = %payload.link(), attempt, "🐦 Publishing via {}", self.parts.publisher.name());
                    match self.parts.publisher.publish(payload).await {
                        Ok(receipt) => PublishEvent::Succeeded(receipt),
                        Err(e) => PublishEvent::Failed(e),
                    }
                }
                PublishState::Retrying { attempt, delay, error } => {
                    warn!(
                        link = %payload.link(),
                        attempt,
                        delay_secs = delay.as_secs(),
                        kind = error.kind(),
                        "🐦 Publish failed ({}), backing off",
                        error
                    );
                    if self.pause(*delay, cancel).await {
                        PublishEvent::BackoffElapsed
                    } else {
                        PublishEvent::Cancelled
                    }
                }
                _ => return state,
            };
            state = state.on(event, &self.backoff);
        }
    }

    /// Sleep unless cancelled first. Returns false when cancelled.
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = self.sleeper.sleep(delay) => true,
        }
    }

    fn summarize(&self, report: CycleReport) -> CycleReport {
        info!(
            "📊 Cycle finished: fetched={} processed={} posted={}",
            report.fetched, report.processed, report.posted
        );
        if report.posted == 0 {
            if report.cancelled {
                warn!("No posts published: cycle cancelled");
            } else if report.processed == 0 {
                warn!("No posts published: no novel content ({} duplicates, {} without body)", report.duplicates, report.unextracted);
            } else if report.abandoned > 0 {
                warn!("No posts published: {} publish failures", report.abandoned);
            } else {
                warn!("No posts published: nothing survived ranking and composing");
            }
        }
        report
    }
}
