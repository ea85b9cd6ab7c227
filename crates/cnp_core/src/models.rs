use async_trait::async_trait;

use crate::outcome::Outcome;
use crate::types::{truncate_chars, EnrichedArticle};

/// How many records a ranker keeps when it has to fall back to input order.
pub const FALLBACK_RANK_COUNT: usize = 3;

/// How many characters a summarizer keeps when it has to fall back to truncation.
pub const FALLBACK_SUMMARY_CHARS: usize = 200;

#[async_trait]
pub trait Ranker: Send + Sync {
    /// Return an ordered subset of `candidates`, best first. Never fails: an
    /// implementation that cannot rank returns [`fallback_ranking`] as a
    /// degraded outcome.
    async fn rank(&self, candidates: Vec<EnrichedArticle>) -> Outcome<Vec<EnrichedArticle>>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense an article body into a short post-sized string. Never fails:
    /// falls back to [`fallback_summary`].
    async fn summarize(&self, full_text: &str) -> Outcome<String>;
}

pub fn fallback_ranking(mut candidates: Vec<EnrichedArticle>) -> Vec<EnrichedArticle> {
    candidates.truncate(FALLBACK_RANK_COUNT);
    candidates
}

pub fn fallback_summary(full_text: &str) -> String {
    truncate_chars(full_text, FALLBACK_SUMMARY_CHARS)
}
