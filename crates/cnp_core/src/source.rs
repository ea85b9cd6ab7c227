use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::types::{ArticleRecord, Extraction};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceKind {
    Feed,
    Scrape,
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Human readable name, used in logs
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Fetch the current candidate records, in source order
    async fn fetch(&self) -> Result<Vec<ArticleRecord>>;
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Download and extract the readable body behind `link`
    async fn extract(&self, link: &str) -> Result<Extraction>;
}

/// Query every source and concatenate the results, feed sources first. A
/// failing source is logged and contributes nothing.
pub async fn fetch_all(sources: &[Arc<dyn ArticleSource>]) -> Vec<ArticleRecord> {
    let mut ordered: Vec<&Arc<dyn ArticleSource>> = sources.iter().collect();
    ordered.sort_by_key(|s| s.kind());

    let mut records = Vec::new();
    for source in ordered {
        match source.fetch().await {
            Ok(mut fetched) => {
                info!("📰 Fetched {} entries from {}", fetched.len(), source.name());
                records.append(&mut fetched);
            }
            Err(e) => error!("Failed to fetch from {}: {}", source.name(), e),
        }
    }
    records
}
