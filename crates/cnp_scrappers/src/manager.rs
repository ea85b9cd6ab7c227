use std::sync::Arc;

use cnp_core::config::SourceConfig;
use cnp_core::{fetch_all, ArticleRecord, ArticleSource, ContentExtractor, Result};
use tracing::info;

use crate::scrapers::build_client;
use crate::scrapers::extractor::HtmlExtractor;
use crate::scrapers::feed::FeedSource;
use crate::scrapers::page::ScrapeSource;

/// Owns the configured sources and the extractor they share.
pub struct SourceManager {
    sources: Vec<Arc<dyn ArticleSource>>,
    extractor: Arc<dyn ContentExtractor>,
}

impl SourceManager {
    pub fn new(extractor: Arc<dyn ContentExtractor>) -> Self {
        Self {
            sources: Vec::new(),
            extractor,
        }
    }

    /// One feed source per configured feed and one scrape source per landing
    /// page, all sharing a single HTTP client.
    pub fn from_config(config: Arc<SourceConfig>) -> Result<Self> {
        let client = build_client(&config)?;
        let extractor: Arc<dyn ContentExtractor> = Arc::new(HtmlExtractor::new(client.clone()));
        let mut manager = Self::new(extractor.clone());

        for feed in &config.feeds {
            manager.add_source(Arc::new(FeedSource::new(feed, client.clone(), config.clone())));
        }
        for page in &config.scrape_pages {
            manager.add_source(Arc::new(ScrapeSource::new(
                page,
                client.clone(),
                config.clone(),
                extractor.clone(),
            )));
        }

        info!(
            "📰 Configured {} feeds and {} landing pages",
            config.feeds.len(),
            config.scrape_pages.len()
        );
        Ok(manager)
    }

    pub fn add_source(&mut self, source: Arc<dyn ArticleSource>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Arc<dyn ArticleSource>] {
        &self.sources
    }

    pub fn extractor(&self) -> Arc<dyn ContentExtractor> {
        self.extractor.clone()
    }

    pub async fn fetch_all(&self) -> Vec<ArticleRecord> {
        fetch_all(&self.sources).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnp_core::SourceKind;

    #[test]
    fn test_from_config_builds_every_source() {
        let config = SourceConfig {
            feeds: vec!["https://a.example/rss".into(), "https://b.example/rss".into()],
            scrape_pages: vec!["https://a.example/".into()],
            ..SourceConfig::default()
        };
        let manager = SourceManager::from_config(Arc::new(config)).unwrap();

        let kinds: Vec<SourceKind> = manager.sources().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![SourceKind::Feed, SourceKind::Feed, SourceKind::Scrape]);
        assert_eq!(manager.sources()[2].name(), "https://a.example/");
    }

    #[tokio::test]
    async fn test_unreachable_sources_yield_nothing() {
        let config = SourceConfig {
            feeds: vec!["http://127.0.0.1:9/rss".into()],
            scrape_pages: vec!["http://127.0.0.1:9/".into()],
            request_timeout_secs: 1,
            ..SourceConfig::default()
        };
        let manager = SourceManager::from_config(Arc::new(config)).unwrap();
        assert!(manager.fetch_all().await.is_empty());
    }
}
