use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cnp_core::config::SourceConfig;
use cnp_core::{ArticleRecord, ArticleSource, ContentExtractor, Result, SourceKind};
use scraper::Html;
use tracing::{debug, info};
use url::Url;

use super::utils::{parse_url, selector};

/// A news landing page. Links whose href mentions a keyword are followed and
/// run through the extractor; the records come back with their body filled.
pub struct ScrapeSource {
    base_url: String,
    client: reqwest::Client,
    config: Arc<SourceConfig>,
    extractor: Arc<dyn ContentExtractor>,
}

impl ScrapeSource {
    pub fn new(
        base_url: impl Into<String>,
        client: reqwest::Client,
        config: Arc<SourceConfig>,
        extractor: Arc<dyn ContentExtractor>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            config,
            extractor,
        }
    }

    pub async fn get_article_urls(&self) -> Result<Vec<String>> {
        let base = parse_url(&self.base_url)?;
        let response = self.client.get(base.clone()).send().await?.error_for_status()?;
        let html = response.text().await?;
        collect_links(&html, &base, &self.config)
    }
}

#[async_trait]
impl ArticleSource for ScrapeSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Scrape
    }

    async fn fetch(&self) -> Result<Vec<ArticleRecord>> {
        let urls = self.get_article_urls().await?;
        info!("📰 Scraping {} candidate links from {}", urls.len(), self.base_url);

        let mut records = Vec::new();
        for url in urls {
            match self.extractor.extract(&url).await {
                Ok(extraction) => {
                    let mut record = ArticleRecord::candidate(extraction.title.clone(), "", url);
                    record.enrich(extraction);
                    records.push(record);
                }
                Err(e) => debug!("Skipping {}: {}", url, e),
            }
        }
        Ok(records)
    }
}

/// Absolute http(s) links on the page whose href contains a keyword, in page
/// order, without repeats, capped at `max_links_per_page`.
pub fn collect_links(html: &str, base: &Url, config: &SourceConfig) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;

    let mut seen = HashSet::new();
    let links = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| config.matches_keywords(&[*href]))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .take(config.max_links_per_page)
        .collect();
    Ok(links)
}
