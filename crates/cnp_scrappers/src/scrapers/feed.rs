use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use cnp_core::config::SourceConfig;
use cnp_core::{ArticleRecord, ArticleSource, Clock, Error, Result, SourceKind, SystemClock};
use tracing::debug;

use super::utils::strip_html;

/// RSS or Atom feed, filtered down to keyword-matching recent entries.
pub struct FeedSource {
    url: String,
    client: reqwest::Client,
    config: Arc<SourceConfig>,
    clock: Arc<dyn Clock>,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, client: reqwest::Client, config: Arc<SourceConfig>) -> Self {
        Self {
            url: url.into(),
            client,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl ArticleSource for FeedSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn fetch(&self) -> Result<Vec<ArticleRecord>> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        parse_feed(&bytes, &self.config, self.clock.now())
    }
}

/// Turn a feed document into candidate records. Entries without a link, without
/// a keyword in title or summary, or published before the freshness window are
/// dropped. Entries without a date are kept.
pub fn parse_feed(bytes: &[u8], config: &SourceConfig, now: DateTime<Utc>) -> Result<Vec<ArticleRecord>> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| Error::Scraping(format!("Failed to parse feed: {}", e)))?;
    let cutoff = now - Duration::hours(config.max_age_hours);

    let total = feed.entries.len();
    let records: Vec<ArticleRecord> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone())?;
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let snippet = entry.summary.map(|s| strip_html(&s.content)).unwrap_or_default();
            let publish_date = entry.published.or(entry.updated);

            if !config.matches_keywords(&[title.as_str(), snippet.as_str()]) {
                return None;
            }
            if publish_date.is_some_and(|date| date < cutoff) {
                return None;
            }
            Some(ArticleRecord::candidate(title.trim(), snippet, link).with_publish_date(publish_date))
        })
        .collect();

    debug!("Kept {} of {} feed entries", records.len(), total);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Crypto Wire</title>
    <link>https://wire.example</link>
    <description>news</description>
    <item>
      <title>Bitcoin breaks resistance</title>
      <link>https://wire.example/btc?utm_source=rss</link>
      <description><![CDATA[<p>Traders cheer a <b>clean</b> breakout.</p>]]></description>
      <pubDate>Thu, 02 May 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Local weather</title>
      <link>https://wire.example/weather</link>
      <description>Sunny skies all week</description>
      <pubDate>Thu, 02 May 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Old NFT drop</title>
      <link>https://wire.example/nft-old</link>
      <description>A drop from last month</description>
      <pubDate>Tue, 02 Apr 2024 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated story</title>
      <link>https://wire.example/web3</link>
      <description>Web3 wallets add passkeys</description>
    </item>
  </channel>
</rss>"#;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-02T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_feed_filters() {
        let records = parse_feed(RSS.as_bytes(), &SourceConfig::default(), now()).unwrap();
        let links: Vec<&str> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://wire.example/btc?utm_source=rss", "https://wire.example/web3"]);

        assert_eq!(records[0].title, "Bitcoin breaks resistance");
        assert_eq!(records[0].snippet, "Traders cheer a clean breakout.");
        assert!(records[0].publish_date.is_some());
        assert!(records[0].full_text.is_none());
        assert!(records[1].publish_date.is_none());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_feed(b"<html>nope", &SourceConfig::default(), now()).is_err());
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let config = Arc::new(SourceConfig::default());
        let client = super::super::build_client(&config).unwrap();
        let source = FeedSource::new(format!("{}/rss", server.uri()), client.clone(), config.clone())
            .with_clock(Arc::new(FixedClock(now())));
        assert_eq!(source.kind(), SourceKind::Feed);
        assert_eq!(source.fetch().await.unwrap().len(), 2);

        let missing = FeedSource::new(format!("{}/missing", server.uri()), client, config);
        assert!(missing.fetch().await.is_err());
    }
}
