use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FEEDS: &[&str] = &[
    "https://cointelegraph.com/rss",
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://beincrypto.com/feed/",
    "https://www.theblock.co/feed",
    "https://u.today/rss",
    "https://nftlately.com/feed/",
    "https://nftplazas.com/feed/",
    "https://nftnow.com/feed/",
    "https://nftcalendar.io/feed/",
    "https://decrypt.co/feed",
    "https://coingape.com/feed/",
    "https://ambcrypto.com/feed/",
];

pub const DEFAULT_SCRAPE_PAGES: &[&str] = &[
    "https://cointelegraph.com/",
    "https://www.coindesk.com/",
    "https://beincrypto.com/",
    "https://www.theblock.co/",
    "https://u.today/",
    "https://nftlately.com/",
    "https://nftplazas.com/",
    "https://nftnow.com/",
    "https://nftcalendar.io/",
    "https://decrypt.co/",
    "https://coingape.com/",
    "https://ambcrypto.com/",
];

pub const DEFAULT_KEYWORDS: &[&str] = &["crypto", "nft", "web3", "blockchain", "ethereum", "bitcoin"];

/// Knobs of a single pipeline cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub max_posts_per_run: usize,
    pub max_retries: u32,
    pub base_backoff_secs: u64,
    pub max_jitter_secs: u64,
    pub snippet_limit: usize,
    /// Extractor calls in flight at once during enrichment.
    pub enrich_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            max_posts_per_run: 3,
            max_retries: 2,
            base_backoff_secs: 60,
            max_jitter_secs: 30,
            snippet_limit: 200,
            enrich_concurrency: 4,
        }
    }
}

impl PipelineConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_secs(self.base_backoff_secs)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_secs(self.max_jitter_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub similarity_threshold: f64,
    pub retention_days: i64,
    pub excerpt_chars: usize,
    pub max_features: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            retention_days: 30,
            excerpt_chars: 2000,
            max_features: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub feeds: Vec<String>,
    pub scrape_pages: Vec<String>,
    pub keywords: Vec<String>,
    /// Feed entries published earlier than this are ignored.
    pub max_age_hours: i64,
    pub max_links_per_page: usize,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            scrape_pages: DEFAULT_SCRAPE_PAGES.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            max_age_hours: 24,
            max_links_per_page: 20,
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Case-insensitive keyword match against any of `texts`.
    pub fn matches_keywords(&self, texts: &[&str]) -> bool {
        self.keywords.iter().any(|kw| {
            let kw = kw.to_lowercase();
            texts.iter().any(|t| t.to_lowercase().contains(&kw))
        })
    }
}
