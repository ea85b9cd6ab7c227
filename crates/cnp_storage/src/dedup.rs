use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use cnp_core::config::DedupConfig;
use cnp_core::types::truncate_chars;
use cnp_core::{Clock, Result, SystemClock};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::file::{read_posted_file, write_posted_file, LoadState, PostedFile};
use crate::identity::{fingerprint, normalize_url};
use crate::similarity::TfIdf;

/// One publish event.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupEntry {
    pub url: String,
    pub fingerprint: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct DedupRecord {
    entries: Vec<DedupEntry>,
}

impl DedupRecord {
    fn from_file(file: PostedFile, excerpt_chars: usize) -> Self {
        let entries = file
            .urls
            .into_iter()
            .zip(file.timestamps)
            .zip(file.texts)
            .filter_map(|((url, ts), text)| {
                let timestamp = from_epoch_seconds(ts)?;
                Some(DedupEntry {
                    url: normalize_url(&url),
                    fingerprint: fingerprint(&text, excerpt_chars),
                    text,
                    timestamp,
                })
            })
            .collect();
        Self { entries }
    }

    fn to_file(&self) -> PostedFile {
        let mut file = PostedFile::default();
        for entry in &self.entries {
            file.urls.push(entry.url.clone());
            file.timestamps.push(entry.timestamp.timestamp_millis() as f64 / 1000.0);
            file.texts.push(entry.text.clone());
        }
        file
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp > cutoff);
        before - self.entries.len()
    }
}

fn from_epoch_seconds(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((ts * 1000.0).round() as i64)
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub last_published_at: Option<DateTime<Utc>>,
}

/// Publication history used to keep the pipeline from repeating itself.
///
/// Owns both the in-memory history and its JSON file. All mutation goes
/// through one write lock, so prune, append and persist happen as a unit.
pub struct DedupStore {
    path: PathBuf,
    config: DedupConfig,
    clock: Arc<dyn Clock>,
    tfidf: TfIdf,
    record: RwLock<DedupRecord>,
}

impl DedupStore {
    pub async fn load(path: impl Into<PathBuf>, config: DedupConfig) -> Self {
        Self::load_with_clock(path, config, Arc::new(SystemClock)).await
    }

    /// Never fails: an absent, empty or corrupt file yields an empty history
    /// that is written back immediately.
    pub async fn load_with_clock(path: impl Into<PathBuf>, config: DedupConfig, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let (record, rewrite) = match read_posted_file(&path) {
            LoadState::Loaded(file) => {
                info!("💾 Loaded {} posted entries from {}", file.len(), path.display());
                (DedupRecord::from_file(file, config.excerpt_chars), false)
            }
            LoadState::Missing => {
                info!("💾 No posted file at {}, starting fresh", path.display());
                (DedupRecord::default(), true)
            }
            LoadState::Corrupt(reason) => {
                error!("Failed to load {}: {}. Starting fresh", path.display(), reason);
                (DedupRecord::default(), true)
            }
        };

        let store = Self {
            path,
            tfidf: TfIdf::new(config.max_features),
            config,
            clock,
            record: RwLock::new(record),
        };
        if rewrite {
            if let Err(e) = store.flush().await {
                error!("Failed to initialise {}: {}", store.path.display(), e);
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole history to disk.
    pub async fn flush(&self) -> Result<()> {
        let record = self.record.read().await;
        write_posted_file(&self.path, &record.to_file())
    }

    /// Textual near-duplicate check against stored excerpts. Any failure
    /// answers `false`.
    pub async fn is_duplicate(&self, candidate_text: &str) -> bool {
        let record = self.record.read().await;
        if record.entries.is_empty() {
            return false;
        }

        let corpus: Vec<&str> = record.entries.iter().map(|e| e.text.as_str()).collect();
        match self.tfidf.similarities(candidate_text, &corpus) {
            Ok(sims) => {
                let best = sims.iter().copied().fold(0.0_f64, f64::max);
                debug!("🔍 Best similarity {:.3} against {} stored excerpts", best, corpus.len());
                best > self.config.similarity_threshold
            }
            Err(e) => {
                warn!("Duplicate check degraded, treating as novel: {}", e);
                false
            }
        }
    }

    /// Exact identity check: same normalized link, or same excerpt fingerprint.
    pub async fn is_known(&self, link: &str, text: &str) -> bool {
        let url = normalize_url(link);
        let print = fingerprint(text, self.config.excerpt_chars);
        let record = self.record.read().await;
        record.entries.iter().any(|e| e.url == url || e.fingerprint == print)
    }

    pub async fn is_known_link(&self, link: &str) -> bool {
        let url = normalize_url(link);
        self.record.read().await.entries.iter().any(|e| e.url == url)
    }

    /// Prune expired entries, append this publication and persist. A failed
    /// write is logged; the in-memory history keeps the new entry regardless.
    pub async fn record_publication(&self, url: &str, text: &str) {
        let now = self.clock.now();
        let cutoff = now - Duration::days(self.config.retention_days);
        let excerpt = truncate_chars(text, self.config.excerpt_chars);

        let mut record = self.record.write().await;
        let pruned = record.prune(cutoff);
        if pruned > 0 {
            info!("🧹 Pruned {} posted entries older than {} days", pruned, self.config.retention_days);
        }
        record.entries.push(DedupEntry {
            url: normalize_url(url),
            fingerprint: fingerprint(&excerpt, self.config.excerpt_chars),
            text: excerpt,
            timestamp: now,
        });

        match write_posted_file(&self.path, &record.to_file()) {
            Ok(()) => info!("💾 Saved posted article: {}", url),
            Err(e) => error!("Failed to save posted data to {}: {}", self.path.display(), e),
        }
    }

    pub async fn stats(&self) -> StoreStats {
        let record = self.record.read().await;
        StoreStats {
            entries: record.entries.len(),
            last_published_at: record.entries.iter().map(|e| e.timestamp).max(),
        }
    }

    pub async fn entries(&self) -> Vec<DedupEntry> {
        self.record.read().await.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    const ARTICLE: &str = "Ethereum core developers confirmed the Pectra upgrade date on the \
                           public testnet after validators reported stable block production";

    #[tokio::test]
    async fn test_missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted.json");
        let store = DedupStore::load(&path, DedupConfig::default()).await;

        assert!(path.exists());
        assert_eq!(store.stats().await.entries, 0);
        assert!(!store.is_duplicate(ARTICLE).await);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted.json");
        std::fs::write(&path, "garbage{").unwrap();

        let store = DedupStore::load(&path, DedupConfig::default()).await;
        assert_eq!(store.stats().await.entries, 0);
        let raw = std::fs::read_to_string(&path).unwrap();
        let file: PostedFile = serde_json::from_str(&raw).unwrap();
        assert!(file.is_empty());
    }

    #[tokio::test]
    async fn test_same_text_is_duplicate_after_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("posted.json"), DedupConfig::default()).await;

        assert!(!store.is_duplicate(ARTICLE).await);
        store.record_publication("https://decrypt.co/pectra?utm=x", ARTICLE).await;
        assert!(store.is_duplicate(ARTICLE).await);
        assert!(!store
            .is_duplicate("Dogecoin memes trend after celebrity tweet sparks retail frenzy")
            .await);
    }

    #[tokio::test]
    async fn test_identity_checks() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("posted.json"), DedupConfig::default()).await;
        store.record_publication("https://decrypt.co/pectra?utm=x", ARTICLE).await;

        assert!(store.is_known_link("https://decrypt.co/pectra#top").await);
        assert!(store.is_known("https://other.site/copy", ARTICLE).await);
        assert!(!store.is_known("https://other.site/new", "fresh story").await);
    }

    #[tokio::test]
    async fn test_stop_word_only_store_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("posted.json"), DedupConfig::default()).await;
        store.record_publication("https://a.com/1", "the and of it").await;
        assert!(!store.is_duplicate("is it the one").await);
    }

    #[tokio::test]
    async fn test_expired_entries_pruned_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posted.json");
        let clock = FixedClock::at(Utc::now());
        let store = DedupStore::load_with_clock(&path, DedupConfig::default(), clock.clone()).await;

        store.record_publication("https://a.com/old", "old bitcoin story").await;
        clock.advance(Duration::days(31));
        assert_eq!(store.stats().await.entries, 1, "reads never prune");

        store.record_publication("https://a.com/new", "new ethereum story").await;
        let entries = store.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://a.com/new");

        let reloaded = DedupStore::load(&path, DedupConfig::default()).await;
        assert!(!reloaded.is_known_link("https://a.com/old").await);
        assert!(reloaded.is_known_link("https://a.com/new").await);
    }

    #[tokio::test]
    async fn test_excerpt_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupStore::load(dir.path().join("posted.json"), DedupConfig::default()).await;
        store.record_publication("https://a.com/long", &"bitcoin ".repeat(1000)).await;
        assert_eq!(store.entries().await[0].text.chars().count(), 2000);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let store = DedupStore::load(blocker.join("posted.json"), DedupConfig::default()).await;

        store.record_publication("https://a.com/x", ARTICLE).await;
        assert_eq!(store.stats().await.entries, 1);
        assert!(store.is_duplicate(ARTICLE).await);
    }
}
