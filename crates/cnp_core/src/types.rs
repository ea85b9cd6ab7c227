use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a post on the destination network.
pub const MAX_POST_CHARS: usize = 280;

/// A candidate article as it comes out of a source. `full_text` is filled in
/// later by the extractor when the source could not provide it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub full_text: Option<String>,
}

impl ArticleRecord {
    /// A record fresh out of a feed: no body yet.
    pub fn candidate(title: impl Into<String>, snippet: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
            publish_date: None,
            full_text: None,
        }
    }

    pub fn with_publish_date(mut self, publish_date: Option<DateTime<Utc>>) -> Self {
        self.publish_date = publish_date;
        self
    }

    pub fn with_full_text(mut self, full_text: impl Into<String>) -> Self {
        self.full_text = Some(full_text.into());
        self
    }

    pub fn has_body(&self) -> bool {
        self.full_text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Fill the body from an extraction. The extractor's summary replaces the
    /// feed snippet when it has one.
    pub fn enrich(&mut self, extraction: Extraction) {
        if !extraction.summary.trim().is_empty() {
            self.snippet = extraction.summary;
        }
        if self.publish_date.is_none() {
            self.publish_date = extraction.publish_date;
        }
        self.full_text = Some(extraction.text);
    }
}

/// An article whose body is known. Only these can be deduplicated, ranked and
/// composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedArticle {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub full_text: String,
}

impl TryFrom<ArticleRecord> for EnrichedArticle {
    type Error = ArticleRecord;

    fn try_from(record: ArticleRecord) -> std::result::Result<Self, Self::Error> {
        if !record.has_body() {
            return Err(record);
        }
        let ArticleRecord { title, snippet, link, publish_date, full_text } = record;
        Ok(Self {
            title,
            snippet,
            link,
            publish_date,
            full_text: full_text.unwrap_or_default(),
        })
    }
}

/// Result of a successful content extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub title: String,
    pub text: String,
    pub summary: String,
    pub publish_date: Option<DateTime<Utc>>,
}

/// A composed post, ready for the publisher. Built once and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPayload {
    text: String,
    image_path: Option<std::path::PathBuf>,
    link: String,
    full_text: String,
    recommended_delay: Duration,
}

impl PostPayload {
    /// Text longer than [`MAX_POST_CHARS`] is cut to 277 characters plus "...".
    pub fn new(
        text: impl Into<String>,
        image_path: Option<std::path::PathBuf>,
        link: impl Into<String>,
        full_text: impl Into<String>,
        recommended_delay: Duration,
    ) -> Self {
        let text = text.into();
        let text = if text.chars().count() > MAX_POST_CHARS {
            format!("{}...", truncate_chars(&text, MAX_POST_CHARS - 3))
        } else {
            text
        };
        Self {
            text,
            image_path,
            link: link.into(),
            full_text: full_text.into(),
            recommended_delay,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image_path(&self) -> Option<&std::path::Path> {
        self.image_path.as_deref()
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// Body of the source article, recorded in the dedup store on publish.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn recommended_delay(&self) -> Duration {
        self.recommended_delay
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub post_id: String,
}

/// Character-safe prefix of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_requires_body() {
        let record = ArticleRecord::candidate("Title", "snippet", "https://a.com/x");
        let record = EnrichedArticle::try_from(record).unwrap_err();

        let record = record.with_full_text("   ");
        assert!(EnrichedArticle::try_from(record.clone()).is_err());

        let enriched = EnrichedArticle::try_from(record.with_full_text("Bitcoin rallies")).unwrap();
        assert_eq!(enriched.full_text, "Bitcoin rallies");
        assert_eq!(enriched.link, "https://a.com/x");
    }

    #[test]
    fn test_enrich_overwrites_snippet() {
        let mut record = ArticleRecord::candidate("Title", "feed snippet", "https://a.com/x");
        record.enrich(Extraction {
            title: "Title".into(),
            text: "Full body".into(),
            summary: "Extracted summary".into(),
            publish_date: None,
        });
        assert_eq!(record.snippet, "Extracted summary");
        assert_eq!(record.full_text.as_deref(), Some("Full body"));
    }

    #[test]
    fn test_payload_text_is_capped() {
        let long = "é".repeat(400);
        let payload = PostPayload::new(long, None, "https://a.com", "", Duration::from_secs(30));
        assert_eq!(payload.text().chars().count(), MAX_POST_CHARS);
        assert!(payload.text().ends_with("..."));
    }
}
