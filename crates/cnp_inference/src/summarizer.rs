use std::sync::Arc;

use async_trait::async_trait;
use cnp_core::types::MAX_POST_CHARS;
use cnp_core::{fallback_summary, Outcome, Summarizer};
use tracing::{debug, warn};

use crate::models::LanguageModel;

const SUMMARY_TEMPERATURE: f32 = 0.9;
const META_PREFIXES: [&str; 3] = ["here is", "summary:", "this article"];

/// Rewrites an article body as a short social post.
#[derive(Debug, Clone)]
pub struct LlmSummarizer {
    model: Arc<dyn LanguageModel>,
}

impl LlmSummarizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    fn prompt(full_text: &str) -> String {
        format!(
            "You are a professional crypto journalist and social media strategist writing for a global audience.\n\
             Transform the article below into a short insight-driven post, not a summary. Highlight the key \
             insight, trend or impact and keep every fact accurate (prices, partnerships, regulation).\n\
             Avoid phrasing like \"The article discusses\", avoid hashtags, emojis and links, and open strongly \
             (\"Breaking:\", \"Update:\", \"Analysts note that\"). Length: 50 to 100 words.\n\n\
             Article:\n{}",
            full_text
        )
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, full_text: &str) -> Outcome<String> {
        match self.model.complete(&Self::prompt(full_text), SUMMARY_TEMPERATURE).await {
            Ok(raw) => {
                let cleaned = clean_summary(&raw);
                if cleaned.is_empty() {
                    warn!("Summarizer returned nothing usable, truncating instead");
                    return Outcome::degraded(fallback_summary(full_text), "empty summary");
                }
                debug!("✍️ Summary: {}", cleaned);
                Outcome::Fresh(cleaned)
            }
            Err(e) => {
                warn!("Summarization error: {}", e);
                Outcome::degraded(fallback_summary(full_text), e)
            }
        }
    }
}

/// Drop meta lines ("Here is your post:"), join the rest on one line and cap
/// at post length, cutting on a word boundary.
pub fn clean_summary(raw: &str) -> String {
    let cleaned = raw
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            !line.is_empty() && !META_PREFIXES.iter().any(|p| lower.starts_with(p))
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.chars().count() <= MAX_POST_CHARS {
        return cleaned;
    }
    let head: String = cleaned.chars().take(MAX_POST_CHARS - 3).collect();
    let head = head.rsplit_once(' ').map_or(head.as_str(), |(before, _)| before);
    format!("{}…", head)
}
