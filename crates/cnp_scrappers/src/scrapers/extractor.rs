use async_trait::async_trait;
use cnp_core::config::SourceConfig;
use cnp_core::{ContentExtractor, Error, Extraction, Result};
use scraper::Html;
use tracing::debug;

use super::jsonld;
use super::utils::{extract_attr, extract_text, extract_texts};

const SUMMARY_SENTENCES: usize = 3;

/// Pulls the readable body out of an article page.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    client: reqwest::Client,
}

impl HtmlExtractor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(super::build_client(config)?))
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn extract(&self, link: &str) -> Result<Extraction> {
        let response = self.client.get(link).send().await?.error_for_status()?;
        let html = response.text().await?;
        let extraction = parse_article(&html)?;
        debug!("Extracted {} chars from {}", extraction.text.len(), link);
        Ok(extraction)
    }
}

/// Title, body, short summary and publication date of an article page. A page
/// without any paragraph text is an error.
pub fn parse_article(html: &str) -> Result<Extraction> {
    let document = Html::parse_document(html);

    let title = extract_attr(&document, "meta[property='og:title']", "content")
        .or_else(|| extract_text(&document, "h1"))
        .or_else(|| extract_text(&document, "title"))
        .unwrap_or_default();

    let mut paragraphs = extract_texts(&document, "article p");
    if paragraphs.is_empty() {
        paragraphs = extract_texts(&document, "p");
    }
    let text = paragraphs.join(" ");
    if text.is_empty() {
        return Err(Error::Extraction("no article body found".to_string()));
    }

    let publish_date = extract_attr(&document, "meta[property='article:published_time']", "content")
        .and_then(|raw| jsonld::parse_date(&raw))
        .or_else(|| jsonld::extract_published(&document));

    Ok(Extraction {
        title,
        summary: leading_sentences(&text, SUMMARY_SENTENCES),
        text,
        publish_date,
    })
}

/// The first `count` sentences of `text`.
fn leading_sentences(text: &str, count: usize) -> String {
    let mut end = text.len();
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |(_, next)| next.is_whitespace()) {
            seen += 1;
            if seen == count {
                end = i + c.len_utf8();
                break;
            }
        }
    }
    text[..end].trim().to_string()
}
