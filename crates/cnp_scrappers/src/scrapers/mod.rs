use cnp_core::config::SourceConfig;
use cnp_core::{Error, Result};
use scraper::{Html, Selector};
use url::Url;

pub mod extractor;
pub mod feed;
pub mod jsonld;
pub mod page;

/// One HTTP client per process, carrying the configured user agent and timeout.
pub fn build_client(config: &SourceConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .build()?;
    Ok(client)
}

/// Common utilities for sources and the extractor
pub(crate) mod utils {
    use super::*;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::Scraping(format!("Failed to parse URL {}: {}", url, e)))
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {}: {}", css, e)))
    }

    /// Text of the first element matching `css`, whitespace collapsed.
    pub fn extract_text(document: &Html, css: &str) -> Option<String> {
        let selector = selector(css).ok()?;
        document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    }

    /// Value of `attr` on the first element matching `css`.
    pub fn extract_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
        let selector = selector(css).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    pub fn extract_texts(document: &Html, css: &str) -> Vec<String> {
        let Ok(selector) = selector(css) else {
            return Vec::new();
        };
        document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Visible text of an HTML fragment, as found in feed summaries.
    pub fn strip_html(fragment: &str) -> String {
        let html = Html::parse_fragment(fragment);
        collapse_whitespace(&html.root_element().text().collect::<String>())
    }
}
