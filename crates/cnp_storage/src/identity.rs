use sha2::{Digest, Sha256};
use url::Url;

/// Identity of a link: scheme, host and path. Query string and fragment are
/// dropped so tracking parameters do not make a known article look new.
pub fn normalize_url(link: &str) -> String {
    let link = link.trim();
    match Url::parse(link) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => link
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Stable hash of an excerpt, insensitive to case and whitespace layout.
pub fn fingerprint(text: &str, max_chars: usize) -> String {
    let normalized = text
        .chars()
        .take(max_chars)
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
