use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use cnp_core::{EnrichedArticle, Error, PostComposer, PostPayload, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::images::pick_image;

const BASE_TAGS: &str = "#Crypto #Web3 #NFTs #Blockchain #Ethereum #Bitcoin";
const SNIPPET_CHARS: usize = 150;
const PACING_SECS: std::ops::RangeInclusive<u64> = 30..=180;

const TEMPLATES: [&str; 5] = [
    "{emoji} {title}\n\n{snippet}... {cta}\n\n{link}{tags}",
    "{emoji} 🚨 Breaking: {title}\n\n{snippet}... {cta}\n\n{link}{tags}",
    "{emoji} 🔥 Hot Topic: {title}\n\n{snippet}... {cta}\n\n{link}{tags}",
    "{emoji} Curious about {keyword}? {title}\n\n{snippet}... {cta}\n\n{link}{tags}",
    "{emoji} Big news in {keyword}! {title}\n\n{snippet}... {cta}\n\n{link}{tags}",
];

const CTAS: [&str; 5] = [
    "Read more! 👇",
    "What do you think? 🤔",
    "Dive in! 🔍",
    "Check it out! 🚀",
    "Join the conversation! 💬",
];

fn emojis_for(keyword: &str) -> &'static [&'static str] {
    match keyword {
        "crypto" => &["💸", "📈", "🚀"],
        "nft" => &["🖼️", "🎨", "🪙"],
        "web3" => &["🌐", "🔗", "🛠️"],
        "blockchain" => &["⛓️", "🔒", "📡"],
        "ethereum" => &["Ξ", "🧠", "💻"],
        "bitcoin" => &["₿", "💰", "🔥"],
        _ => &["🌟"],
    }
}

/// Builds posts from a fixed set of templates, calls-to-action and hashtags.
pub struct TemplateComposer {
    client: reqwest::Client,
    keywords: Vec<String>,
    image_folder: PathBuf,
    rng: Mutex<StdRng>,
}

impl TemplateComposer {
    pub fn new(client: reqwest::Client, keywords: Vec<String>, image_folder: impl Into<PathBuf>) -> Self {
        Self {
            client,
            keywords,
            image_folder: image_folder.into(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Whether the article link answers with a 2xx status.
    async fn link_is_live(&self, link: &str) -> bool {
        if let Ok(response) = self.client.head(link).send().await {
            if response.status().is_success() {
                return true;
            }
        }
        match self.client.get(link).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Link {} unreachable: {}", link, e);
                false
            }
        }
    }

    fn render(&self, article: &EnrichedArticle, link: Option<&str>) -> Result<(String, Option<PathBuf>, Duration)> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::Compose("random source poisoned".to_string()))?;

        let snippet = if article.snippet.chars().count() > SNIPPET_CHARS {
            format!("{}...", article.snippet.chars().take(SNIPPET_CHARS).collect::<String>())
        } else {
            article.snippet.clone()
        };

        let title = article.title.to_lowercase();
        let lower_snippet = snippet.to_lowercase();
        let post_keywords: Vec<String> = self
            .keywords
            .iter()
            .filter(|kw| {
                let kw = kw.to_lowercase();
                title.contains(&kw) || lower_snippet.contains(&kw)
            })
            .cloned()
            .collect();

        let pool = if post_keywords.is_empty() { &self.keywords } else { &post_keywords };
        let keyword = pool.choose(&mut *rng).map(|k| k.to_lowercase()).unwrap_or_default();
        let emoji = emojis_for(&keyword).choose(&mut *rng).copied().unwrap_or("🌟");

        let template = TEMPLATES.choose(&mut *rng).copied().unwrap_or(TEMPLATES[0]);
        let cta = CTAS.choose(&mut *rng).copied().unwrap_or(CTAS[0]);

        let text = template
            .replace("{emoji}", emoji)
            .replace("{title}", &article.title)
            .replace("{snippet}", &snippet)
            .replace("{cta}", cta)
            .replace("{keyword}", &capitalize(&keyword))
            .replace("{link}", &link.map(|l| format!("{} ", l)).unwrap_or_default())
            .replace("{tags}", &hashtags(&post_keywords));

        let image = if post_keywords.is_empty() {
            None
        } else {
            pick_image(&self.image_folder, &keyword, &post_keywords, &mut *rng)
        };
        let delay = Duration::from_secs(rng.random_range(PACING_SECS));

        Ok((text, image, delay))
    }
}

#[async_trait]
impl PostComposer for TemplateComposer {
    async fn compose(&self, article: &EnrichedArticle) -> Result<PostPayload> {
        let link = self.link_is_live(&article.link).await.then_some(article.link.as_str());
        let (text, image, delay) = self.render(article, link)?;

        info!("✍️ Composed post for {} ({} chars, image: {})", article.link, text.chars().count(), image.is_some());
        Ok(PostPayload::new(text, image, article.link.clone(), article.full_text.clone(), delay))
    }
}

/// Base tags followed by one tag per matched keyword, without repeats.
fn hashtags(keywords: &[String]) -> String {
    let mut tags = BASE_TAGS.to_string();
    let mut seen: Vec<String> = Vec::new();
    for kw in keywords {
        let tag = format!("#{}", kw.chars().filter(|c| c.is_alphanumeric()).collect::<String>());
        if !seen.contains(&tag.to_lowercase()) {
            seen.push(tag.to_lowercase());
            tags.push(' ');
            tags.push_str(&tag);
        }
    }
    tags
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
