use std::sync::Arc;

use async_trait::async_trait;
use cnp_core::models::FALLBACK_RANK_COUNT;
use cnp_core::{fallback_ranking, EnrichedArticle, Outcome, Ranker};
use tracing::{info, warn};

use crate::models::LanguageModel;

const RANK_TEMPERATURE: f32 = 0.3;

/// Asks the model to pick the most relevant items from a numbered list.
#[derive(Debug, Clone)]
pub struct LlmRanker {
    model: Arc<dyn LanguageModel>,
    top_n: usize,
}

impl LlmRanker {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            top_n: FALLBACK_RANK_COUNT,
        }
    }

    fn prompt(&self, candidates: &[EnrichedArticle]) -> String {
        let items = candidates
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {}: {}", i + 1, a.title, a.snippet))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a news ranking assistant. Rank the following crypto/web3/blockchain news items \
             by their importance and relevance for investors and traders.\n\
             Return ONLY the top {} items as a numbered list using the original numbers, no extra text.\n\n\
             News items:\n{}",
            self.top_n, items
        )
    }
}

#[async_trait]
impl Ranker for LlmRanker {
    async fn rank(&self, candidates: Vec<EnrichedArticle>) -> Outcome<Vec<EnrichedArticle>> {
        if candidates.is_empty() {
            return Outcome::Fresh(candidates);
        }
        info!("🏆 Ranking {} news items with {}", candidates.len(), self.model.name());

        let answer = match self.model.complete(&self.prompt(&candidates), RANK_TEMPERATURE).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Ranking failed, keeping input order: {}", e);
                return Outcome::degraded(fallback_ranking(candidates), e);
            }
        };

        let picks = parse_ranking(&answer, candidates.len(), self.top_n);
        if picks.is_empty() {
            warn!("Ranking answer had no usable indices, keeping input order");
            return Outcome::degraded(fallback_ranking(candidates), "unparseable ranking");
        }
        Outcome::Fresh(picks.into_iter().map(|i| candidates[i].clone()).collect())
    }
}

/// Zero-based indices named at the start of answer lines ("3. Title" or a bare
/// "3"), in answer order, without repeats, at most `limit`.
pub fn parse_ranking(answer: &str, len: usize, limit: usize) -> Vec<usize> {
    let mut picks = Vec::new();
    for line in answer.lines().map(str::trim) {
        if picks.len() >= limit {
            break;
        }
        let digits_end = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
        if digits_end == 0 || !(line[digits_end..].is_empty() || line[digits_end..].starts_with('.')) {
            continue;
        }
        let Ok(number) = line[..digits_end].parse::<usize>() else {
            continue;
        };
        if (1..=len).contains(&number) && !picks.contains(&(number - 1)) {
            picks.push(number - 1);
        }
    }
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use cnp_core::{Error, Result};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Scripted {
        answer: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn answering(answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
            assert_eq!(temperature, RANK_TEMPERATURE);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer.clone().ok_or_else(|| Error::Inference("model offline".into()))
        }
    }

    fn articles(n: usize) -> Vec<EnrichedArticle> {
        (1..=n)
            .map(|i| EnrichedArticle {
                title: format!("Story {i}"),
                snippet: format!("Snippet {i}"),
                link: format!("https://news.example/{i}"),
                publish_date: None,
                full_text: format!("Body {i}"),
            })
            .collect()
    }

    #[test]
    fn test_parse_ranking() {
        assert_eq!(parse_ranking("4. D\n2. B\n4. again\n1. A\n3. C", 5, 3), vec![3, 1, 0]);
        assert_eq!(parse_ranking("Top picks:\n 2\n9. out of range\n1) wrong style", 3, 3), vec![1]);
        assert!(parse_ranking("I think the second one", 3, 3).is_empty());
    }

    #[tokio::test]
    async fn test_rank_follows_model() {
        let model = Scripted::answering(Some("3. Story 3\n1. Story 1\n5. Story 5"));
        let ranker = LlmRanker::new(model.clone());
        let ranked = ranker.rank(articles(5)).await;

        assert!(!ranked.is_degraded());
        let titles: Vec<String> = ranked.into_value().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["Story 3", "Story 1", "Story 5"]);
        assert!(model.prompts.lock().unwrap()[0].contains("2. Story 2: Snippet 2"));
    }

    #[tokio::test]
    async fn test_rank_degrades_to_input_order() {
        let offline = LlmRanker::new(Scripted::answering(None)).rank(articles(5)).await;
        assert_eq!(offline.reason(), Some("Inference error: model offline"));
        assert_eq!(offline.value().len(), 3);
        assert_eq!(offline.value()[0].title, "Story 1");

        let rambling = LlmRanker::new(Scripted::answering(Some("They are all great"))).rank(articles(2)).await;
        assert!(rambling.is_degraded());
        assert_eq!(rambling.value().len(), 2);
    }

    #[tokio::test]
    async fn test_rank_empty_and_dummy() {
        let ranker = LlmRanker::new(Arc::new(DummyModel));
        assert!(ranker.rank(Vec::new()).await.into_value().is_empty());

        let ranked = ranker.rank(articles(4)).await;
        assert!(!ranked.is_degraded());
        assert_eq!(ranked.value().len(), 3);
    }
}
