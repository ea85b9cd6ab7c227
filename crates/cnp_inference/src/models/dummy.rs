use async_trait::async_trait;
use cnp_core::Result;

use super::LanguageModel;

const DUMMY_WORDS: usize = 40;

/// Offline stand-in. Answers from the last section of the prompt: a numbered
/// list is echoed back (first three lines), anything else is cut to its
/// leading words.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyModel;

#[async_trait]
impl LanguageModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        let body = prompt.rsplit_once(":\n").map_or(prompt, |(_, body)| body).trim();
        let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

        if lines.first().is_some_and(|l| l.starts_with(|c: char| c.is_ascii_digit())) {
            return Ok(lines.into_iter().take(3).collect::<Vec<_>>().join("\n"));
        }
        Ok(body.split_whitespace().take(DUMMY_WORDS).collect::<Vec<_>>().join(" "))
    }
}
