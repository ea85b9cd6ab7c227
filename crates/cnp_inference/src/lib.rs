use models::ModelBackend;

pub mod models;
pub mod ranker;
pub mod summarizer;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL_NAME: &str = "hf.co/bartowski/Llama-3.2-1B-Instruct-GGUF";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: ModelBackend,
    pub base_url: String,
    pub model_name: String,
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Ollama,
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            api_key: None,
        }
    }
}

pub mod prelude {
    pub use super::models::{create_model, LanguageModel, ModelBackend};
    pub use super::ranker::LlmRanker;
    pub use super::summarizer::LlmSummarizer;
    pub use super::Config;
    pub use cnp_core::{Error, Outcome, Result};
}

pub use models::create_model;
pub use ranker::LlmRanker;
pub use summarizer::LlmSummarizer;
