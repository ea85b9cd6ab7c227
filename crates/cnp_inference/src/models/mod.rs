use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use cnp_core::{Error, Result};
use tracing::info;

use crate::Config;

pub mod dummy;
pub mod ollama;
pub mod openai;

pub use dummy::DummyModel;
pub use ollama::OllamaModel;
pub use openai::OpenAiCompatModel;

/// A text completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Whether the backend answers at all. Used by readiness checks.
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelBackend {
    Ollama,
    #[value(name = "openai")]
    OpenAi,
    Dummy,
}

pub fn create_model(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.backend {
        ModelBackend::Ollama => Arc::new(OllamaModel::new(&config.base_url, &config.model_name)?),
        ModelBackend::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| Error::Config("an API key is required for the openai backend".to_string()))?;
            Arc::new(OpenAiCompatModel::new(&config.base_url, &config.model_name, api_key)?)
        }
        ModelBackend::Dummy => Arc::new(DummyModel),
    };
    info!("🤖 Using {} model backend ({})", model.name(), config.model_name);
    Ok(model)
}
