use std::time::Duration;

use async_trait::async_trait;
use cnp_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LanguageModel;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Local model served by Ollama.
#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OllamaModel {
    pub fn new(base_url: &str, model_name: &str) -> Result<Self> {
        let client = Client::builder().timeout(GENERATE_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model_name,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(response.response)
    }

    async fn health(&self) -> Result<()> {
        let status = self.client.get(format!("{}/api/tags", self.base_url)).send().await?.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Inference(format!("Ollama answered {}", status)))
        }
    }
}
