//! Ollama `/api/generate` client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::config::ModelConfig;
use crate::error::ModelError;

pub struct OllamaModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaModel {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.name.clone(),
        })
    }
}

impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.endpoint);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        if generated.response.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        tracing::info!(
            model = %self.model,
            chars = generated.response.len(),
            "completion received"
        );
        Ok(generated.response)
    }
}
