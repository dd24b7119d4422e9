//! Ollama HTTP backend (`POST /api/generate`, non-streaming).

use std::env;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, OllamaError};
use crate::llm::TextGenerator;

/// Address of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Environment variable overriding the server address.
pub const BASE_URL_ENV_VAR: &str = "EVOLOG_OLLAMA_URL";

/// Model used when none is given on the command line.
pub const DEFAULT_MODEL: &str = "gemma3:1b";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for one model on one Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, OllamaError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Server address from `EVOLOG_OLLAMA_URL`, else the local default.
    pub fn from_env(model: &str) -> Result<Self, OllamaError> {
        let base_url = env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, model)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn run(&self, prompt: &str) -> Result<String, OllamaError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api { status, body });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::InvalidResponse(e.to_string()))?;

        match (body.response, body.error) {
            (_, Some(error)) => Err(OllamaError::InvalidResponse(error)),
            (Some(text), None) => Ok(text),
            (None, None) => Err(OllamaError::InvalidResponse(
                "missing 'response' field".to_string(),
            )),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, url = %self.base_url, "Calling Ollama");
        Ok(self.run(prompt).await?)
    }
}
