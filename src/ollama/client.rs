/// Blocking client for the Ollama HTTP API.
///
/// Talks to `/api/tags` for the availability check and `/api/generate` for
/// single-shot, non-streaming completions. One `reqwest` client (and its
/// connection pool) is reused for every request.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::{LanguageModel, OllamaError};
use crate::config::OllamaConfig;

const TAGS_PATH: &str = "/api/tags";
const GENERATE_PATH: &str = "/api/generate";

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize, Debug, Clone, Copy)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// An installed model as reported by `/api/tags`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
}

// ── Client ───────────────────────────────────────────────────────────

pub struct OllamaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    top_p: f32,
    repeat_penalty: f32,
}

impl OllamaClient {
    /// Build a client from configuration. The timeout applies to every request.
    pub fn new(config: &OllamaConfig) -> Result<Self, OllamaError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OllamaError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            top_p: config.top_p,
            repeat_penalty: config.repeat_penalty,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the models installed on the server.
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        let url = format!("{}{TAGS_PATH}", self.base_url);

        let resp = self.client.get(&url).send().map_err(|e| OllamaError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if resp.status() != reqwest::StatusCode::OK {
            return Err(OllamaError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }

        let tags: TagsResponse = resp.json().map_err(|e| OllamaError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        Ok(tags.models)
    }

    /// Run one non-streaming generation and return the trimmed response text.
    pub fn generate(&self, prompt: &str, temperature: f32) -> Result<String, OllamaError> {
        let url = format!("{}{GENERATE_PATH}", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                top_p: self.top_p,
                repeat_penalty: self.repeat_penalty,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| OllamaError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if resp.status() != reqwest::StatusCode::OK {
            return Err(OllamaError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }

        let body: GenerateResponse = resp.json().map_err(|e| OllamaError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        debug!("Raw model response: {}", body.response);
        Ok(body.response.trim().to_string())
    }
}

/// Whether an installed model satisfies the configured name.
///
/// Only the family before the first `:` is compared, so `codellama:7b-instruct`
/// is satisfied by `codellama:13b` as well.
pub fn model_matches(configured: &str, installed: &[ModelInfo]) -> bool {
    let family = configured.split(':').next().unwrap_or(configured);
    installed.iter().any(|m| m.name.starts_with(family))
}

impl LanguageModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        match self.list_models() {
            Ok(models) => model_matches(&self.model, &models),
            Err(e) => {
                warn!("Ollama not available: {e}");
                false
            }
        }
    }

    fn query(&self, prompt: &str, temperature: f32) -> String {
        match self.generate(prompt, temperature) {
            Ok(text) => text,
            Err(OllamaError::Status { status, .. }) => {
                error!("Ollama API error: {status}");
                String::new()
            }
            Err(e) => {
                error!("Error querying Ollama: {e}");
                String::new()
            }
        }
    }
}
