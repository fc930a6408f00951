/// Configuration module for kgenrich.
///
/// Handles loading, environment overrides, validation and default values.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Environment variables ────────────────────────────────────────────

pub const ENV_MODEL_CHOICE: &str = "MODEL_CHOICE";
pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";
pub const ENV_USE_LOCAL_EMBEDDINGS: &str = "USE_LOCAL_EMBEDDINGS";
pub const ENV_LOCAL_EMBEDDING_MODEL: &str = "LOCAL_EMBEDDING_MODEL";

// ── Default value functions ──────────────────────────────────────────

fn default_ollama_url() -> String {
    "http://host.docker.internal:11434".to_string()
}

fn default_model() -> String {
    "codellama:7b-instruct".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.1
}

fn default_top_p() -> f32 {
    0.9
}

fn default_repeat_penalty() -> f32 {
    1.1
}

fn default_embedding_model() -> String {
    "all-mpnet-base-v2".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_max_length() -> usize {
    512
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub embeddings: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Fixed per-request timeout; there is no retry.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub use_local: bool,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            repeat_penalty: default_repeat_penalty(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            use_local: false,
            model: default_embedding_model(),
            models_dir: default_models_dir(),
            max_length: default_max_length(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg
    }

    /// Load configuration from a JSON file, then apply environment overrides.
    ///
    /// A missing file or invalid JSON falls back to the defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut cfg = if config_path.exists() {
            let data = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;

            match serde_json::from_str::<Config>(&data) {
                Ok(c) => {
                    info!("Loaded configuration from {}", config_path.display());
                    c
                }
                Err(e) => {
                    warn!("Invalid JSON in {}: {e}", config_path.display());
                    warn!("Using default configuration");
                    Self::default()
                }
            }
        } else {
            info!("{} not found, using defaults", config_path.display());
            Self::default()
        };

        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Apply overrides from `lookup`, which maps an environment variable name
    /// to its value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_empty(ENV_MODEL_CHOICE) {
            self.ollama.model = model;
        }
        if let Some(url) = non_empty(ENV_OLLAMA_URL) {
            self.ollama.url = url;
        }
        if let Some(flag) = non_empty(ENV_USE_LOCAL_EMBEDDINGS) {
            self.embeddings.use_local = parse_flag(&flag);
        }
        if let Some(model) = non_empty(ENV_LOCAL_EMBEDDING_MODEL) {
            self.embeddings.model = model;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.ollama.url.trim().is_empty(), "ollama.url must be set");
        anyhow::ensure!(
            !self.ollama.model.trim().is_empty(),
            "ollama.model must be set"
        );
        anyhow::ensure!(
            self.ollama.timeout_secs > 0,
            "ollama.timeout_secs must be positive"
        );
        anyhow::ensure!(
            self.ollama.temperature >= 0.0,
            "ollama.temperature must not be negative"
        );
        anyhow::ensure!(
            self.ollama.top_p > 0.0 && self.ollama.top_p <= 1.0,
            "ollama.top_p must be in (0, 1]"
        );
        anyhow::ensure!(
            !self.embeddings.model.trim().is_empty(),
            "embeddings.model must be set"
        );
        anyhow::ensure!(
            self.embeddings.max_length > 0,
            "embeddings.max_length must be positive"
        );
        Ok(())
    }
}

impl EmbeddingConfig {
    /// HuggingFace repository id for the configured model.
    ///
    /// Bare names such as `all-mpnet-base-v2` resolve under
    /// `sentence-transformers/`.
    #[must_use]
    pub fn repo_id(&self) -> String {
        if self.model.contains('/') {
            self.model.clone()
        } else {
            format!("sentence-transformers/{}", self.model)
        }
    }

    /// Local directory holding the model files.
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        let leaf = self.model.replace('/', "__");
        Path::new(&self.models_dir).join(leaf)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

// ── Tests ────────────────────────────────────────────────────────────
