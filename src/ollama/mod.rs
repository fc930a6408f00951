/// Language model trait and the Ollama HTTP client implementing it.
pub mod client;
pub mod mock;

pub use client::{ModelInfo, OllamaClient};

use thiserror::Error;

/// Temperature used by the analysis prompts unless a caller overrides it.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Errors that can occur while talking to the model server.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// A text-generation backend.
///
/// Implementations never fail outward: `query` returns an empty string when
/// the backend cannot answer, and `is_available` returns `false`.
pub trait LanguageModel: Send + Sync {
    /// Name of the configured model.
    fn model_name(&self) -> &str;

    /// Whether the backend is reachable and the configured model is installed.
    fn is_available(&self) -> bool;

    /// Send a single prompt and return the trimmed response text.
    fn query(&self, prompt: &str, temperature: f32) -> String;
}
