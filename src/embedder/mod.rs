/// Embedder trait and shared types for text embedding.
pub mod download;
pub mod mock;
pub mod onnx;
pub mod tokenizer;

use thiserror::Error;
use tracing::info;

use crate::config::EmbeddingConfig;
use onnx::OnnxEmbedder;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),

    #[error("local embeddings are disabled (set USE_LOCAL_EMBEDDINGS=true)")]
    LocalDisabled,
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors, one per input.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// Download (if needed) and load the configured local embedding model.
pub fn load_local_embedder(config: &EmbeddingConfig) -> Result<OnnxEmbedder, EmbedderError> {
    if !config.use_local {
        return Err(EmbedderError::LocalDisabled);
    }

    let model_dir = config.model_dir();
    download::download_model_files(&model_dir, &config.repo_id())
        .map_err(|e| EmbedderError::ModelLoadFailed(format!("{e:#}")))?;

    info!("Loading embedding model {} from {}", config.model, model_dir.display());
    OnnxEmbedder::new(&model_dir, config.max_length)
}

/// Cosine similarity of two vectors; `0.0` when either has zero norm.
///
/// Vectors of different length are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
