/// ONNX Runtime embedder using the `ort` crate.
///
/// Loads a sentence-transformers ONNX export, runs inference, applies mean
/// pooling with attention mask, and L2-normalizes the result.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tracing::info;

use super::tokenizer::{SentenceTokenizer, TokenizerOutput};
use super::{Embedder, EmbedderError};

/// Fields of the HuggingFace `config.json` the embedder needs.
#[derive(Deserialize)]
struct ModelConfigFile {
    hidden_size: usize,
    #[serde(default)]
    model_type: String,
}

/// Architectures whose ONNX graphs take no `token_type_ids` input.
const NO_TOKEN_TYPE_MODELS: &[&str] = &["mpnet", "distilbert"];

/// ONNX-backed embedder implementing the `Embedder` trait.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: SentenceTokenizer,
    dimensions: usize,
    token_type_ids: bool,
}

impl OnnxEmbedder {
    /// Create a new `OnnxEmbedder` by loading a model from the given directory.
    ///
    /// Expects `model.onnx`, `tokenizer.json` and `config.json` in `model_dir`.
    pub fn new(model_dir: &Path, max_length: usize) -> Result<Self, EmbedderError> {
        let model_path = model_dir.join("model.onnx");

        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        let config = read_model_config(model_dir)?;

        info!("Initializing ONNX Runtime...");

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        info!(
            "ONNX model loaded ({}, {} dimensions)",
            config.model_type, config.hidden_size
        );

        let tokenizer = SentenceTokenizer::from_model_dir(model_dir, max_length)
            .map_err(|e| EmbedderError::TokenizerError(format!("{e:#}")))?;

        info!("Tokenizer loaded (vocab size: {})", tokenizer.vocab_size());

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions: config.hidden_size,
            token_type_ids: uses_token_type_ids(&config.model_type),
        })
    }

    /// Run one forward pass over equally sized token sequences.
    fn infer(&self, batch: &[TokenizerOutput]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let rows = batch.len();
        let seq_len = batch.first().map(TokenizerOutput::len).unwrap_or(0);
        if rows == 0 {
            return Ok(Vec::new());
        }
        if batch.iter().any(|t| t.len() != seq_len) {
            return Err(EmbedderError::TokenizerError(
                "batch is not padded to a common length".to_string(),
            ));
        }

        let input_ids: Vec<i64> = batch.iter().flat_map(|t| t.input_ids.iter().copied()).collect();
        let attention_mask: Vec<i64> = batch
            .iter()
            .flat_map(|t| t.attention_mask.iter().copied())
            .collect();

        // (shape, data) tuples avoid coupling to ort's ndarray version
        let input_ids_val = Tensor::from_array(([rows, seq_len], input_ids))
            .map_err(|e| EmbedderError::InferenceFailed(format!("input_ids error: {e}")))?;
        let attention_mask_val = Tensor::from_array(([rows, seq_len], attention_mask.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("attention_mask error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("lock poisoned: {e}")))?;

        let outputs = if self.token_type_ids {
            let token_type_ids_val = Tensor::from_array(([rows, seq_len], vec![0i64; rows * seq_len]))
                .map_err(|e| EmbedderError::InferenceFailed(format!("token_type_ids error: {e}")))?;
            session.run(ort::inputs![
                "input_ids" => input_ids_val,
                "attention_mask" => attention_mask_val,
                "token_type_ids" => token_type_ids_val,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids_val,
                "attention_mask" => attention_mask_val,
            ])
        }
        .map_err(|e| EmbedderError::InferenceFailed(format!("inference failed: {e}")))?;

        // Output 0: last hidden state, shape [rows, seq_len, hidden_size]
        let (_shape, hidden_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        let row_stride = seq_len * self.dimensions;
        if hidden_data.len() != rows * row_stride {
            return Err(EmbedderError::InferenceFailed(format!(
                "unexpected output size {} (expected {})",
                hidden_data.len(),
                rows * row_stride
            )));
        }

        Ok((0..rows)
            .map(|r| {
                let hidden = &hidden_data[r * row_stride..(r + 1) * row_stride];
                let mask = &attention_mask[r * seq_len..(r + 1) * seq_len];
                l2_normalize(&mean_pooling(hidden, mask, seq_len, self.dimensions))
            })
            .collect())
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| EmbedderError::InferenceFailed(format!("tokenization failed: {e}")))?;

        self.infer(std::slice::from_ref(&tokens))?
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("empty model output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self
            .tokenizer
            .tokenize_batch(texts)
            .map_err(|e| EmbedderError::InferenceFailed(format!("tokenization failed: {e}")))?;
        self.infer(&batch)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn read_model_config(model_dir: &Path) -> Result<ModelConfigFile, EmbedderError> {
    let path = model_dir.join("config.json");
    let data = std::fs::read_to_string(&path).map_err(|e| {
        EmbedderError::ModelLoadFailed(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&data).map_err(|e| {
        EmbedderError::ModelLoadFailed(format!("invalid {}: {e}", path.display()))
    })
}

fn uses_token_type_ids(model_type: &str) -> bool {
    !NO_TOKEN_TYPE_MODELS.contains(&model_type)
}

/// Mean pooling over hidden states weighted by attention mask.
///
/// `hidden_data` is a flat array with shape `[seq_len, hidden_size]`.
fn mean_pooling(
    hidden_data: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut result = vec![0.0f32; hidden_size];
    let mut mask_sum: f32 = 0.0;

    for t in 0..seq_len {
        let mask = attention_mask[t] as f32;
        mask_sum += mask;

        for h in 0..hidden_size {
            result[h] += hidden_data[t * hidden_size + h] * mask;
        }
    }

    if mask_sum > 0.0 {
        for v in &mut result {
            *v /= mask_sum;
        }
    }

    result
}

/// L2-normalize a vector, returning the normalized copy.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return vec.to_vec();
    }

    let inv_norm = 1.0 / norm_sq.sqrt();
    vec.iter().map(|v| v * inv_norm).collect()
}
