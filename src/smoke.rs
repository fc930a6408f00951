//! End-to-end sanity check for a loaded embedding model.
//!
//! Embeds a sample sentence, a small batch of documents and a similarity
//! probe, then reports whether paraphrases score closer than unrelated text.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::embedder::{Embedder, EmbedderError, cosine_similarity};

pub const SAMPLE_TEXT: &str = "This is a test sentence for embedding using a free local model.";

pub const BATCH_TEXTS: [&str; 4] = [
    "First test document about machine learning and AI.",
    "Second test document about natural language processing.",
    "Third test document about vector databases and embeddings.",
    "Fourth test document about web crawling and data extraction.",
];

/// Two paraphrases about the same topic.
pub const SIMILAR_TEXTS: [&str; 2] = [
    "Machine learning is a branch of artificial intelligence.",
    "AI and machine learning are closely related fields.",
];

pub const DIFFERENT_TEXT: &str = "The weather is nice today.";

/// Outcome of [`run_smoke_test`].
#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub expected_dimensions: usize,
    pub single_dimensions: usize,
    /// First few components of the sample embedding.
    pub sample_values: Vec<f32>,
    pub batch_size: usize,
    /// Length of every vector in the batch, in input order.
    pub batch_dimensions: Vec<usize>,
    pub similar_similarity: f32,
    pub different_similarity: f32,
}

impl SmokeReport {
    /// Every batch vector has the same length as the first.
    pub fn batch_uniform(&self) -> bool {
        self.batch_dimensions
            .first()
            .is_some_and(|&first| self.batch_dimensions.iter().all(|&d| d == first))
    }

    /// Paraphrases are closer to each other than to the unrelated sentence.
    pub fn quality_passed(&self) -> bool {
        self.similar_similarity > self.different_similarity
    }

    pub fn passed(&self) -> bool {
        self.single_dimensions == self.expected_dimensions
            && self.batch_size == BATCH_TEXTS.len()
            && self
                .batch_dimensions
                .iter()
                .all(|&d| d == self.expected_dimensions)
            && self.quality_passed()
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool| if ok { "PASS" } else { "FAIL" };

        writeln!(f, "Single embedding")?;
        writeln!(f, "  Dimensions: {}", self.single_dimensions)?;
        writeln!(f, "  Sample values: {:?}...", self.sample_values)?;
        writeln!(f, "Batch embeddings")?;
        writeln!(f, "  Number of embeddings: {}", self.batch_size)?;
        writeln!(
            f,
            "  Dimensions per embedding: {}",
            self.batch_dimensions.first().copied().unwrap_or(0)
        )?;
        writeln!(f, "  All same dimensions: {}", self.batch_uniform())?;
        writeln!(f, "Similarity")?;
        writeln!(f, "  Similar texts similarity: {:.3}", self.similar_similarity)?;
        writeln!(f, "  Different text similarity: {:.3}", self.different_similarity)?;
        writeln!(f, "  Quality check: {}", mark(self.quality_passed()))?;
        if self.passed() {
            write!(
                f,
                "SUCCESS: {}-dimensional local embeddings are working",
                self.expected_dimensions
            )
        } else {
            write!(f, "ERROR: local embedding checks did not hold")
        }
    }
}

/// Run every check against `embedder`.
///
/// Errors only when the embedder itself fails; failed checks are reported
/// through the returned [`SmokeReport`].
pub fn run_smoke_test(embedder: &dyn Embedder) -> Result<SmokeReport, EmbedderError> {
    let expected_dimensions = embedder.dimensions();
    info!("Embedding model reports {expected_dimensions} dimensions");

    let single = embedder.embed(SAMPLE_TEXT)?;
    let batch = embedder.embed_batch(&BATCH_TEXTS)?;

    let similar = embedder.embed_batch(&SIMILAR_TEXTS)?;
    let different = embedder.embed(DIFFERENT_TEXT)?;
    let (first, second) = match similar.as_slice() {
        [first, second] => (first, second),
        other => {
            return Err(EmbedderError::InferenceFailed(format!(
                "expected 2 embeddings, got {}",
                other.len()
            )));
        }
    };

    Ok(SmokeReport {
        expected_dimensions,
        single_dimensions: single.len(),
        sample_values: single.iter().take(5).copied().collect(),
        batch_size: batch.len(),
        batch_dimensions: batch.iter().map(Vec::len).collect(),
        similar_similarity: cosine_similarity(first, second),
        different_similarity: cosine_similarity(first, &different),
    })
}
