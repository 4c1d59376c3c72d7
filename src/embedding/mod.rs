//! Embedding generation for transcript sentences and chunks.
//!
//! The tokenizer and the inference engine are separate concerns: the
//! tokenizer hands out exact token counts (the sentence assembler and the
//! batch packer depend on them), the engine turns batches of texts into
//! CLS vectors.

mod onnx;
mod tokenizer;

pub use onnx::{plan_batches, OnnxEmbedder};
pub use tokenizer::{BatchEncoding, TextTokenizer};

use crate::error::Result;
use async_trait::async_trait;

/// Exact token counting as the embedding model sees the text.
///
/// Implementations must permit concurrent calls.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens the model would see for this input.
    fn count(&self, text: &str) -> Result<usize>;
}

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate one embedding per text, in input order.
    ///
    /// `token_counts` are the precomputed counts for the same texts; the
    /// engine uses them to pack size-bounded batches.
    async fn embed(&self, texts: &[String], token_counts: &[usize]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of each returned embedding.
    fn dimensions(&self) -> usize;
}

/// Deterministic embedder for tests: one token per whitespace word, and
/// hash-derived unit vectors so that distinct texts get distinct, stable
/// embeddings without a model artifact.
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, word) in text.split_whitespace().enumerate() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();

            for j in 0..8usize.min(self.dimensions) {
                let idx = (i * 8 + j) % self.dimensions;
                embedding[idx] += ((hash >> (j * 7)) & 0x7F) as f32 / 128.0 - 0.5;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-12 {
            for val in &mut embedding {
                *val /= norm;
            }
        }
        embedding
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(16)
    }
}

impl TokenCounter for MockEmbedder {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String], _token_counts: &[usize]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new(16);
        let texts = vec!["one sentence".to_string(), "another sentence".to_string()];
        let counts = vec![2, 2];

        let a = embedder.embed(&texts, &counts).await.unwrap();
        let b = embedder.embed(&texts, &counts).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].len(), 16);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn test_mock_token_count() {
        let embedder = MockEmbedder::default();
        assert_eq!(embedder.count("three word text").unwrap(), 3);
        assert_eq!(embedder.count("").unwrap(), 0);
    }
}
