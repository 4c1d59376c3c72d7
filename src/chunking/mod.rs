//! Semantic chunking of sentence sequences.
//!
//! Sentences are partitioned into contiguous, size-bounded chunks by a
//! dynamic program that rewards intra-chunk similarity and penalizes
//! oversized and over-fragmented partitions.

mod semantic;

pub use semantic::SemanticChunker;

use crate::config::ChunkingSettings;
use serde::{Deserialize, Serialize};

/// A contiguous run of sentences selected by the chunker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text (sentence texts joined by single spaces, in order).
    pub text: String,
    /// Start time of the chunk's first sentence (HH:MM:SS,mmm).
    pub start_time: String,
    /// Number of sentences merged into this chunk.
    pub num_sentences: usize,
    /// Sum of the member sentences' token counts.
    pub token_count: usize,
    /// 0-based position of this chunk in chronological order.
    pub chunk_index: usize,
    /// Embedding of `text`, filled by a second inference pass.
    pub embedding: Option<Vec<f32>>,
}

/// Tunable parameters for the chunking dynamic program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Optimal chunk size in tokens; no penalty at or below this.
    pub optimal_size: usize,
    /// Hard limit on chunk size in tokens.
    pub max_size: usize,
    /// Penalty weight reached at `max_size`, in normalized-similarity units.
    pub lambda_size: f32,
    /// Flat per-chunk penalty, discouraging many small chunks.
    pub chunk_penalty: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            optimal_size: 470,
            max_size: 512,
            lambda_size: 3.0,
            chunk_penalty: 1.0,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            optimal_size: settings.optimal_size,
            max_size: settings.max_size,
            lambda_size: settings.lambda_size,
            chunk_penalty: settings.chunk_penalty,
        }
    }
}

/// Cosine similarity `a.b / (|a| |b|)`.
///
/// Mismatched lengths and zero-norm inputs have no defined similarity;
/// such pairs contribute 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_config_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.optimal_size, 470);
        assert_eq!(config.max_size, 512);
        assert!((config.lambda_size - 3.0).abs() < f32::EPSILON);
        assert!((config.chunk_penalty - 1.0).abs() < f32::EPSILON);
    }
}
