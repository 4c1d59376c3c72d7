//! Dynamic-programming semantic chunker.
//!
//! Partitions the sentence sequence into contiguous segments maximizing
//!
//! ```text
//! sum over segments of [ reward - size_penalty - chunk_penalty ]
//! ```
//!
//! subject to a hard token ceiling per segment. The reward for a segment
//! is the sum of min-max-normalized cosine similarities between adjacent
//! sentences strictly inside it; prefix sums make each DP transition O(1),
//! so the whole program is O(n^2) for n sentences (typically low thousands).

use super::{cosine_similarity, Chunk, ChunkingConfig};
use crate::error::{LecternError, Result};
use crate::srt::Sentence;
use tracing::debug;

/// Chunker over embedded sentences.
pub struct SemanticChunker {
    config: ChunkingConfig,
}

impl SemanticChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Partition `sentences` into chunks.
    ///
    /// Requires every sentence to carry an embedding and to fit within the
    /// hard token limit; both are preprocessing invariants and violating
    /// them is an error naming the offending sentence index.
    pub fn chunk(&self, sentences: &[Sentence]) -> Result<Vec<Chunk>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        if sentences.len() == 1 {
            return Ok(vec![build_chunk(sentences, 0)]);
        }

        let n = sentences.len();

        // Every sentence must fit on its own, otherwise no legal partition
        // exists at all.
        for (idx, s) in sentences.iter().enumerate() {
            if s.token_count > self.config.max_size {
                return Err(LecternError::Chunking(format!(
                    "sentence {} has token_count={} > max_size={}; \
                     sentence splitting failed upstream",
                    idx, s.token_count, self.config.max_size
                )));
            }
        }

        let sim = normalized_adjacent_similarities(sentences)?;

        // prefix_sim[i] is the sum of the first i adjacent similarities, so
        // the similarity mass strictly inside segment [i, j) is
        // prefix_sim[j-1] - prefix_sim[i]. Summing only adjacent pairs
        // (rather than all pairwise similarities) is what keeps each DP
        // transition constant-time.
        let mut prefix_sim = vec![0.0f32; n + 1];
        for i in 0..n - 1 {
            prefix_sim[i + 1] = prefix_sim[i] + sim[i];
        }
        prefix_sim[n] = prefix_sim[n - 1];

        let mut prefix_tokens = vec![0usize; n + 1];
        for (i, s) in sentences.iter().enumerate() {
            prefix_tokens[i + 1] = prefix_tokens[i] + s.token_count;
        }

        // dp[j]: best score over partitions of sentences[0..j].
        // start[j]: argmax predecessor, i.e. the start of the last segment.
        let mut dp = vec![f32::NEG_INFINITY; n + 1];
        dp[0] = 0.0;
        let mut start: Vec<Option<usize>> = vec![None; n + 1];
        start[0] = Some(0);

        for j in 1..=n {
            for i in 0..j {
                if dp[i] == f32::NEG_INFINITY {
                    continue;
                }
                let Some(penalty) = self.size_penalty(prefix_tokens[j] - prefix_tokens[i]) else {
                    continue;
                };
                let reward = segment_reward(i, j, &prefix_sim);
                let score = dp[i] + reward - penalty - self.config.chunk_penalty;

                // Strict > keeps the first (smallest) i at equal scores,
                // which pins the chunk boundaries reproducibly.
                if score > dp[j] {
                    dp[j] = score;
                    start[j] = Some(i);
                }
            }
        }

        if dp[n] == f32::NEG_INFINITY || start[n].is_none() {
            return Err(LecternError::Chunking(format!(
                "no valid segmentation under max_size={}; \
                 preprocessing produced an infeasible sentence sequence",
                self.config.max_size
            )));
        }

        // Backtrack the parent pointers, then flip into chronological order.
        let mut chunks = Vec::new();
        let mut pos = n;
        while pos > 0 {
            let prev = start[pos].ok_or_else(|| {
                LecternError::Chunking(format!("no predecessor recorded at position {}", pos))
            })?;
            chunks.push(build_chunk(&sentences[prev..pos], 0));
            pos = prev;
        }
        chunks.reverse();
        for (index, chunk) in chunks.iter_mut().enumerate() {
            chunk.chunk_index = index;
        }

        debug!(
            "Chunked {} sentences into {} chunks (score {:.4})",
            n,
            chunks.len(),
            dp[n]
        );
        Ok(chunks)
    }

    /// Smooth size penalty for a segment of `token_count` tokens.
    ///
    /// Returns `None` when the segment exceeds the hard limit (illegal),
    /// 0 at or below the optimal size, and a hinge rising linearly to
    /// `lambda_size` at the hard limit in between.
    fn size_penalty(&self, token_count: usize) -> Option<f32> {
        if token_count > self.config.max_size {
            return None;
        }
        if token_count <= self.config.optimal_size {
            return Some(0.0);
        }
        let normalized = (token_count - self.config.optimal_size) as f32
            / (self.config.max_size - self.config.optimal_size) as f32;
        Some(self.config.lambda_size * normalized)
    }
}

/// Sum of adjacent similarities strictly inside segment `[i, j)`.
/// Single-sentence segments have no internal edges.
fn segment_reward(i: usize, j: usize, prefix_sim: &[f32]) -> f32 {
    if j - i <= 1 {
        return 0.0;
    }
    prefix_sim[j - 1] - prefix_sim[i]
}

/// Adjacent cosine similarities, min-max normalized to [0, 1] so rewards
/// stay non-negative. A zero range maps every value to 0.5.
fn normalized_adjacent_similarities(sentences: &[Sentence]) -> Result<Vec<f32>> {
    let n = sentences.len();
    let mut sim = vec![0.0f32; n - 1];

    for i in 0..n - 1 {
        let a = embedding_of(sentences, i)?;
        let b = embedding_of(sentences, i + 1)?;
        sim[i] = cosine_similarity(a, b);
    }

    let min = sim.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = sim.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    if range == 0.0 {
        for v in &mut sim {
            *v = 0.5;
        }
    } else {
        for v in &mut sim {
            *v = (*v - min) / range;
        }
    }

    Ok(sim)
}

fn embedding_of(sentences: &[Sentence], idx: usize) -> Result<&Vec<f32>> {
    sentences[idx].embedding.as_ref().ok_or_else(|| {
        LecternError::Chunking(format!(
            "sentence {} has no embedding; embed sentences before chunking",
            idx
        ))
    })
}

/// Assemble one chunk from a contiguous slice of sentences.
fn build_chunk(sentences: &[Sentence], chunk_index: usize) -> Chunk {
    let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
    Chunk {
        text: texts.join(" "),
        start_time: sentences[0].start_time.clone(),
        num_sentences: sentences.len(),
        token_count: sentences.iter().map(|s| s.token_count).sum(),
        chunk_index,
        embedding: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(text: &str, start: &str, tokens: usize, embedding: Vec<f32>) -> Sentence {
        Sentence {
            text: text.to_string(),
            start_time: start.to_string(),
            token_count: tokens,
            embedding: Some(embedding),
        }
    }

    fn config(optimal: usize, max: usize) -> ChunkingConfig {
        ChunkingConfig {
            optimal_size: optimal,
            max_size: max,
            lambda_size: 3.0,
            chunk_penalty: 1.0,
        }
    }

    #[test]
    fn test_empty_input() {
        let chunker = SemanticChunker::new(ChunkingConfig::default());
        assert!(chunker.chunk(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_single_sentence() {
        let chunker = SemanticChunker::new(ChunkingConfig::default());
        let sentences = [sent("Only one.", "00:00:01,000", 3, vec![1.0, 0.0])];

        let chunks = chunker.chunk(&sentences).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].num_sentences, 1);
        assert_eq!(chunks[0].text, "Only one.");
        assert_eq!(chunks[0].start_time, "00:00:01,000");
        assert_eq!(chunks[0].token_count, 3);
    }

    #[test]
    fn test_prefers_coherent_boundaries() {
        // Three topic pairs; the hard limit admits at most two sentences
        // per chunk, and the pair boundaries carry all the similarity.
        let sentences = [
            sent("a1.", "00:00:00,000", 200, vec![1.0, 0.0]),
            sent("a2.", "00:00:05,000", 200, vec![1.0, 0.0]),
            sent("b1.", "00:00:10,000", 200, vec![0.0, 1.0]),
            sent("b2.", "00:00:15,000", 200, vec![0.0, 1.0]),
            sent("c1.", "00:00:20,000", 200, vec![-1.0, 0.0]),
            sent("c2.", "00:00:25,000", 200, vec![-1.0, 0.0]),
        ];
        let chunker = SemanticChunker::new(config(470, 512));

        let chunks = chunker.chunk(&sentences).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "a1. a2.");
        assert_eq!(chunks[1].text, "b1. b2.");
        assert_eq!(chunks[2].text, "c1. c2.");
        assert_eq!(chunks[0].start_time, "00:00:00,000");
        assert_eq!(chunks[1].start_time, "00:00:10,000");
        assert_eq!(chunks[2].start_time, "00:00:20,000");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn test_respects_hard_limit() {
        // Ten identical sentences of 100 tokens: any six together would
        // exceed 512, so no chunk may hold more than five.
        let sentences: Vec<Sentence> = (0..10)
            .map(|i| {
                sent(
                    &format!("s{}.", i),
                    &format!("00:00:{:02},000", i),
                    100,
                    vec![1.0, 0.0],
                )
            })
            .collect();
        let chunker = SemanticChunker::new(config(470, 512));

        let chunks = chunker.chunk(&sentences).unwrap();

        let total: usize = chunks.iter().map(|c| c.num_sentences).sum();
        assert_eq!(total, 10);
        for chunk in &chunks {
            assert!(chunk.num_sentences <= 5);
            assert!(chunk.token_count <= 512);
        }
    }

    #[test]
    fn test_partition_preserves_sequence() {
        let sentences: Vec<Sentence> = (0..7)
            .map(|i| {
                sent(
                    &format!("sentence {}.", i),
                    "00:00:00,000",
                    150,
                    vec![(i as f32).cos(), (i as f32).sin()],
                )
            })
            .collect();
        let chunker = SemanticChunker::new(config(470, 512));

        let chunks = chunker.chunk(&sentences).unwrap();

        let rejoined: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let original: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), original.join(" "));
    }

    #[test]
    fn test_tie_breaks_toward_earliest_start() {
        // Three identical sentences of 235 tokens: a triple is illegal
        // (705 > 512) and {0}{1,2} ties {0,1}{2} exactly. The scan keeps
        // the first predecessor, so the last chunk starts at 1.
        let sentences = [
            sent("x.", "00:00:00,000", 235, vec![1.0, 0.0]),
            sent("y.", "00:00:01,000", 235, vec![1.0, 0.0]),
            sent("z.", "00:00:02,000", 235, vec![1.0, 0.0]),
        ];
        let chunker = SemanticChunker::new(config(470, 512));

        let chunks = chunker.chunk(&sentences).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].num_sentences, 1);
        assert_eq!(chunks[1].num_sentences, 2);
        assert_eq!(chunks[1].text, "y. z.");
    }

    #[test]
    fn test_oversize_sentence_is_an_error() {
        let sentences = [
            sent("ok.", "00:00:00,000", 10, vec![1.0, 0.0]),
            sent("too big.", "00:00:01,000", 600, vec![1.0, 0.0]),
        ];
        let chunker = SemanticChunker::new(config(470, 512));

        let err = chunker.chunk(&sentences).unwrap_err();
        assert!(err.to_string().contains("sentence 1"));
    }

    #[test]
    fn test_missing_embedding_is_an_error() {
        let mut second = sent("no vector.", "00:00:01,000", 10, vec![]);
        second.embedding = None;
        let sentences = [sent("ok.", "00:00:00,000", 10, vec![1.0, 0.0]), second];
        let chunker = SemanticChunker::new(config(470, 512));

        let err = chunker.chunk(&sentences).unwrap_err();
        assert!(err.to_string().contains("sentence 1"));
        assert!(err.to_string().contains("no embedding"));
    }

    #[test]
    fn test_matches_exhaustive_search() {
        // DP score must equal the best score over every legal partition.
        let embeddings = [
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.2, 0.8],
            vec![-1.0, 0.2],
            vec![-0.9, 0.0],
        ];
        let tokens = [120, 90, 200, 60, 150, 110];
        let sentences: Vec<Sentence> = embeddings
            .iter()
            .zip(tokens.iter())
            .enumerate()
            .map(|(i, (e, &t))| sent(&format!("s{}.", i), "00:00:00,000", t, e.clone()))
            .collect();

        let cfg = config(250, 300);
        let chunker = SemanticChunker::new(cfg.clone());
        let chunks = chunker.chunk(&sentences).unwrap();

        let sim = normalized_adjacent_similarities(&sentences).unwrap();
        let dp_score = score_partition(
            &chunks.iter().map(|c| c.num_sentences).collect::<Vec<_>>(),
            &sim,
            &tokens,
            &cfg,
        )
        .expect("DP partition must be legal");

        let best = best_partition_score(&sim, &tokens, &cfg);
        assert!(
            (dp_score - best).abs() < 1e-4,
            "dp={} best={}",
            dp_score,
            best
        );
    }

    /// Score a partition given as chunk lengths; None if any segment is
    /// illegal.
    fn score_partition(
        lengths: &[usize],
        sim: &[f32],
        tokens: &[usize],
        cfg: &ChunkingConfig,
    ) -> Option<f32> {
        let chunker = SemanticChunker::new(cfg.clone());
        let mut score = 0.0;
        let mut pos = 0;
        for &len in lengths {
            let token_count: usize = tokens[pos..pos + len].iter().sum();
            let penalty = chunker.size_penalty(token_count)?;
            let reward: f32 = sim[pos..pos + len - 1].iter().sum();
            score += reward - penalty - cfg.chunk_penalty;
            pos += len;
        }
        Some(score)
    }

    /// Exhaustive maximum over all 2^(n-1) partitions.
    fn best_partition_score(sim: &[f32], tokens: &[usize], cfg: &ChunkingConfig) -> f32 {
        let n = tokens.len();
        let mut best = f32::NEG_INFINITY;

        for mask in 0..(1u32 << (n - 1)) {
            let mut lengths = Vec::new();
            let mut len = 1;
            for bit in 0..n - 1 {
                if mask & (1 << bit) != 0 {
                    lengths.push(len);
                    len = 1;
                } else {
                    len += 1;
                }
            }
            lengths.push(len);

            if let Some(score) = score_partition(&lengths, sim, tokens, cfg) {
                best = best.max(score);
            }
        }
        best
    }
}
