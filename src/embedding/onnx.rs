//! ONNX Runtime embedding engine.
//!
//! Loads a transformer encoder (`input_ids`, `attention_mask`,
//! `token_type_ids` -> `last_hidden_state`) and embeds batches of texts by
//! CLS pooling: the vector for each input is `last_hidden_state[i, 0, :]`.
//! CLS pooling, not mean pooling, fixes the retrieval geometry downstream;
//! the two are not interchangeable.

use super::{BatchEncoding, Embedder, TextTokenizer};
use crate::config::Settings;
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Embedding engine backed by an ONNX Runtime session.
///
/// One instance per process; forward passes are serialized internally.
pub struct OnnxEmbedder {
    tokenizer: Arc<TextTokenizer>,
    session: Mutex<Session>,
    hidden_size: usize,
    max_batch_tokens: usize,
}

impl OnnxEmbedder {
    /// Load the model and prepare a session. CUDA is requested for the
    /// configured device; on failure the engine falls back to CPU with all
    /// available threads and keeps going.
    pub fn new(settings: &Settings, tokenizer: Arc<TextTokenizer>) -> Result<Self> {
        let model_path = settings.model_path();
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let cuda = CUDAExecutionProvider::default()
            .with_device_id(settings.model.cuda_device)
            .build()
            .error_on_failure();

        let session = match Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .with_execution_providers([cuda])
            .and_then(|builder| builder.commit_from_file(&model_path))
        {
            Ok(session) => {
                info!(
                    "Loaded model from {:?} (CUDA device {})",
                    model_path, settings.model.cuda_device
                );
                session
            }
            Err(e) => {
                warn!("CUDA unavailable, falling back to CPU: {}", e);
                Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .with_intra_threads(threads)?
                    .commit_from_file(&model_path)?
            }
        };

        Ok(Self {
            tokenizer,
            session: Mutex::new(session),
            hidden_size: settings.model.hidden_size,
            max_batch_tokens: settings.model.max_batch_tokens,
        })
    }

    /// Run one forward pass and copy each row's CLS vector out of the
    /// output tensor before the outputs are released.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encoding = self.tokenizer.encode_batch(texts)?;
        if encoding.batch_size == 0 {
            return Ok(Vec::new());
        }

        let BatchEncoding {
            input_ids,
            attention_mask,
            token_type_ids,
            batch_size,
            max_len,
        } = encoding;
        let shape = [batch_size as i64, max_len as i64];

        let input_ids = Tensor::from_array((shape, input_ids))?;
        let attention_mask = Tensor::from_array((shape, attention_mask))?;
        let token_type_ids = Tensor::from_array((shape, token_type_ids))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| LecternError::Embedding(format!("failed to acquire session: {}", e)))?;

        let outputs = session.run(ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        ])?;

        // Output shape is [batch_size, seq_len, hidden].
        let (out_shape, data) = outputs["last_hidden_state"].try_extract_tensor::<f32>()?;
        if out_shape.len() != 3 {
            return Err(LecternError::Embedding(format!(
                "expected rank-3 last_hidden_state, got shape {:?}",
                out_shape
            )));
        }
        let seq_len = out_shape[1] as usize;
        let hidden = out_shape[2] as usize;
        if hidden != self.hidden_size {
            return Err(LecternError::Embedding(format!(
                "model hidden size {} does not match configured {}",
                hidden, self.hidden_size
            )));
        }

        let mut vectors = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let cls_start = i * seq_len * hidden;
            vectors.push(data[cls_start..cls_start + hidden].to_vec());
        }

        debug!(
            "Embedded batch of {} (padded len {}, hidden {})",
            batch_size, max_len, hidden
        );
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed(&self, texts: &[String], token_counts: &[usize]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if token_counts.len() != texts.len() {
            return Err(LecternError::Embedding(format!(
                "token count length {} does not match text count {}",
                token_counts.len(),
                texts.len()
            )));
        }

        let mut all = Vec::with_capacity(texts.len());
        for range in plan_batches(token_counts, self.max_batch_tokens) {
            all.extend(self.embed_batch(&texts[range])?);
        }
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.hidden_size
    }
}

/// Pack texts into batches, in arrival order, so that
/// `(batch_size + 1) * new_max_seq_len` never exceeds `max_batch_tokens`.
///
/// The cost model is `batch_size * padded_len`, since padding to the batch
/// maximum is what actually occupies device memory. A first text that
/// alone exceeds the budget still forms a singleton batch.
pub fn plan_batches(token_counts: &[usize], max_batch_tokens: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;

    while start < token_counts.len() {
        let mut end = start;
        let mut max_seq_len = 0usize;

        while end < token_counts.len() {
            let new_max = max_seq_len.max(token_counts[end]);
            let total = (end - start + 1) * new_max;
            if end > start && total > max_batch_tokens {
                break;
            }
            max_seq_len = new_max;
            end += 1;
        }

        batches.push(start..end);
        start = end;
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_empty() {
        assert!(plan_batches(&[], 12_000).is_empty());
    }

    #[test]
    fn test_plan_single_batch() {
        let batches = plan_batches(&[50, 40, 60], 12_000);
        assert_eq!(batches, vec![0..3]);
    }

    #[test]
    fn test_plan_splits_on_budget() {
        // With budget 100 and uniform length 30, admitting the third text
        // costs (2+1)*30 = 90; the fourth would cost (3+1)*30 = 120.
        let batches = plan_batches(&[30, 30, 30, 30], 100);
        assert_eq!(batches, vec![0..3, 3..4]);
    }

    #[test]
    fn test_plan_padding_dominates() {
        // A long text raises the padded length for the whole batch:
        // admitting 90 after 10 would cost (1+1)*90 = 180 > 100.
        let batches = plan_batches(&[10, 90, 10], 100);
        assert_eq!(batches, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_plan_degenerate_oversize_text() {
        // A first text over budget still forms a singleton batch.
        let batches = plan_batches(&[500, 10, 10], 100);
        assert_eq!(batches, vec![0..1, 1..3]);
    }

    #[test]
    fn test_plan_preserves_order_and_coverage() {
        let counts = vec![7, 13, 400, 2, 2, 2, 512, 1];
        let batches = plan_batches(&counts, 600);

        let mut covered = Vec::new();
        for range in &batches {
            covered.extend(range.clone());
        }
        assert_eq!(covered, (0..counts.len()).collect::<Vec<_>>());
    }
}
