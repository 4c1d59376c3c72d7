//! Wrapper around a pre-trained subword tokenizer artifact.

use super::TokenCounter;
use crate::error::{LecternError, Result};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

/// A batch of encodings, right-padded to the longest sequence and
/// flattened row-major into `[batch_size, max_len]` buffers ready for
/// tensor construction. Token type ids are implicitly zero.
#[derive(Debug, Clone)]
pub struct BatchEncoding {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
    pub batch_size: usize,
    pub max_len: usize,
}

/// Deterministic text-to-token-id conversion backed by a serialized
/// HuggingFace tokenizer definition.
pub struct TextTokenizer {
    inner: Tokenizer,
}

impl TextTokenizer {
    /// Load the tokenizer definition from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let inner = Tokenizer::from_file(path).map_err(|e| {
            LecternError::Tokenizer(format!("failed to load tokenizer from {:?}: {}", path, e))
        })?;
        info!("Loaded tokenizer from {:?}", path);
        Ok(Self { inner })
    }

    /// Encode a batch of texts with right-padding to the batch's longest
    /// sequence. Every unpadded row length equals `count` for that text.
    pub fn encode_batch(&self, texts: &[String]) -> Result<BatchEncoding> {
        let inputs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
        let encodings = self
            .inner
            .encode_batch(inputs, true)
            .map_err(|e| LecternError::Tokenizer(format!("batch tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let token_type_ids = vec![0i64; batch_size * max_len];

        for (i, enc) in encodings.iter().enumerate() {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            let offset = i * max_len;
            for (j, &id) in ids.iter().enumerate() {
                input_ids[offset + j] = id as i64;
                attention_mask[offset + j] = mask[j] as i64;
            }
        }

        Ok(BatchEncoding {
            input_ids,
            attention_mask,
            token_type_ids,
            batch_size,
            max_len,
        })
    }
}

impl TokenCounter for TextTokenizer {
    fn count(&self, text: &str) -> Result<usize> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| LecternError::Tokenizer(format!("tokenization failed: {}", e)))?;
        Ok(encoding.get_ids().len())
    }
}
