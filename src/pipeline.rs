//! Per-job processing pipeline.
//!
//! For each transcript event: fetch the raw SRT, parse it into frames,
//! assemble sentences, embed the sentences, run the semantic chunker,
//! embed each chunk's full text with a fresh forward pass, and persist
//! one row per chunk. Stages run sequentially; the chunker needs every
//! sentence embedding before it can start.

use crate::bus::TranscriptEvent;
use crate::chunking::{Chunk, ChunkingConfig, SemanticChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, MockEmbedder, OnnxEmbedder, TextTokenizer, TokenCounter};
use crate::error::{LecternError, Result};
use crate::srt::{assemble_sentences, parse_srt, Sentence};
use crate::store::{EmbeddingRow, LectureStore, MemoryStore, SqliteStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The per-job pipeline driver.
///
/// Jobs are independent; concurrent jobs share only the tokenizer, the
/// embedder (which serializes forward passes internally) and the store
/// session.
pub struct Processor {
    chunking: ChunkingConfig,
    tokenizer: Arc<dyn TokenCounter>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn LectureStore>,
}

impl Processor {
    /// Build a processor from settings: tokenizer and model artifacts are
    /// loaded from disk once, the store is opened per the configured
    /// provider. Fails fast if any artifact is missing.
    pub fn new(settings: &Settings) -> Result<Self> {
        let tokenizer = Arc::new(TextTokenizer::from_file(&settings.tokenizer_path())?);
        let embedder: Arc<dyn Embedder> =
            Arc::new(OnnxEmbedder::new(settings, tokenizer.clone())?);

        let store: Arc<dyn LectureStore> = match settings.store.provider.as_str() {
            "sqlite" => Arc::new(SqliteStore::new(&settings.sqlite_path())?),
            "memory" => Arc::new(MemoryStore::new()),
            other => {
                return Err(LecternError::Config(format!(
                    "unknown store provider: {}",
                    other
                )))
            }
        };

        Ok(Self {
            chunking: ChunkingConfig::from(&settings.chunking),
            tokenizer,
            embedder,
            store,
        })
    }

    /// Build a processor from injected components.
    pub fn with_components(
        chunking: ChunkingConfig,
        tokenizer: Arc<dyn TokenCounter>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn LectureStore>,
    ) -> Self {
        Self {
            chunking,
            tokenizer,
            embedder,
            store,
        }
    }

    /// Build a processor over in-memory components, without model
    /// artifacts. Useful for tests and dry runs.
    pub fn in_memory(chunking: ChunkingConfig, dimensions: usize) -> Self {
        let mock = Arc::new(MockEmbedder::new(dimensions));
        Self {
            chunking,
            tokenizer: mock.clone(),
            embedder: mock,
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Get the store (for ingestion and listings).
    pub fn store(&self) -> Arc<dyn LectureStore> {
        self.store.clone()
    }

    /// Process one transcript event end to end.
    ///
    /// A transcript that yields no sentences (empty or unparseable SRT)
    /// completes successfully with zero chunks. Every other failure
    /// aborts the job.
    #[instrument(skip(self), fields(key = %event.key()))]
    pub async fn process_event(&self, event: &TranscriptEvent) -> Result<ProcessOutcome> {
        let key = event.key();

        let transcript = self
            .store
            .fetch_transcript(&key)
            .await?
            .ok_or_else(|| LecternError::TranscriptNotFound(key.to_string()))?;
        info!(
            "Retrieved transcript ({} characters)",
            transcript.transcript_text.len()
        );

        let frames = parse_srt(&transcript.transcript_text);
        info!("Parsed {} frames", frames.len());

        let mut sentences =
            assemble_sentences(&frames, self.tokenizer.as_ref(), self.chunking.max_size);
        info!("Assembled {} sentences", sentences.len());

        if sentences.is_empty() {
            warn!("Transcript yielded no sentences, emitting zero chunks");
            return Ok(ProcessOutcome {
                sentences: 0,
                chunks_written: 0,
            });
        }

        self.embed_sentences(&mut sentences).await?;

        let chunker = SemanticChunker::new(self.chunking.clone());
        let mut chunks = chunker.chunk(&sentences)?;
        info!("Created {} chunks", chunks.len());

        self.embed_chunks(&mut chunks).await?;

        let rows = build_rows(event, &chunks)?;
        // Clear any rows from a previous run first: a re-run that yields
        // fewer chunks must not leave stale high indices behind.
        self.store.delete_embeddings(&key).await?;
        let written = self.store.insert_embeddings(&rows).await?;
        info!("Inserted {} chunk rows", written);

        Ok(ProcessOutcome {
            sentences: sentences.len(),
            chunks_written: written,
        })
    }

    /// Fill every sentence's embedding in place.
    async fn embed_sentences(&self, sentences: &mut [Sentence]) -> Result<()> {
        let texts: Vec<String> = sentences.iter().map(|s| s.text.clone()).collect();
        let counts: Vec<usize> = sentences.iter().map(|s| s.token_count).collect();

        let vectors = self.embedder.embed(&texts, &counts).await?;
        if vectors.len() != sentences.len() {
            return Err(LecternError::Embedding(format!(
                "embedder returned {} vectors for {} sentences",
                vectors.len(),
                sentences.len()
            )));
        }

        for (sentence, vector) in sentences.iter_mut().zip(vectors) {
            sentence.embedding = Some(vector);
        }
        Ok(())
    }

    /// Embed each chunk's joined text with a fresh forward pass. Averaging
    /// the member sentence vectors would be cheaper but produces a
    /// different geometry than CLS pooling over the full text.
    async fn embed_chunks(&self, chunks: &mut [Chunk]) -> Result<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let counts: Vec<usize> = chunks.iter().map(|c| c.token_count).collect();

        let vectors = self.embedder.embed(&texts, &counts).await?;
        if vectors.len() != chunks.len() {
            return Err(LecternError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        for (chunk, vector) in chunks.iter_mut().zip(vectors) {
            chunk.embedding = Some(vector);
        }
        Ok(())
    }
}

/// Result of processing one event.
#[derive(Debug)]
pub struct ProcessOutcome {
    /// Sentences assembled from the transcript.
    pub sentences: usize,
    /// Chunk rows written to the store.
    pub chunks_written: usize,
}

fn build_rows(event: &TranscriptEvent, chunks: &[Chunk]) -> Result<Vec<EmbeddingRow>> {
    let created_at = Utc::now();
    chunks
        .iter()
        .map(|chunk| {
            let embedding = chunk.embedding.clone().ok_or_else(|| {
                LecternError::Embedding(format!("chunk {} has no embedding", chunk.chunk_index))
            })?;
            Ok(EmbeddingRow {
                class_name: event.class_name.clone(),
                professor: event.professor.clone(),
                semester: event.semester.clone(),
                url: event.url.clone(),
                chunk_index: chunk.chunk_index as i32,
                chunk_text: chunk.text.clone(),
                embedding,
                token_count: chunk.token_count as i32,
                lecture_title: event.lecture_title.clone(),
                lecture_timestamp: chunk.start_time.clone(),
                created_at,
            })
        })
        .collect()
}
