//! # lectern
//!
//! Processing core for a lecture Q&A pipeline: turns raw SubRip (SRT)
//! transcripts of lecture videos into timestamped, size-bounded,
//! semantically coherent text chunks, each carrying a transformer
//! embedding suitable for approximate-nearest-neighbor retrieval.
//!
//! The pipeline per lecture: parse the SRT into frames, merge frames into
//! sentences (anchored to the first frame's timestamp), embed the
//! sentences, partition them into chunks with a dynamic program that
//! trades semantic coherence against chunk size, embed each chunk's full
//! text, and persist one row per chunk.

pub mod bus;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod srt;
pub mod store;

pub use chunking::{Chunk, ChunkingConfig, SemanticChunker};
pub use config::Settings;
pub use error::{LecternError, Result};
pub use pipeline::{ProcessOutcome, Processor};
pub use srt::{Frame, Sentence};
pub use store::{EmbeddingRow, Transcript, TranscriptKey};
