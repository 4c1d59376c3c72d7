//! Lecture store abstraction.
//!
//! The production deployment keeps transcripts and embeddings in a
//! wide-column cluster; the processing core only depends on this trait.
//! Rows are addressed by the partition key `(class_name, professor,
//! semester)` plus the clustering columns `(url, chunk_index)`, which is
//! what makes re-inserts idempotent.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composite identity of one lecture transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptKey {
    pub class_name: String,
    pub professor: String,
    pub semester: String,
    pub url: String,
}

impl std::fmt::Display for TranscriptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.class_name, self.professor, self.semester, self.url
        )
    }
}

/// A raw lecture transcript with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub class_name: String,
    pub professor: String,
    pub semester: String,
    pub url: String,
    pub lecture_title: String,
    pub lecture_number: i32,
    /// Raw SRT text.
    pub transcript_text: String,
}

impl Transcript {
    pub fn key(&self) -> TranscriptKey {
        TranscriptKey {
            class_name: self.class_name.clone(),
            professor: self.professor.clone(),
            semester: self.semester.clone(),
            url: self.url.clone(),
        }
    }
}

/// One persisted chunk row in the embeddings table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRow {
    pub class_name: String,
    pub professor: String,
    pub semester: String,
    pub url: String,
    pub chunk_index: i32,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub token_count: i32,
    pub lecture_title: String,
    /// SRT start time of the chunk's first sentence (HH:MM:SS,mmm).
    pub lecture_timestamp: String,
    pub created_at: DateTime<Utc>,
}

/// Summary of a stored lecture, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureSummary {
    pub key: TranscriptKey,
    pub lecture_title: String,
    pub lecture_number: i32,
    /// Embedded chunks currently persisted for this lecture.
    pub chunk_count: usize,
}

/// Trait for lecture store backends.
#[async_trait]
pub trait LectureStore: Send + Sync {
    /// Store a raw transcript (overwrites any previous version).
    async fn store_transcript(&self, transcript: &Transcript) -> Result<()>;

    /// Fetch a transcript by its composite key.
    async fn fetch_transcript(&self, key: &TranscriptKey) -> Result<Option<Transcript>>;

    /// Upsert a batch of embedding rows. Idempotent on the full
    /// `(class_name, professor, semester, url, chunk_index)` key.
    async fn insert_embeddings(&self, rows: &[EmbeddingRow]) -> Result<usize>;

    /// Delete all embedding rows for one lecture. Returns the number
    /// removed.
    async fn delete_embeddings(&self, key: &TranscriptKey) -> Result<usize>;

    /// List stored lectures with their persisted chunk counts.
    async fn list_lectures(&self) -> Result<Vec<LectureSummary>>;
}
