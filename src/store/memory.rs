//! In-memory lecture store for tests and ephemeral runs.

use super::{EmbeddingRow, LectureStore, LectureSummary, Transcript, TranscriptKey};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// HashMap-backed store guarded by a mutex.
#[derive(Default)]
pub struct MemoryStore {
    transcripts: Mutex<HashMap<TranscriptKey, Transcript>>,
    embeddings: Mutex<HashMap<TranscriptKey, Vec<EmbeddingRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back embedding rows for one lecture, in chunk order.
    pub fn get_embeddings(&self, key: &TranscriptKey) -> Result<Vec<EmbeddingRow>> {
        let embeddings = self
            .embeddings
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;
        let mut rows = embeddings.get(key).cloned().unwrap_or_default();
        rows.sort_by_key(|r| r.chunk_index);
        Ok(rows)
    }
}

fn row_key(row: &EmbeddingRow) -> TranscriptKey {
    TranscriptKey {
        class_name: row.class_name.clone(),
        professor: row.professor.clone(),
        semester: row.semester.clone(),
        url: row.url.clone(),
    }
}

#[async_trait]
impl LectureStore for MemoryStore {
    async fn store_transcript(&self, transcript: &Transcript) -> Result<()> {
        let mut transcripts = self
            .transcripts
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;
        transcripts.insert(transcript.key(), transcript.clone());
        Ok(())
    }

    async fn fetch_transcript(&self, key: &TranscriptKey) -> Result<Option<Transcript>> {
        let transcripts = self
            .transcripts
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;
        Ok(transcripts.get(key).cloned())
    }

    async fn insert_embeddings(&self, rows: &[EmbeddingRow]) -> Result<usize> {
        let mut embeddings = self
            .embeddings
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;

        for row in rows {
            let lecture_rows = embeddings.entry(row_key(row)).or_default();
            // Idempotent on (key, chunk_index): replace, never duplicate.
            lecture_rows.retain(|r| r.chunk_index != row.chunk_index);
            lecture_rows.push(row.clone());
        }
        Ok(rows.len())
    }

    async fn delete_embeddings(&self, key: &TranscriptKey) -> Result<usize> {
        let mut embeddings = self
            .embeddings
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;
        Ok(embeddings.remove(key).map(|rows| rows.len()).unwrap_or(0))
    }

    async fn list_lectures(&self) -> Result<Vec<LectureSummary>> {
        let transcripts = self
            .transcripts
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;
        let embeddings = self
            .embeddings
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))?;

        let mut lectures: Vec<LectureSummary> = transcripts
            .values()
            .map(|t| LectureSummary {
                key: t.key(),
                lecture_title: t.lecture_title.clone(),
                lecture_number: t.lecture_number,
                chunk_count: embeddings.get(&t.key()).map(|r| r.len()).unwrap_or(0),
            })
            .collect();
        lectures.sort_by_key(|l| (l.key.class_name.clone(), l.lecture_number));
        Ok(lectures)
    }
}
