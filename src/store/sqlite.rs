//! SQLite-backed lecture store.
//!
//! Mirrors the wide-column layout: the embeddings table's primary key is
//! the partition columns followed by the clustering columns, and inserts
//! are `INSERT OR REPLACE` so retries after a partial failure overwrite
//! cleanly. Embeddings are stored as little-endian f32 BLOBs.

use super::{EmbeddingRow, LectureStore, LectureSummary, Transcript, TranscriptKey};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transcripts (
    class_name      TEXT NOT NULL,
    professor       TEXT NOT NULL,
    semester        TEXT NOT NULL,
    url             TEXT NOT NULL,
    lecture_title   TEXT NOT NULL,
    lecture_number  INTEGER NOT NULL,
    transcript_text TEXT NOT NULL,
    PRIMARY KEY (class_name, professor, semester, url)
);

CREATE TABLE IF NOT EXISTS embeddings (
    class_name        TEXT NOT NULL,
    professor         TEXT NOT NULL,
    semester          TEXT NOT NULL,
    url               TEXT NOT NULL,
    chunk_index       INTEGER NOT NULL,
    chunk_text        TEXT NOT NULL,
    embedding         BLOB NOT NULL,
    token_count       INTEGER NOT NULL,
    lecture_title     TEXT NOT NULL,
    lecture_timestamp TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    PRIMARY KEY (class_name, professor, semester, url, chunk_index)
);
"#;

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened lecture store at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, useful for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LecternError::Store(format!("failed to acquire lock: {}", e)))
    }

    /// Serialize an embedding to little-endian bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize an embedding from little-endian bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl LectureStore for SqliteStore {
    #[instrument(skip(self, transcript), fields(key = %transcript.key()))]
    async fn store_transcript(&self, transcript: &Transcript) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO transcripts
            (class_name, professor, semester, url, lecture_title, lecture_number, transcript_text)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                transcript.class_name,
                transcript.professor,
                transcript.semester,
                transcript.url,
                transcript.lecture_title,
                transcript.lecture_number,
                transcript.transcript_text,
            ],
        )?;

        debug!("Stored transcript");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn fetch_transcript(&self, key: &TranscriptKey) -> Result<Option<Transcript>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            r#"
            SELECT class_name, professor, semester, url,
                   lecture_title, lecture_number, transcript_text
            FROM transcripts
            WHERE class_name = ?1 AND professor = ?2 AND semester = ?3 AND url = ?4
            "#,
            params![key.class_name, key.professor, key.semester, key.url],
            |row| {
                Ok(Transcript {
                    class_name: row.get(0)?,
                    professor: row.get(1)?,
                    semester: row.get(2)?,
                    url: row.get(3)?,
                    lecture_title: row.get(4)?,
                    lecture_number: row.get(5)?,
                    transcript_text: row.get(6)?,
                })
            },
        );

        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert_embeddings(&self, rows: &[EmbeddingRow]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for row in rows {
            let embedding_bytes = Self::embedding_to_bytes(&row.embedding);

            tx.execute(
                r#"
                INSERT OR REPLACE INTO embeddings
                (class_name, professor, semester, url, chunk_index,
                 chunk_text, embedding, token_count, lecture_title, lecture_timestamp, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    row.class_name,
                    row.professor,
                    row.semester,
                    row.url,
                    row.chunk_index,
                    row.chunk_text,
                    embedding_bytes,
                    row.token_count,
                    row.lecture_title,
                    row.lecture_timestamp,
                    row.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Inserted {} embedding rows", rows.len());
        Ok(rows.len())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete_embeddings(&self, key: &TranscriptKey) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            r#"
            DELETE FROM embeddings
            WHERE class_name = ?1 AND professor = ?2 AND semester = ?3 AND url = ?4
            "#,
            params![key.class_name, key.professor, key.semester, key.url],
        )?;

        debug!("Deleted {} embedding rows", deleted);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_lectures(&self) -> Result<Vec<LectureSummary>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.class_name, t.professor, t.semester, t.url,
                   t.lecture_title, t.lecture_number,
                   (SELECT COUNT(*) FROM embeddings e
                    WHERE e.class_name = t.class_name AND e.professor = t.professor
                      AND e.semester = t.semester AND e.url = t.url) AS chunk_count
            FROM transcripts t
            ORDER BY t.class_name, t.semester, t.lecture_number
            "#,
        )?;

        let lectures = stmt.query_map([], |row| {
            Ok(LectureSummary {
                key: TranscriptKey {
                    class_name: row.get(0)?,
                    professor: row.get(1)?,
                    semester: row.get(2)?,
                    url: row.get(3)?,
                },
                lecture_title: row.get(4)?,
                lecture_number: row.get(5)?,
                chunk_count: row.get::<_, i64>(6)? as usize,
            })
        })?;

        Ok(lectures.filter_map(|l| l.ok()).collect())
    }
}

// Row readback is not part of the LectureStore trait; retrieval services
// query the embeddings table directly.
impl SqliteStore {
    /// Read back embedding rows for one lecture, in chunk order.
    pub fn get_embeddings(&self, key: &TranscriptKey) -> Result<Vec<EmbeddingRow>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT class_name, professor, semester, url, chunk_index,
                   chunk_text, embedding, token_count, lecture_title,
                   lecture_timestamp, created_at
            FROM embeddings
            WHERE class_name = ?1 AND professor = ?2 AND semester = ?3 AND url = ?4
            ORDER BY chunk_index
            "#,
        )?;

        let rows = stmt.query_map(
            params![key.class_name, key.professor, key.semester, key.url],
            |row| {
                let embedding_bytes: Vec<u8> = row.get(6)?;
                let created_at_str: String = row.get(10)?;
                Ok(EmbeddingRow {
                    class_name: row.get(0)?,
                    professor: row.get(1)?,
                    semester: row.get(2)?,
                    url: row.get(3)?,
                    chunk_index: row.get(4)?,
                    chunk_text: row.get(5)?,
                    embedding: Self::bytes_to_embedding(&embedding_bytes),
                    token_count: row.get(7)?,
                    lecture_title: row.get(8)?,
                    lecture_timestamp: row.get(9)?,
                    created_at: DateTime::parse_from_rfc3339(&created_at_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            },
        )?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
