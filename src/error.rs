//! Error types for lectern.

use thiserror::Error;

/// Library-level error type for lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Event source error: {0}")]
    Bus(String),

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
}

/// Result type alias for lectern operations.
pub type Result<T> = std::result::Result<T, LecternError>;
