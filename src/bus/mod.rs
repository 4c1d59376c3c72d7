//! Inbound transcript events.
//!
//! In production the events arrive on a message topic with at-least-once
//! delivery; the worker only depends on this trait. An event names a
//! transcript to process, not the transcript itself.

mod jsonl;

pub use jsonl::JsonlEventSource;

use crate::error::Result;
use crate::store::TranscriptKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A transcript-ready event as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub class_name: String,
    pub professor: String,
    pub semester: String,
    pub url: String,
    pub lecture_number: i32,
    pub lecture_title: String,
}

impl TranscriptEvent {
    pub fn key(&self) -> TranscriptKey {
        TranscriptKey {
            class_name: self.class_name.clone(),
            professor: self.professor.clone(),
            semester: self.semester.clone(),
            url: self.url.clone(),
        }
    }
}

/// Trait for event sources with at-least-once delivery.
///
/// `poll` advances an in-memory position; `commit` persists everything
/// delivered so far. An event delivered but never committed is redelivered
/// after a restart.
#[async_trait]
pub trait EventSource: Send {
    /// Next pending event, or None when the source is currently drained.
    async fn poll(&mut self) -> Result<Option<TranscriptEvent>>;

    /// Mark all delivered events as processed.
    async fn commit(&mut self) -> Result<()>;
}
