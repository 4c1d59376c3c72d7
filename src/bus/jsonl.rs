//! File-backed event source: newline-delimited JSON events plus a sidecar
//! offset file recording the committed position.
//!
//! Stands in for the message topic in local and development runs while
//! keeping the consumer semantics: `poll` replays every line past the
//! committed offset, and only `commit` moves the offset, so a crash
//! between the two redelivers the in-flight event.

use super::{EventSource, TranscriptEvent};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Event source over a `.jsonl` file.
pub struct JsonlEventSource {
    events_path: PathBuf,
    offset_path: PathBuf,
    /// Line number of the next line to deliver.
    position: usize,
    /// Lines delivered since the last commit.
    delivered: usize,
}

impl JsonlEventSource {
    /// Open the events file, resuming from the committed offset if a
    /// sidecar offset file exists.
    pub fn open(events_path: &Path) -> Result<Self> {
        let offset_path = offset_path_for(events_path);
        let position = read_offset(&offset_path);

        info!(
            "Opened event source {:?} at offset {}",
            events_path, position
        );
        Ok(Self {
            events_path: events_path.to_path_buf(),
            offset_path,
            position,
            delivered: 0,
        })
    }
}

fn offset_path_for(events_path: &Path) -> PathBuf {
    let mut os = events_path.as_os_str().to_os_string();
    os.push(".offset");
    PathBuf::from(os)
}

fn read_offset(offset_path: &Path) -> usize {
    std::fs::read_to_string(offset_path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl EventSource for JsonlEventSource {
    async fn poll(&mut self) -> Result<Option<TranscriptEvent>> {
        // Re-read on every poll so events appended while the worker runs
        // are picked up.
        let content = match std::fs::read_to_string(&self.events_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        for (line_no, line) in content.lines().enumerate().skip(self.position) {
            self.position = line_no + 1;
            self.delivered += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<TranscriptEvent>(line) {
                Ok(event) => {
                    debug!("Delivering event at line {}", line_no);
                    return Ok(Some(event));
                }
                Err(e) => {
                    warn!("Skipping malformed event at line {}: {}", line_no, e);
                    continue;
                }
            }
        }

        Ok(None)
    }

    async fn commit(&mut self) -> Result<()> {
        if self.delivered == 0 {
            return Ok(());
        }
        std::fs::write(&self.offset_path, self.position.to_string())?;
        debug!(
            "Committed offset {} ({} delivered)",
            self.position, self.delivered
        );
        self.delivered = 0;
        Ok(())
    }
}
