//! Process one stored transcript directly.

use crate::bus::TranscriptEvent;
use crate::config::Settings;
use crate::error::{LecternError, Result};
use crate::pipeline::Processor;
use crate::store::{LectureStore, TranscriptKey};

pub async fn run_process(
    class_name: &str,
    professor: &str,
    semester: &str,
    url: &str,
    settings: Settings,
) -> Result<()> {
    let key = TranscriptKey {
        class_name: class_name.to_string(),
        professor: professor.to_string(),
        semester: semester.to_string(),
        url: url.to_string(),
    };

    eprintln!("  Loading model...");
    let processor = Processor::new(&settings)?;

    // The event normally carries the lecture metadata; reconstruct it from
    // the stored transcript.
    let transcript = processor
        .store()
        .fetch_transcript(&key)
        .await?
        .ok_or_else(|| LecternError::TranscriptNotFound(key.to_string()))?;

    let event = TranscriptEvent {
        class_name: transcript.class_name.clone(),
        professor: transcript.professor.clone(),
        semester: transcript.semester.clone(),
        url: transcript.url.clone(),
        lecture_number: transcript.lecture_number,
        lecture_title: transcript.lecture_title.clone(),
    };

    eprintln!("  Processing '{}'...", transcript.lecture_title);
    let outcome = processor.process_event(&event).await?;

    println!(
        "Processed {}: {} sentences -> {} chunks",
        key, outcome.sentences, outcome.chunks_written
    );
    Ok(())
}
