//! Store a local SRT file as a transcript row.

use super::open_store;
use crate::config::Settings;
use crate::error::Result;
use crate::srt::clean_srt_text;
use crate::store::{LectureStore, Transcript};
use std::path::Path;

pub async fn run_ingest(
    file: &str,
    class_name: &str,
    professor: &str,
    semester: &str,
    url: &str,
    lecture_number: i32,
    title: Option<String>,
    show: bool,
    settings: Settings,
) -> Result<()> {
    let path = Path::new(file);
    let transcript_text = std::fs::read_to_string(path)?;

    let lecture_title = title.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });

    let transcript = Transcript {
        class_name: class_name.to_string(),
        professor: professor.to_string(),
        semester: semester.to_string(),
        url: url.to_string(),
        lecture_title,
        lecture_number,
        transcript_text,
    };

    let store = open_store(&settings)?;
    store.store_transcript(&transcript).await?;

    println!(
        "Stored transcript '{}' ({} characters) as {}",
        transcript.lecture_title,
        transcript.transcript_text.len(),
        transcript.key()
    );

    if show {
        println!("{}", clean_srt_text(&transcript.transcript_text));
    }
    Ok(())
}
