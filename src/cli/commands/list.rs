//! List stored lectures.

use super::open_store;
use crate::config::Settings;
use crate::error::Result;
use crate::store::LectureStore;

pub async fn run_list(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let lectures = store.list_lectures().await?;

    if lectures.is_empty() {
        println!("No lectures stored.");
        return Ok(());
    }

    println!("{} lecture(s):", lectures.len());
    for lecture in lectures {
        println!(
            "  [{:>3}] {} - {} ({} chunks)",
            lecture.lecture_number, lecture.key, lecture.lecture_title, lecture.chunk_count
        );
    }
    Ok(())
}
