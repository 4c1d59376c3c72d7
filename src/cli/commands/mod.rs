//! CLI command implementations.

mod ingest;
mod list;
mod process;
mod worker;

pub use ingest::run_ingest;
pub use list::run_list;
pub use process::run_process;
pub use worker::run_worker;

use crate::config::Settings;
use crate::error::{LecternError, Result};
use crate::store::{LectureStore, MemoryStore, SqliteStore};
use std::sync::Arc;

/// Open the configured store without loading model artifacts.
pub(crate) fn open_store(settings: &Settings) -> Result<Arc<dyn LectureStore>> {
    match settings.store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(LecternError::Config(format!(
            "unknown store provider: {}",
            other
        ))),
    }
}
