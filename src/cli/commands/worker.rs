//! Worker loop: consume transcript events until terminated.

use crate::bus::{EventSource, JsonlEventSource};
use crate::config::Settings;
use crate::error::Result;
use crate::pipeline::Processor;
use std::time::Duration;
use tracing::{error, info};

pub async fn run_worker(events: Option<String>, settings: Settings) -> Result<()> {
    let events_path = match events {
        Some(path) => Settings::expand_path(&path),
        None => settings.events_path(),
    };
    let poll_interval = Duration::from_millis(settings.bus.poll_interval_ms);

    eprintln!("  Loading model...");
    let processor = Processor::new(&settings)?;
    let mut source = JsonlEventSource::open(&events_path)?;

    eprintln!("  Consuming events from {:?} (ctrl-c to stop)", events_path);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Termination signal received, stopping");
                break;
            }
            polled = source.poll() => {
                match polled? {
                    Some(event) => {
                        info!(
                            "Processing {} - {} - lecture {}",
                            event.class_name, event.lecture_title, event.lecture_number
                        );
                        match processor.process_event(&event).await {
                            Ok(outcome) => {
                                // Commit only after the job lands; a crash
                                // before this point redelivers the event.
                                source.commit().await?;
                                eprintln!(
                                    "  {} -> {} sentences, {} chunks",
                                    event.key(),
                                    outcome.sentences,
                                    outcome.chunks_written
                                );
                            }
                            Err(e) => {
                                error!("Failed to process {}: {}", event.key(), e);
                            }
                        }
                    }
                    None => {
                        tokio::time::sleep(poll_interval).await;
                    }
                }
            }
        }
    }

    Ok(())
}
