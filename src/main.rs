//! Lectern CLI entry point.

use anyhow::Result;
use clap::Parser;
use lectern::cli::{commands, Cli, Commands};
use lectern::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lectern={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match cli.command {
        Commands::Ingest {
            file,
            class_name,
            professor,
            semester,
            url,
            lecture_number,
            title,
            show,
        } => {
            commands::run_ingest(
                &file,
                &class_name,
                &professor,
                &semester,
                &url,
                lecture_number,
                title,
                show,
                settings,
            )
            .await?;
        }

        Commands::Process {
            class_name,
            professor,
            semester,
            url,
        } => {
            commands::run_process(&class_name, &professor, &semester, &url, settings).await?;
        }

        Commands::Worker { events } => {
            commands::run_worker(events, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }
    }

    Ok(())
}
