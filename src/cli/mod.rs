//! CLI module for lectern.

pub mod commands;

use clap::{Parser, Subcommand};

/// Lectern - Lecture Transcript Processor
///
/// Converts SubRip lecture transcripts into timestamped, embedded text
/// chunks ready for semantic retrieval.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a local SRT transcript file for processing
    Ingest {
        /// Path to the .srt file
        file: String,

        /// Course identifier (e.g. CS544)
        #[arg(long)]
        class_name: String,

        /// Professor name
        #[arg(long)]
        professor: String,

        /// Semester identifier (e.g. fall2024)
        #[arg(long)]
        semester: String,

        /// Lecture video URL
        #[arg(long)]
        url: String,

        /// Lecture number within the course
        #[arg(long, default_value = "0")]
        lecture_number: i32,

        /// Lecture title (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        /// Print the cleaned transcript text after storing
        #[arg(long)]
        show: bool,
    },

    /// Process one stored transcript into embedded chunks
    Process {
        /// Course identifier
        #[arg(long)]
        class_name: String,

        /// Professor name
        #[arg(long)]
        professor: String,

        /// Semester identifier
        #[arg(long)]
        semester: String,

        /// Lecture video URL
        #[arg(long)]
        url: String,
    },

    /// Consume transcript events until terminated
    Worker {
        /// Events file to consume (overrides the configured path)
        #[arg(long)]
        events: Option<String>,
    },

    /// List stored lectures and their chunk counts
    List,
}
