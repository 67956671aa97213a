//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Camera log merger.
///
/// Merges the timestamped text logs of a camera capture, written by many
/// threads and sessions, into one chronologically ordered log.
#[derive(Debug, Parser)]
#[command(name = "camlog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress messages.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge every log in a capture directory into one file.
    Merge {
        /// Directory holding the captured log files.
        input: PathBuf,

        /// Output file (defaults to the configured output name inside INPUT).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the sessions, threads and other logs found in a capture directory.
    Scan {
        /// Directory holding the captured log files.
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
