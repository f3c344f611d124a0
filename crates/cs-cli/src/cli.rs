//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gapless call sheet scheduler.
///
/// Keeps every lane of a shoot day packed back to back and cascades
/// start times whenever entries are reordered, moved, or the day start
/// changes.
#[derive(Debug, Parser)]
#[command(name = "callsheet", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the computed batch instead of writing it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store a day schedule document and normalize it.
    Import {
        /// JSON file to read, or `-` for stdin.
        file: PathBuf,
    },

    /// List stored days.
    Days,

    /// Show the per-track timeline of a day.
    Show {
        /// Day ID.
        day: String,

        /// Output the stored day as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Repack every lane of a day.
    Normalize {
        /// Day ID.
        day: String,
    },

    /// Drag an entry to another position of the time-sorted day view.
    Reorder {
        /// Day ID.
        day: String,

        /// Entry ID.
        entry: String,

        /// Current position in the time-sorted view (0-based).
        from: usize,

        /// Target position in the time-sorted view (0-based).
        to: usize,
    },

    /// Move an entry onto another lane.
    Move {
        /// Day ID.
        day: String,

        /// Entry ID.
        entry: String,

        /// Destination lane ID.
        track: String,
    },

    /// Change the day start, shifting every entry.
    SetStart {
        /// Day ID.
        day: String,

        /// New start time (e.g., 08:30, 8:30am, 8:30 PM).
        time: String,
    },

    /// Print the canonical form of a typed time.
    ParseTime {
        /// Time as typed (e.g., 9:05, 9:05 pm).
        text: String,
    },

    /// List the batches applied to a day.
    History {
        /// Day ID.
        day: String,
    },
}
