//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Schedule snapshot diff tool.
///
/// Compares two exports of the same schedule and reports which events were
/// added, removed, or modified, re-aligning events whose identifiers were
/// regenerated between exports.
#[derive(Debug, Parser)]
#[command(name = "hd", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two snapshot files and report the changes.
    Diff {
        /// The earlier snapshot (JSON event array).
        before: PathBuf,

        /// The later snapshot (JSON event array).
        after: PathBuf,
    },

    /// Parse a directory of .ics exports into a snapshot on stdout.
    Extract {
        /// Directory containing the .ics files, one per course.
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Map each group to the instructor teaching it.
    GroupeProfs {
        /// Snapshot file (JSON event array).
        events: PathBuf,

        /// Case-insensitive regex filter on the course code.
        #[arg(short, long)]
        ue: Option<String>,
    },
}
