//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Device log correlator.
///
/// Merges kernel, main, sys, radio and events logs into one chronological
/// log, annotates recognized lines, and extracts metric series.
#[derive(Debug, Parser)]
#[command(name = "lw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Anchor year for timestamps that omit it (default: current year).
    #[arg(long, global = true)]
    pub year: Option<i32>,

    /// External kernel log converter.
    #[arg(long, global = true)]
    pub normalizer: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the log files that would be processed under a root.
    Discover {
        /// Log root directory.
        root: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Merge all logs chronologically and write the annotated summary.
    Merge {
        /// Log root directory. Outputs are written here.
        root: PathBuf,

        /// Annotation rule file.
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Extract metric series as JSON.
    Metrics {
        /// Log root directory.
        root: PathBuf,

        /// Emit one row per timestamp instead of one list per metric.
        #[arg(long)]
        aligned: bool,
    },

    /// Extract values from a single file using ad-hoc templates.
    Extract {
        /// Log file to read.
        file: PathBuf,

        /// Line fragment with `XXX` where the number appears. Repeatable;
        /// each series is named after the word just before `XXX`.
        #[arg(short, long = "pattern", required = true)]
        patterns: Vec<String>,
    },
}
