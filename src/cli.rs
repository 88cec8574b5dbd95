//! Command-line interface for polydub
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Multi-language video dubbing pipeline
#[derive(Parser, Debug)]
#[command(name = "polydub", version, about = "Multi-language video dubbing pipeline")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stage details, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Daemon socket path override
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
pub fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dubbing daemon
    Daemon,

    /// Dub a video locally, start to finish
    Dub {
        /// Source URL or local video file
        source: String,

        /// Target language (see `polydub languages`)
        #[arg(short, long, default_value = "spanish")]
        language: String,

        /// Copy the finished video to this path
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Keep the job's working directory after completion
        #[arg(long)]
        keep_workdir: bool,

        /// Acquisition timeout (e.g. 90s, 3m). Default: 3m
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
        timeout: Option<u64>,
    },

    /// Submit a job to a running daemon
    Submit {
        /// Source URL or local video file
        source: String,

        /// Target language (see `polydub languages`)
        #[arg(short, long, default_value = "spanish")]
        language: String,
    },

    /// Show a job's current status
    Status {
        /// Job id returned by submit
        job_id: String,
    },

    /// Follow a job's progress until it finishes
    Watch {
        /// Job id returned by submit
        job_id: String,
    },

    /// Print the finished output file path
    Output {
        /// Job id returned by submit
        job_id: String,
    },

    /// Remove a job's record and working storage
    Cleanup {
        /// Job id returned by submit
        job_id: String,
    },

    /// List supported target languages
    Languages,

    /// Check daemon health
    Health,

    /// Stop a running daemon
    Shutdown,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
