//! # Sonara CLI Module
//!
//! This module implements the CLI interface for Sonara.
//!
//! ## Available Commands
//!
//! - `track` - Run an exercise session from a detector, a file or stdin
//! - `serve` - Start the HTTP server
//! - `stats` - Show patient statistics
//! - `init` - Create an empty patient record

mod commands;

use crate::config::TrackerConfig;
use clap::{Parser, Subcommand};
use sonara_core::SonaraError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Sonara - Finger-Exercise Tracker
///
/// Counts finger-exercise repetitions from hand landmarks and keeps
/// daily progress and streaks.
#[derive(Parser, Debug)]
#[command(name = "sonara")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the patient record
    #[arg(short = 'D', long, global = true, default_value = crate::store::DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an exercise session
    Track {
        /// Recorded JSON-lines stream to replay ("-" for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Read frames from the configured detector command
        #[arg(short, long)]
        detector: bool,

        /// Exercise target for this session
        #[arg(short, long)]
        target: Option<u32>,
    },

    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Exercise target for each session
        #[arg(short, long)]
        target: Option<u32>,
    },

    /// Show patient statistics
    Stats,

    /// Create an empty patient record
    Init {
        /// Overwrite an existing record
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SonaraError> {
    let json_mode = cli.json_mode;
    let config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };

    match cli.command {
        Some(Commands::Track {
            input,
            detector,
            target,
        }) => cmd_track(
            &cli.data,
            config.with_target(target)?,
            input.as_deref(),
            detector,
            json_mode,
        ),
        Some(Commands::Serve { host, port, target }) => {
            cmd_serve(&cli.data, config.with_target(target)?, &host, port).await
        }
        Some(Commands::Stats) => cmd_stats(&cli.data, json_mode),
        Some(Commands::Init { force }) => cmd_init(&cli.data, force),
        None => {
            // No subcommand - show statistics by default
            cmd_stats(&cli.data, json_mode)
        }
    }
}
