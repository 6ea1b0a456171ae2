//! # Sonara - Finger-Exercise Tracker
//!
//! The main binary for Sonara.
//!
//! This application provides:
//! - Exercise sessions driven by an external hand-landmark detector
//! - A terminal status overlay and persistent statistics
//! - HTTP REST API server (axum-based)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/sonara (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │ Detector bridge  │   │
//! │  │  (clap)     │    │   (axum)    │    │ (JSON lines)     │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                    ┌───────────────┐                           │
//! │                    │  sonara-core  │                           │
//! │                    │ (THE LOGIC)   │                           │
//! │                    └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run a session with the configured detector
//! sonara -c sonara.toml track
//!
//! # Replay a recorded detector stream
//! sonara track --input session.jsonl
//!
//! # Start the HTTP server
//! sonara serve --host 127.0.0.1 --port 8080
//!
//! # Show statistics
//! sonara stats
//! ```

use clap::Parser;
use sonara::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — SONARA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SONARA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "sonara=debug,tower_http=debug"
    } else {
        "sonara=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr; stdout belongs to the overlay and command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Sonara startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗ ██████╗ ███╗   ██╗ █████╗ ██████╗  █████╗
  ██╔════╝██╔═══██╗████╗  ██║██╔══██╗██╔══██╗██╔══██╗
  ███████╗██║   ██║██╔██╗ ██║███████║██████╔╝███████║
  ╚════██║██║   ██║██║╚██╗██║██╔══██║██╔══██╗██╔══██║
  ███████║╚██████╔╝██║ ╚████║██║  ██║██║  ██║██║  ██║
  ╚══════╝ ╚═════╝ ╚═╝  ╚═══╝╚═╝  ╚═╝╚═╝  ╚═╝╚═╝  ╚═╝

  Finger-Exercise Tracker v{}

  Open • Close • Repeat
"#,
        env!("CARGO_PKG_VERSION")
    );
}
