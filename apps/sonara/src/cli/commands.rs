//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, StatsResponse};
use crate::config::TrackerConfig;
use crate::render::TerminalRenderer;
use crate::source::{DetectorProcess, JsonLinesSource, LandmarkSource, WithKeyboard};
use crate::store::RecordStore;
use crate::tracker::{RunEnd, Tracker};
use sonara_core::{PatientRecord, SonaraError, StatsReport, primitives::RECENT_SESSIONS};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it is a
/// regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SonaraError> {
    let canonical = path.canonicalize().map_err(|e| {
        SonaraError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SonaraError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// TRACK COMMAND
// =============================================================================

/// Where frames come from.
fn open_source(
    config: &TrackerConfig,
    input: Option<&Path>,
    detector: bool,
) -> Result<Box<dyn LandmarkSource>, SonaraError> {
    match input {
        Some(path) if path != Path::new("-") => {
            let path = validate_file_path(path)?;
            let file = File::open(&path).map_err(|e| {
                SonaraError::Io(format!("Cannot open '{}': {}", path.display(), e))
            })?;
            tracing::info!(path = %path.display(), "Replaying recorded frames");
            Ok(Box::new(JsonLinesSource::new(BufReader::new(file))))
        }
        Some(_) => Ok(stdin_source()),
        None if detector || config.has_detector() => {
            let process = DetectorProcess::spawn(&config.detector)?;
            Ok(Box::new(WithKeyboard::stdin(process)))
        }
        None => Ok(stdin_source()),
    }
}

fn stdin_source() -> Box<dyn LandmarkSource> {
    tracing::info!("Reading frames and controls from stdin");
    Box::new(JsonLinesSource::new(std::io::stdin().lock()))
}

/// Run one exercise session and save it on exit.
pub fn cmd_track(
    data_path: &Path,
    config: TrackerConfig,
    input: Option<&Path>,
    detector: bool,
    json_mode: bool,
) -> Result<(), SonaraError> {
    let mut source = open_source(&config, input, detector)?;
    let mut tracker = Tracker::new(config, RecordStore::new(data_path))?;
    let mut renderer = TerminalRenderer::stdout(json_mode);

    let result = tracker.run(source.as_mut(), &mut renderer);
    // Save even when the loop failed.
    let saved = tracker.finish();
    let end = result?;
    saved?;

    let session = tracker.session();
    let record = tracker.record();
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "ended_by": match end {
                    RunEnd::Quit => "quit",
                    RunEnd::EndOfInput => "end_of_input",
                },
                "count": session.count(),
                "target": session.target(),
                "completed": session.is_complete(),
                "daily_streak": record.daily_streak,
                "total_sessions": record.total_sessions,
            }))
            .map_err(|e| SonaraError::Serialization(e.to_string()))?
        );
        return Ok(());
    }

    println!();
    println!("Exercises: {}/{}", session.count(), session.target());
    if session.is_complete() {
        println!("Today's exercise completed!");
    }
    println!("Daily streak: {} days", record.daily_streak);
    println!("Progress file: {:?}", tracker.store().path());
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    data_path: &Path,
    config: TrackerConfig,
    host: &str,
    port: u16,
) -> Result<(), SonaraError> {
    let target = config.target;
    let tracker = Tracker::new(config, RecordStore::new(data_path))?;

    println!("Sonara HTTP Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:    {}", host);
    println!("  Port:    {}", port);
    println!("  Target:  {}", target);
    println!("  Record:  {:?}", data_path);
    println!();
    println!("Endpoints:");
    println!("  POST /frame   - Feed a detector frame");
    println!("  POST /control - pause, reset, stats or quit");
    println!("  GET  /status  - Current overlay");
    println!("  GET  /stats   - Patient statistics");
    println!("  GET  /health  - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, tracker).await
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show patient statistics.
pub fn cmd_stats(data_path: &Path, json_mode: bool) -> Result<(), SonaraError> {
    let record = RecordStore::new(data_path).load()?;

    if json_mode {
        let response = StatsResponse::new(&record, None);
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .map_err(|e| SonaraError::Serialization(e.to_string()))?
        );
        return Ok(());
    }

    print!("{}", StatsReport::new(&record, None, RECENT_SESSIONS));
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty patient record.
pub fn cmd_init(data_path: &Path, force: bool) -> Result<(), SonaraError> {
    let store = RecordStore::new(data_path);
    if store.exists() && !force {
        return Err(SonaraError::Io(
            "Patient record already exists. Use --force to overwrite.".to_string(),
        ));
    }

    store.save(&PatientRecord::new())?;
    println!("Initialized new patient record at {:?}", data_path);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
