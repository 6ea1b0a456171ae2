//! # Terminal Overlay
//!
//! Draws the status overlay on a terminal.
//!
//! The overlay is redrawn only when its text changes; with frames arriving
//! at camera rate that is roughly once per second (the session clock) plus
//! once per gesture change.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use sonara_core::{OverlayView, SonaraError, StatsReport, Tone, overlay::HELP_LINE};
use std::io::{IsTerminal, Stdout, Write};

/// Width of the progress bar in cells.
pub const BAR_WIDTH: u32 = 40;

/// How the overlay is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Full-screen redraw with colors.
    Styled,
    /// Plain text blocks, one after the other (pipes, logs).
    Plain,
    /// One JSON object per line.
    Json,
}

/// Writes overlay snapshots to `W`.
pub struct TerminalRenderer<W> {
    out: W,
    mode: RenderMode,
    last: Option<String>,
    /// Statistics kept below the styled overlay once requested.
    pinned: Option<String>,
}

impl TerminalRenderer<Stdout> {
    /// Render to stdout: JSON when requested, colors when stdout is a terminal.
    #[must_use]
    pub fn stdout(json_mode: bool) -> Self {
        let out = std::io::stdout();
        let mode = if json_mode {
            RenderMode::Json
        } else if out.is_terminal() {
            RenderMode::Styled
        } else {
            RenderMode::Plain
        };
        Self::new(out, mode)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, mode: RenderMode) -> Self {
        Self {
            out,
            mode,
            last: None,
            pinned: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Draw `view` unless it looks exactly like the last one drawn.
    ///
    /// Returns whether anything was written.
    pub fn render(&mut self, view: &OverlayView) -> Result<bool, SonaraError> {
        let text = match self.mode {
            RenderMode::Json => serde_json::to_string(view)
                .map_err(|e| SonaraError::Serialization(e.to_string()))?,
            RenderMode::Styled | RenderMode::Plain => overlay_text(view),
        };
        if self.last.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }

        match self.mode {
            RenderMode::Json => writeln!(self.out, "{}", text).map_err(io_error)?,
            RenderMode::Plain => writeln!(self.out, "{}", text).map_err(io_error)?,
            RenderMode::Styled => self.draw_styled(view).map_err(io_error)?,
        }
        self.out.flush().map_err(io_error)?;
        self.last = Some(text);
        Ok(true)
    }

    /// Show the statistics view. The overlay is drawn again afterwards.
    ///
    /// In styled mode the report stays below the overlay, since every
    /// redraw clears the screen, until the next stats request or [`unpin`].
    ///
    /// [`unpin`]: TerminalRenderer::unpin
    pub fn stats(&mut self, report: &StatsReport) -> Result<(), SonaraError> {
        match self.mode {
            RenderMode::Json => {
                let json = serde_json::to_string(report)
                    .map_err(|e| SonaraError::Serialization(e.to_string()))?;
                writeln!(self.out, "{}", json).map_err(io_error)?;
            }
            RenderMode::Plain => {
                writeln!(self.out).map_err(io_error)?;
                write!(self.out, "{}", report).map_err(io_error)?;
                writeln!(self.out).map_err(io_error)?;
            }
            RenderMode::Styled => {
                self.pinned = match self.pinned {
                    Some(_) => None,
                    None => Some(report.to_string()),
                };
            }
        }
        self.out.flush().map_err(io_error)?;
        self.last = None;
        Ok(())
    }

    /// Drop the statistics view pinned below the overlay.
    pub fn unpin(&mut self) {
        if self.pinned.take().is_some() {
            self.last = None;
        }
    }

    fn draw_styled(&mut self, view: &OverlayView) -> std::io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        for (line, tone) in view.lines() {
            queue!(
                self.out,
                SetForegroundColor(color(tone)),
                Print(line),
                ResetColor,
                Print("\n")
            )?;
        }
        queue!(
            self.out,
            SetForegroundColor(color(view.progress_tone)),
            Print(progress_bar(view.progress_percent)),
            ResetColor,
            Print("\n\n"),
            Print(HELP_LINE),
            Print("\n")
        )?;
        if let Some(stats) = &self.pinned {
            queue!(self.out, Print("\n"), Print(stats))?;
        }
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> SonaraError {
    SonaraError::Io(format!("Write overlay: {}", e))
}

fn color(tone: Tone) -> Color {
    let [r, g, b] = tone.rgb();
    Color::Rgb { r, g, b }
}

/// `[#####-----] 50%`, [`BAR_WIDTH`] cells wide.
#[must_use]
pub fn progress_bar(percent: u32) -> String {
    let percent = percent.min(100);
    let filled = (percent * BAR_WIDTH / 100) as usize;
    let empty = BAR_WIDTH as usize - filled;
    format!("[{}{}] {}%", "#".repeat(filled), "-".repeat(empty), percent)
}

/// The overlay as plain text, help line included.
#[must_use]
pub fn overlay_text(view: &OverlayView) -> String {
    let mut lines: Vec<String> = view.lines().into_iter().map(|(line, _)| line).collect();
    lines.push(progress_bar(view.progress_percent));
    lines.push(HELP_LINE.to_string());
    lines.join("\n")
}

// =============================================================================
// TESTS
// =============================================================================
