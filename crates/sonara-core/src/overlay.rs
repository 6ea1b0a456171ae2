//! # Overlay Model
//!
//! Everything the status overlay shows, computed from a session and the
//! stored streak. Renderers (terminal, HTTP clients) only lay it out.

use crate::exercise::Exercise;
use crate::feedback::{Feedback, Tone, feedback, progress_tone};
use crate::session::{Rate, Session, SessionState};
use crate::types::Observation;
use serde::{Deserialize, Serialize};

/// Key bindings shown at the bottom of the overlay.
pub const HELP_LINE: &str = "Q = Quit | P = Pause | R = Reset | S = Stats";

/// One snapshot of the status overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayView {
    pub state: SessionState,
    pub fingers: Observation,
    pub count: u32,
    pub target: u32,
    /// `"{name} ({difficulty})"` while a hand is shown.
    pub exercise: Option<String>,
    pub feedback: Feedback,
    pub progress_percent: u32,
    pub progress_tone: Tone,
    /// Active time; `None` once the session is complete.
    pub elapsed_secs: Option<u64>,
    /// Exercises per minute; only while running and non-zero.
    pub rate: Option<Rate>,
    /// Stored daily streak, when there is one.
    pub streak: Option<u32>,
}

impl OverlayView {
    #[must_use]
    pub fn build(session: &Session, streak: u32, now_ms: u64) -> Self {
        let complete = session.is_complete();
        let progress_percent = session.progress_percent();
        let rate = session.rate(now_ms);

        Self {
            state: session.state(),
            fingers: session.displayed(),
            count: session.count(),
            target: session.target(),
            exercise: Exercise::for_observation(session.displayed()).map(|e| e.label()),
            feedback: feedback(session, streak),
            progress_percent,
            progress_tone: progress_tone(progress_percent),
            elapsed_secs: (!complete).then(|| session.elapsed_ms(now_ms) / 1000),
            rate: (!complete && !rate.is_zero()).then_some(rate),
            streak: (streak > 0).then_some(streak),
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        if self.state == SessionState::Paused {
            "THERAPY MODE - PAUSED".to_string()
        } else {
            "THERAPY MODE".to_string()
        }
    }

    /// The overlay's text lines, top to bottom, with their tones.
    ///
    /// The progress bar is not included; renderers draw it from
    /// `progress_percent` and `progress_tone`.
    #[must_use]
    pub fn lines(&self) -> Vec<(String, Tone)> {
        let mut lines = vec![
            (self.title(), Tone::Neutral),
            (format!("Fingers Detected: {}", self.fingers), Tone::Neutral),
            (format!("Exercises: {}/{}", self.count, self.target), Tone::Info),
        ];
        if let Some(exercise) = &self.exercise {
            lines.push((exercise.clone(), Tone::Success));
        }
        lines.push((self.feedback.message.clone(), self.feedback.tone));
        if let Some(secs) = self.elapsed_secs {
            lines.push((
                format!("Session Time: {}m {}s", secs / 60, secs % 60),
                Tone::Neutral,
            ));
        }
        if let Some(rate) = self.rate {
            lines.push((format!("Speed: {} exercises/min", rate), Tone::Neutral));
        }
        if let Some(streak) = self.streak {
            lines.push((format!("{} Day Streak!", streak), Tone::Caution));
        }
        lines
    }
}
