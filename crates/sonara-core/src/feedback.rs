//! # Feedback Module
//!
//! Motivational messages and display tones derived from session progress.

use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Display tone of an overlay element. Renderers map tones to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Green.
    Success,
    /// Yellow.
    Caution,
    /// Cyan.
    Info,
    /// White.
    Neutral,
    /// Red.
    Alert,
}

impl Tone {
    /// RGB color conventionally used for the tone.
    #[must_use]
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Tone::Success => [0, 255, 0],
            Tone::Caution => [255, 255, 0],
            Tone::Info => [0, 255, 255],
            Tone::Neutral => [255, 255, 255],
            Tone::Alert => [255, 0, 0],
        }
    }
}

/// A feedback line and its tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    pub tone: Tone,
}

/// Feedback for the current progress of `session`.
///
/// `streak` is the stored daily streak; it is mentioned once it exceeds one day.
#[must_use]
pub fn feedback(session: &Session, streak: u32) -> Feedback {
    if session.is_complete() {
        return Feedback {
            message: "Today's Exercise Completed!".to_string(),
            tone: Tone::Success,
        };
    }

    let percent = session.count().saturating_mul(100) / session.target();
    let (message, tone) = match percent {
        p if p >= 75 => ("Great Progress! Almost There!", Tone::Success),
        p if p >= 50 => ("Halfway There! Keep It Up!", Tone::Caution),
        p if p >= 25 => ("Good Start! You're Doing Great!", Tone::Info),
        _ => ("Let's Begin Your Therapy!", Tone::Neutral),
    };

    let mut message = message.to_string();
    if streak > 1 {
        message.push_str(&format!(" {} Day Streak!", streak));
    }
    Feedback { message, tone }
}

/// Tone of the progress bar for a completion percentage.
#[must_use]
pub fn progress_tone(percent: u32) -> Tone {
    match percent {
        p if p >= 100 => Tone::Success,
        p if p >= 50 => Tone::Caution,
        _ => Tone::Alert,
    }
}
