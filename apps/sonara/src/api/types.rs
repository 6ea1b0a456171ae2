//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::source::{Control, HandMessage, to_frame};
use serde::{Deserialize, Serialize};
use sonara_core::{
    Frame, Hand, OverlayView, PatientRecord, Session, SessionState, SessionSummary, SonaraError,
    Tone, count_fingers, extended_fingers, primitives::RECENT_SESSIONS,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// The overlay, flattened for HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub title: String,
    pub state: SessionState,
    /// Displayed finger count; `None` when no hand is shown.
    pub fingers: Option<u8>,
    pub count: u32,
    pub target: u32,
    pub exercise: Option<String>,
    pub feedback: String,
    pub feedback_tone: Tone,
    pub progress_percent: u32,
    pub elapsed_secs: Option<u64>,
    /// Exercises per minute with one decimal, e.g. `"12.5"`.
    pub exercises_per_minute: Option<String>,
    pub streak: Option<u32>,
}

impl From<&OverlayView> for StatusResponse {
    fn from(view: &OverlayView) -> Self {
        Self {
            title: view.title(),
            state: view.state,
            fingers: view.fingers.fingers(),
            count: view.count,
            target: view.target,
            exercise: view.exercise.clone(),
            feedback: view.feedback.message.clone(),
            feedback_tone: view.feedback.tone,
            progress_percent: view.progress_percent,
            elapsed_secs: view.elapsed_secs,
            exercises_per_minute: view.rate.map(|r| r.to_string()),
            streak: view.streak,
        }
    }
}

// =============================================================================
// STATS RESPONSE
// =============================================================================

/// Count and target of the session in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub count: u32,
    pub target: u32,
}

/// Lifetime statistics plus the most recent sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_sessions: u64,
    pub total_exercises: u64,
    pub daily_streak: u32,
    /// `YYYY-MM-DD`.
    pub last_session_date: Option<String>,
    pub current_session: Option<CurrentSession>,
    pub recent_sessions: Vec<SessionSummary>,
}

impl StatsResponse {
    #[must_use]
    pub fn new(record: &PatientRecord, session: Option<&Session>) -> Self {
        Self {
            total_sessions: record.total_sessions,
            total_exercises: record.total_exercises,
            daily_streak: record.daily_streak,
            last_session_date: record
                .last_session_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            current_session: session.map(|s| CurrentSession {
                count: s.count(),
                target: s.target(),
            }),
            recent_sessions: record.recent(RECENT_SESSIONS).to_vec(),
        }
    }
}

// =============================================================================
// FRAME REQUEST/RESPONSE
// =============================================================================

/// One detector frame posted by an external detector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub hands: Vec<HandMessage>,
}

impl FrameRequest {
    /// Validate hands and landmarks, and build the frame.
    pub fn to_frame(&self) -> Result<Frame, SonaraError> {
        to_frame(self.timestamp_ms, &self.hands)
    }
}

/// Per-hand finger reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandFingers {
    pub handedness: String,
    pub score: f32,
    pub count: u8,
    /// Extended finger names, thumb first.
    pub extended: Vec<String>,
}

impl From<&Hand> for HandFingers {
    fn from(hand: &Hand) -> Self {
        Self {
            handedness: hand.handedness.label().to_string(),
            score: hand.score,
            count: count_fingers(hand),
            extended: extended_fingers(hand)
                .into_iter()
                .map(|f| f.name().to_string())
                .collect(),
        }
    }
}

/// Result of feeding one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResponse {
    pub success: bool,
    /// A repetition was counted on this frame.
    pub counted: bool,
    /// Aggregate finger count; `None` when no hand was considered.
    pub fingers: Option<u8>,
    /// Hands that passed the confidence threshold.
    pub hands: Vec<HandFingers>,
    pub state: Option<SessionState>,
    pub count: u32,
    pub target: u32,
    pub completed: bool,
    pub error: Option<String>,
}

impl FrameResponse {
    #[must_use]
    pub fn success(
        counted: bool,
        fingers: Option<u8>,
        hands: Vec<HandFingers>,
        session: &Session,
    ) -> Self {
        Self {
            success: true,
            counted,
            fingers,
            hands,
            state: Some(session.state()),
            count: session.count(),
            target: session.target(),
            completed: session.is_complete(),
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            counted: false,
            fingers: None,
            hands: Vec::new(),
            state: None,
            count: 0,
            target: 0,
            completed: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CONTROL REQUEST/RESPONSE
// =============================================================================

/// A user control: `pause`, `reset`, `stats` or `quit` (key letters work too).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRequest {
    pub action: String,
}

impl ControlRequest {
    pub fn to_control(&self) -> Result<Control, SonaraError> {
        self.action.parse()
    }
}

/// Result of a control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub action: Option<Control>,
    pub state: Option<SessionState>,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsResponse>,
    pub error: Option<String>,
}

impl ControlResponse {
    #[must_use]
    pub fn success(action: Control, state: SessionState, message: impl Into<String>) -> Self {
        Self {
            success: true,
            action: Some(action),
            state: Some(state),
            message: Some(message.into()),
            stats: None,
            error: None,
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: StatsResponse) -> Self {
        self.stats = Some(stats);
        self
    }

    #[must_use]
    pub fn error(action: Option<Control>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            action,
            state: None,
            message: None,
            stats: None,
            error: Some(msg.into()),
        }
    }
}
