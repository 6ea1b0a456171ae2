//! # Core Type Definitions
//!
//! This module contains the data model shared by every part of Sonara:
//! - Detector output (`Landmark`, `Handedness`, `Hand`, `Frame`)
//! - The per-frame gesture reading (`Observation`)
//! - Error types (`SonaraError`)
//!
//! Landmark coordinates are normalized image coordinates as produced by the
//! external hand-landmark model: `x` grows to the right, `y` grows downwards.

use crate::primitives::{LANDMARK_COUNT, MAX_HANDS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// LANDMARK
// =============================================================================

/// A single hand landmark reported by the external detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position (0.0 = left edge, 1.0 = right edge).
    pub x: f32,
    /// Vertical position (0.0 = top edge, 1.0 = bottom edge).
    pub y: f32,
    /// Depth relative to the wrist. Not used by the finger rule.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// =============================================================================
// HANDEDNESS
// =============================================================================

/// Which hand the detector believes it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Handedness {
    type Err = SonaraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("left") {
            Ok(Handedness::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(Handedness::Right)
        } else {
            Err(SonaraError::InvalidHand(format!("unknown handedness '{}'", s)))
        }
    }
}

// =============================================================================
// HAND
// =============================================================================

/// One detected hand: its handedness label, detection score and all 21 landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub handedness: Handedness,
    /// Detection confidence in `0.0..=1.0`.
    pub score: f32,
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl Hand {
    /// Create a hand from exactly [`LANDMARK_COUNT`] landmarks.
    pub fn from_landmarks(
        handedness: Handedness,
        score: f32,
        landmarks: &[Landmark],
    ) -> Result<Self, SonaraError> {
        let landmarks: [Landmark; LANDMARK_COUNT] = landmarks.try_into().map_err(|_| {
            SonaraError::InvalidHand(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                landmarks.len()
            ))
        })?;
        Ok(Self {
            handedness,
            score,
            landmarks,
        })
    }

    /// Landmark at `index` (0 = wrist, 4 = thumb tip, ... 20 = pinky tip).
    #[must_use]
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

// =============================================================================
// FRAME
// =============================================================================

/// One result of the external detector: every hand found in a camera frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Capture time in milliseconds on the detector's monotonic clock, if known.
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub hands: Vec<Hand>,
}

impl Frame {
    #[must_use]
    pub fn new(hands: Vec<Hand>) -> Self {
        Self {
            timestamp_ms: None,
            hands,
        }
    }

    #[must_use]
    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// An empty frame (no hand in view).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Hands that take part in finger counting.
    ///
    /// Hands scoring below `min_score` are dropped; of the rest at most
    /// [`MAX_HANDS`] are kept, highest score first.
    #[must_use]
    pub fn considered_hands(&self, min_score: f32) -> Vec<&Hand> {
        let mut hands: Vec<&Hand> = self
            .hands
            .iter()
            .filter(|hand| hand.score >= min_score)
            .collect();
        hands.sort_by(|a, b| b.score.total_cmp(&a.score));
        hands.truncate(MAX_HANDS);
        hands
    }
}

// =============================================================================
// OBSERVATION
// =============================================================================

/// The gesture read from one frame: either no hand, or an aggregate finger count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Observation {
    #[default]
    NoHand,
    Fingers(u8),
}

impl Observation {
    /// Finger count, or `None` when no hand was detected.
    #[must_use]
    pub fn fingers(self) -> Option<u8> {
        match self {
            Observation::NoHand => None,
            Observation::Fingers(n) => Some(n),
        }
    }

    #[must_use]
    pub fn has_hand(self) -> bool {
        matches!(self, Observation::Fingers(_))
    }

    /// Value written to exercise logs: the finger count, or `-1` for no hand.
    #[must_use]
    pub fn log_value(self) -> i32 {
        self.fingers().map_or(-1, i32::from)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::NoHand => f.write_str("-"),
            Observation::Fingers(n) => write!(f, "{}", n),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in Sonara.
///
/// The CORE never panics; every failure surfaces as a `SonaraError`.
#[derive(Debug, Error)]
pub enum SonaraError {
    /// A hand from the detector is malformed (wrong landmark count, bad label).
    #[error("Invalid hand: {0}")]
    InvalidHand(String),

    /// A detector frame could not be parsed.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// A control action (pause, reset, stats, quit) was not recognized.
    #[error("Invalid control: {0}")]
    InvalidControl(String),

    /// The operation is not allowed once the target has been reached.
    #[error("Session already completed")]
    SessionComplete,

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external detector failed or misbehaved.
    #[error("Detector error: {0}")]
    Detector(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_with_score(score: f32) -> Hand {
        Hand {
            handedness: Handedness::Right,
            score,
            landmarks: [Landmark::default(); LANDMARK_COUNT],
        }
    }

    #[test]
    fn from_landmarks_rejects_wrong_count() {
        let points = vec![Landmark::default(); 20];
        let err = Hand::from_landmarks(Handedness::Left, 0.9, &points).expect_err("short hand");
        assert!(matches!(err, SonaraError::InvalidHand(_)));
    }

    #[test]
    fn from_landmarks_accepts_full_hand() {
        let points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        let hand = Hand::from_landmarks(Handedness::Left, 0.9, &points).expect("hand");
        assert_eq!(hand.landmark(20), Some(&Landmark::new(0.5, 0.5, 0.0)));
        assert!(hand.landmark(21).is_none());
    }

    #[test]
    fn handedness_parses_case_insensitively() {
        assert_eq!("Right".parse::<Handedness>().expect("right"), Handedness::Right);
        assert_eq!("left".parse::<Handedness>().expect("left"), Handedness::Left);
        assert!("both".parse::<Handedness>().is_err());
    }

    #[test]
    fn considered_hands_filters_and_caps() {
        let frame = Frame::new(vec![
            hand_with_score(0.6),
            hand_with_score(0.2),
            hand_with_score(0.95),
            hand_with_score(0.7),
        ]);

        let hands = frame.considered_hands(0.5);
        let scores: Vec<f32> = hands.iter().map(|h| h.score).collect();
        assert_eq!(scores, vec![0.95, 0.7]);
    }

    #[test]
    fn observation_log_value() {
        assert_eq!(Observation::NoHand.log_value(), -1);
        assert_eq!(Observation::Fingers(3).log_value(), 3);
        assert_eq!(Observation::NoHand.to_string(), "-");
    }
}
