//! # Exercise Catalog
//!
//! Names and difficulty levels for each finger-count gesture.

use crate::types::{Observation, SonaraError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty level of an exercise gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
    /// Gestures beyond one hand's five fingers.
    Custom,
}

impl Difficulty {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Basic => "Basic",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Custom => "Custom",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = SonaraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Difficulty::Basic,
            Difficulty::Intermediate,
            Difficulty::Advanced,
            Difficulty::Custom,
        ]
        .into_iter()
        .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| SonaraError::Serialization(format!("unknown difficulty '{}'", s)))
    }
}

/// A named exercise gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub finger_count: u8,
    pub name: String,
    pub difficulty: Difficulty,
}

impl Exercise {
    /// Look up the exercise for a finger count.
    #[must_use]
    pub fn from_count(finger_count: u8) -> Self {
        let (name, difficulty) = match finger_count {
            0 => ("Closed Fist Exercise", Difficulty::Basic),
            1 => ("Index Pointing Exercise", Difficulty::Basic),
            2 => ("Peace Sign Exercise", Difficulty::Intermediate),
            3 => ("Three-Finger Stretch", Difficulty::Intermediate),
            4 => ("Four-Finger Extension", Difficulty::Advanced),
            5 => ("Open Palm Exercise", Difficulty::Advanced),
            n => {
                return Self {
                    finger_count: n,
                    name: format!("Pattern-{} Exercise", n),
                    difficulty: Difficulty::Custom,
                };
            }
        };
        Self {
            finger_count,
            name: name.to_string(),
            difficulty,
        }
    }

    /// The exercise shown for an observation; `None` when no hand is visible.
    #[must_use]
    pub fn for_observation(observation: Observation) -> Option<Self> {
        observation.fingers().map(Self::from_count)
    }

    /// Overlay label: `"{name} ({difficulty})"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.difficulty)
    }
}
