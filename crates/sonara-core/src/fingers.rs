//! # Finger Counting
//!
//! Converts the 21 landmarks of a hand into a number of extended fingers.
//!
//! The rule is purely geometric and assumes an upright hand facing the camera:
//! - Thumb: the tip lies outside the IP joint horizontally. For a right hand
//!   that means `tip.x < ip.x`, for a left hand `tip.x > ip.x`.
//! - Other fingers: the tip lies above the PIP joint (`tip.y < pip.y`), the
//!   PIP joint being two landmarks below the tip.
//!
//! A frame's observation is the sum over all considered hands, so two hands
//! can show up to ten fingers.

use crate::primitives::TIP_IDS;
use crate::types::{Frame, Hand, Handedness, Observation};
use serde::{Deserialize, Serialize};

/// The five fingers of a hand, in landmark order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Landmark index of the fingertip.
    #[must_use]
    pub fn tip(self) -> usize {
        TIP_IDS[self as usize]
    }

    /// Landmark index of the joint the tip is compared against.
    ///
    /// The IP joint for the thumb, the PIP joint for the other fingers.
    #[must_use]
    pub fn reference_joint(self) -> usize {
        match self {
            Finger::Thumb => self.tip() - 1,
            _ => self.tip() - 2,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

/// Whether `finger` is extended on `hand`.
#[must_use]
pub fn is_extended(hand: &Hand, finger: Finger) -> bool {
    let (Some(tip), Some(joint)) = (
        hand.landmark(finger.tip()),
        hand.landmark(finger.reference_joint()),
    ) else {
        return false;
    };

    match finger {
        Finger::Thumb => match hand.handedness {
            Handedness::Right => tip.x < joint.x,
            Handedness::Left => tip.x > joint.x,
        },
        _ => tip.y < joint.y,
    }
}

/// The fingers currently extended on `hand`, in landmark order.
#[must_use]
pub fn extended_fingers(hand: &Hand) -> Vec<Finger> {
    Finger::ALL
        .into_iter()
        .filter(|&finger| is_extended(hand, finger))
        .collect()
}

/// Number of extended fingers on one hand (0..=5).
#[must_use]
pub fn count_fingers(hand: &Hand) -> u8 {
    Finger::ALL
        .into_iter()
        .filter(|&finger| is_extended(hand, finger))
        .count() as u8
}

/// Aggregate observation over every hand considered in `frame`.
#[must_use]
pub fn count_frame(frame: &Frame, min_score: f32) -> Observation {
    let hands = frame.considered_hands(min_score);
    if hands.is_empty() {
        return Observation::NoHand;
    }
    let total = hands
        .iter()
        .map(|hand| count_fingers(hand))
        .fold(0u8, u8::saturating_add);
    Observation::Fingers(total)
}

// =============================================================================
// TESTS
// =============================================================================
