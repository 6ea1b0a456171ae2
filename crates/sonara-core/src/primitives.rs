//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Sonara CORE.
//!
//! Tunable values (target, debounce, detection score) have configuration
//! overrides in the app layer; these are the defaults and the hard limits.

/// Number of landmarks the external detector reports per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Maximum number of hands considered in a single frame.
///
/// Additional hands are dropped, lowest detection score first.
pub const MAX_HANDS: usize = 2;

/// Landmark indices of the five fingertips (thumb, index, middle, ring, pinky).
pub const TIP_IDS: [usize; 5] = [4, 8, 12, 16, 20];

/// Default number of repetitions that completes a session.
pub const DEFAULT_TARGET: u32 = 20;

/// Default debounce window between two counted repetitions, in milliseconds.
///
/// A gesture change is only counted when strictly more than this many
/// milliseconds have passed since the previously counted repetition.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Default minimum detection score for a hand to be considered.
pub const DEFAULT_MIN_HAND_SCORE: f32 = 0.5;

/// Number of session summaries kept in the persisted history.
pub const HISTORY_LIMIT: usize = 30;

/// Number of recent sessions shown in the statistics view.
pub const RECENT_SESSIONS: usize = 5;

/// Maximum accepted size of a serialized patient record (8 MiB).
///
/// Validated before parsing so a corrupted or hostile file cannot
/// exhaust memory.
pub const MAX_RECORD_SIZE: usize = 8 * 1024 * 1024;

/// Milliseconds per minute, used for rate computations.
pub const MS_PER_MINUTE: u64 = 60_000;
