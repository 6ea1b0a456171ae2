//! # sonara-core
//!
//! The exercise engine for Sonara - THE LOGIC.
//!
//! Sonara tracks finger-exercise sessions on top of an external hand-landmark
//! detector. This crate holds everything that does not touch a camera, a
//! file or a socket:
//!
//! - `fingers` turns 21 landmarks per hand into a finger count
//! - `counter` turns gesture changes into debounced repetitions
//! - `session` runs the waiting / running / paused / complete state machine
//!   and the pause-aware timer
//! - `stats` keeps lifetime totals, the daily streak and session history
//! - `feedback` and `overlay` describe what the status overlay shows
//! - `formats` converts the patient record to and from JSON bytes
//!
//! ## Architectural Constraints
//!
//! - No detection here: landmarks arrive from outside as [`Frame`]s
//! - No I/O: callers pass bytes in and write bytes out
//! - Time is explicit: every time-dependent call receives a [`Moment`]

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod counter;
pub mod exercise;
pub mod feedback;
pub mod fingers;
pub mod formats;
pub mod overlay;
pub mod primitives;
pub mod session;
pub mod stats;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Frame, Hand, Handedness, Landmark, Observation, SonaraError};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use clock::{Clock, ManualClock, Moment, SystemClock};
pub use counter::{CounterConfig, RepetitionCounter};
pub use exercise::{Difficulty, Exercise};
pub use feedback::{Feedback, Tone};
pub use fingers::{Finger, count_fingers, count_frame, extended_fingers};
pub use overlay::OverlayView;
pub use session::{ExerciseEntry, PauseChange, Rate, Session, SessionState, StepOutcome};
pub use stats::{PatientRecord, SessionSummary, StatsReport};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{record_from_json, record_to_json};
