//! # Session Module
//!
//! The exercise session state machine.
//!
//! ```text
//!             first hand              count >= target
//!   Waiting ──────────────▶ Running ───────────────────▶ Complete
//!      │  ▲                  │  ▲
//!      ▼  │ toggle           ▼  │ toggle
//!   Paused (not started)    Paused
//! ```
//!
//! Elapsed time starts at the first frame with a hand and excludes every
//! paused interval. Once complete, the session is frozen: further frames only
//! update the displayed gesture and pausing is refused.

use crate::clock::Moment;
use crate::counter::{CounterConfig, RepetitionCounter};
use crate::exercise::{Difficulty, Exercise};
use crate::primitives::MS_PER_MINUTE;
use crate::stats::SessionSummary;
use crate::types::{Observation, SonaraError};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// RATE
// =============================================================================

/// Exercises per minute, stored in tenths (`125` = 12.5 exercises/min).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rate(pub u32);

impl Rate {
    /// Rate of `count` exercises over `elapsed_ms`, rounded half up to a tenth.
    ///
    /// Zero when no time has elapsed.
    #[must_use]
    pub fn from_counts(count: u32, elapsed_ms: u64) -> Self {
        if elapsed_ms == 0 {
            return Self(0);
        }
        let scaled = u64::from(count).saturating_mul(MS_PER_MINUTE * 10);
        let tenths = scaled.saturating_add(elapsed_ms / 2) / elapsed_ms;
        Self(u32::try_from(tenths).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn tenths(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Rate from a decimal exercises-per-minute value, rounded to a tenth.
    ///
    /// Negative and non-finite values give zero.
    #[must_use]
    pub fn from_per_minute(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self(0);
        }
        // Rounded through its one-decimal rendering, digits without the point.
        let digits: String = format!("{:.1}", value)
            .chars()
            .filter(|c| *c != '.')
            .collect();
        Self(digits.parse().unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

// =============================================================================
// EXERCISE LOG
// =============================================================================

/// One counted repetition, as written to the session log.
///
/// Logs written with a decimal `exercises_per_minute` instead of
/// `exercises_per_minute_x10` still load. A missing difficulty is written
/// as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredEntry")]
pub struct ExerciseEntry {
    /// Local time of day, `HH:MM:SS`.
    pub time: String,
    /// Gesture the repetition ended on; `-1` when it ended with no hand visible.
    pub finger_count: i32,
    /// Empty when no hand was visible.
    pub exercise_name: String,
    #[serde(serialize_with = "difficulty_label::serialize")]
    pub difficulty: Option<Difficulty>,
    /// 1-based position of this repetition in the session.
    pub session_exercise_number: u32,
    /// Session rate at the moment the repetition was counted.
    #[serde(rename = "exercises_per_minute_x10")]
    pub rate: Rate,
}

/// Every field a stored log entry may carry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredEntry {
    time: String,
    finger_count: i32,
    exercise_name: String,
    #[serde(deserialize_with = "difficulty_label::deserialize")]
    difficulty: Option<Difficulty>,
    session_exercise_number: u32,
    exercises_per_minute_x10: Option<Rate>,
    exercises_per_minute: Option<f64>,
}

impl From<StoredEntry> for ExerciseEntry {
    fn from(stored: StoredEntry) -> Self {
        let rate = stored
            .exercises_per_minute_x10
            .or_else(|| stored.exercises_per_minute.map(Rate::from_per_minute))
            .unwrap_or_default();
        Self {
            time: stored.time,
            finger_count: stored.finger_count,
            exercise_name: stored.exercise_name,
            difficulty: stored.difficulty,
            session_exercise_number: stored.session_exercise_number,
            rate,
        }
    }
}

/// `Option<Difficulty>` as its label, `""` standing for none.
mod difficulty_label {
    use crate::exercise::Difficulty;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        difficulty: &Option<Difficulty>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(difficulty.as_ref().map_or("", |d| d.name()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Difficulty>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(label) if !label.trim().is_empty() => {
                label.parse().map(Some).map_err(D::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No hand has been seen yet; the timer has not started.
    Waiting,
    Running,
    Paused,
    /// The target was reached.
    Complete,
}

impl SessionState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Waiting => "waiting",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a single observation did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing changed besides the displayed gesture.
    Idle,
    /// The first hand was seen and the timer started.
    Started,
    Repetition(ExerciseEntry),
    /// The repetition that reached the target.
    Completed(ExerciseEntry),
}

/// Result of [`Session::toggle_pause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseChange {
    Paused,
    Resumed,
}

// =============================================================================
// SESSION
// =============================================================================

/// A single exercise session.
#[derive(Debug, Clone)]
pub struct Session {
    target: u32,
    counter: RepetitionCounter,
    state: SessionState,
    /// State to return to when a pause ends.
    resume_to: SessionState,
    start_ms: Option<u64>,
    pause_started_ms: u64,
    total_paused_ms: u64,
    end_ms: u64,
    count: u32,
    log: Vec<ExerciseEntry>,
    /// Gesture shown on the overlay; one frame behind while paused.
    displayed: Observation,
    /// Observation from the latest frame.
    latest: Observation,
}

impl Session {
    /// Create a session that completes after `target` repetitions.
    ///
    /// A target of zero is clamped to one.
    #[must_use]
    pub fn new(target: u32, counter: CounterConfig) -> Self {
        Self {
            target: target.max(1),
            counter: RepetitionCounter::new(counter),
            state: SessionState::Waiting,
            resume_to: SessionState::Waiting,
            start_ms: None,
            pause_started_ms: 0,
            total_paused_ms: 0,
            end_ms: 0,
            count: 0,
            log: Vec::new(),
            displayed: Observation::NoHand,
            latest: Observation::NoHand,
        }
    }

    /// Start over with the same target and counter settings.
    pub fn reset(&mut self) {
        *self = Self::new(self.target, self.counter.config());
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Whether the timer has started (a hand has been seen).
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.start_ms.is_some()
    }

    #[must_use]
    pub fn displayed(&self) -> Observation {
        self.displayed
    }

    #[must_use]
    pub fn log(&self) -> &[ExerciseEntry] {
        &self.log
    }

    // =========================================================================
    // TIME ACCOUNTING
    // =========================================================================

    /// Active exercise time in milliseconds, excluding pauses.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let Some(start) = self.start_ms else {
            return 0;
        };
        let until = match self.state {
            SessionState::Complete => self.end_ms,
            SessionState::Paused => self.pause_started_ms,
            SessionState::Waiting | SessionState::Running => now_ms,
        };
        until
            .saturating_sub(start)
            .saturating_sub(self.total_paused_ms)
    }

    /// Current exercises-per-minute rate.
    #[must_use]
    pub fn rate(&self, now_ms: u64) -> Rate {
        Rate::from_counts(self.count, self.elapsed_ms(now_ms))
    }

    /// Progress towards the target, capped at 100.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        (self.count.saturating_mul(100) / self.target).min(100)
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Feed the observation read from one frame.
    pub fn observe(&mut self, observation: Observation, moment: &Moment) -> StepOutcome {
        let now = moment.monotonic_ms;
        let previous = std::mem::replace(&mut self.latest, observation);
        match self.state {
            SessionState::Complete => {
                self.displayed = observation;
                StepOutcome::Idle
            }
            SessionState::Paused => {
                self.displayed = previous;
                if self.has_started() {
                    self.counter.observe(observation, now, false);
                }
                StepOutcome::Idle
            }
            SessionState::Waiting => {
                self.displayed = observation;
                if !observation.has_hand() {
                    return StepOutcome::Idle;
                }
                self.start_ms = Some(now);
                self.state = SessionState::Running;
                self.counter.observe(observation, now, true);
                StepOutcome::Started
            }
            SessionState::Running => {
                self.displayed = observation;
                if !self.counter.observe(observation, now, true) {
                    return StepOutcome::Idle;
                }
                self.count = self.count.saturating_add(1);
                if self.count >= self.target {
                    self.state = SessionState::Complete;
                    self.end_ms = now;
                }
                let entry = self.log_entry(observation, moment);
                self.log.push(entry.clone());
                if self.is_complete() {
                    StepOutcome::Completed(entry)
                } else {
                    StepOutcome::Repetition(entry)
                }
            }
        }
    }

    /// Pause a running (or not yet started) session, or resume a paused one.
    pub fn toggle_pause(&mut self, moment: &Moment) -> Result<PauseChange, SonaraError> {
        let now = moment.monotonic_ms;
        match self.state {
            SessionState::Complete => Err(SonaraError::SessionComplete),
            SessionState::Paused => {
                if self.has_started() {
                    let paused_for = now.saturating_sub(self.pause_started_ms);
                    self.total_paused_ms = self.total_paused_ms.saturating_add(paused_for);
                }
                self.state = self.resume_to;
                Ok(PauseChange::Resumed)
            }
            SessionState::Waiting | SessionState::Running => {
                self.resume_to = self.state;
                self.pause_started_ms = now;
                self.state = SessionState::Paused;
                Ok(PauseChange::Paused)
            }
        }
    }

    /// Summary of the session for the persistent record.
    #[must_use]
    pub fn summary(&self, moment: &Moment) -> SessionSummary {
        SessionSummary {
            date: moment.date(),
            exercises_completed: self.count,
            session_duration: self.elapsed_ms(moment.monotonic_ms) / 1000,
            target_achieved: self.count >= self.target,
            exercise_log: self.log.clone(),
        }
    }

    fn log_entry(&self, observation: Observation, moment: &Moment) -> ExerciseEntry {
        let exercise = Exercise::for_observation(observation);
        ExerciseEntry {
            time: moment.time_label(),
            finger_count: observation.log_value(),
            exercise_name: exercise
                .as_ref()
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            difficulty: exercise.map(|e| e.difficulty),
            session_exercise_number: self.count,
            rate: self.rate(moment.monotonic_ms),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
