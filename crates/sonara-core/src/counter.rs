//! # Repetition Counter
//!
//! Turns a stream of per-frame observations into counted repetitions.
//!
//! A repetition is one change of gesture. Changes that happen within the
//! debounce window after the previous counted repetition are not counted,
//! but still move the baseline: the next change is measured against the
//! gesture shown last, not the one last counted.

use crate::primitives::DEFAULT_DEBOUNCE_MS;
use crate::types::Observation;
use serde::{Deserialize, Serialize};

/// Tunables of the repetition counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Minimum time between two counted repetitions (exclusive), in milliseconds.
    pub debounce_ms: u64,
    /// Treat "no hand visible" as a gesture of its own.
    ///
    /// When `false`, frames without a hand are skipped entirely and a hand
    /// briefly leaving the camera does not count as a repetition.
    pub count_hand_absence: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            count_hand_absence: false,
        }
    }
}

/// Gesture-transition counter with a debounce window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepetitionCounter {
    config: CounterConfig,
    /// Last observed gesture; `None` until a baseline is established.
    previous: Option<Observation>,
    /// Monotonic time of the last counted repetition (or of the baseline).
    last_count_ms: u64,
}

impl RepetitionCounter {
    #[must_use]
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            previous: None,
            last_count_ms: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> CounterConfig {
        self.config
    }

    /// The gesture the next change is measured against.
    #[must_use]
    pub fn baseline(&self) -> Option<Observation> {
        self.previous
    }

    /// Feed one observation. Returns `true` when it completes a repetition.
    ///
    /// `active` is `false` while the session is paused: the gesture is still
    /// tracked so that resuming does not count a change made during the pause.
    pub fn observe(&mut self, observation: Observation, now_ms: u64, active: bool) -> bool {
        if !observation.has_hand() && !self.config.count_hand_absence {
            return false;
        }

        let counted = match self.previous {
            None => {
                self.last_count_ms = now_ms;
                false
            }
            Some(previous) => {
                active
                    && previous != observation
                    && now_ms.saturating_sub(self.last_count_ms) > self.config.debounce_ms
            }
        };

        if counted {
            self.last_count_ms = now_ms;
        }
        self.previous = Some(observation);
        counted
    }

    /// Forget the baseline; the next observation starts fresh.
    pub fn reset(&mut self) {
        self.previous = None;
        self.last_count_ms = 0;
    }
}

// =============================================================================
// TESTS
// =============================================================================
