//! # Tracker
//!
//! Drives one exercise session from detector frames and user controls, and
//! keeps the patient record in step with it.
//!
//! ## Save policy
//!
//! - Reaching the target records the session and saves at once.
//! - Ending early (quit, end of input, server shutdown) records and saves
//!   the session only if at least one exercise was counted.
//! - Reset throws the current session away without recording it.
//!
//! ## Time
//!
//! Frames without a timestamp are timed with the tracker's clock. As soon as
//! a frame carries `timestamp_ms`, the tracker switches to a replay clock
//! driven by those timestamps, so a recorded stream replays with the same
//! timing it was captured with.

use crate::config::TrackerConfig;
use crate::render::TerminalRenderer;
use crate::source::{Control, InputEvent, LandmarkSource};
use crate::store::RecordStore;
use chrono::{Local, TimeDelta};
use sonara_core::{
    Clock, Frame, ManualClock, Moment, Observation, OverlayView, PatientRecord, PauseChange,
    Session, SonaraError, StatsReport, StepOutcome, SystemClock, count_frame,
    primitives::RECENT_SESSIONS,
};
use std::io::Write;

/// What the caller should do after a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Show the statistics view, then continue.
    ShowStats,
    Quit,
}

/// Why [`Tracker::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Quit,
    EndOfInput,
}

/// Result of feeding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameUpdate {
    pub observation: Observation,
    pub outcome: StepOutcome,
}

/// One session plus the record it will be written to.
pub struct Tracker {
    config: TrackerConfig,
    session: Session,
    record: PatientRecord,
    store: RecordStore,
    clock: Box<dyn Clock>,
    replay: Option<ManualClock>,
    /// The current session is already part of `record`.
    recorded: bool,
    /// `record` has changes that are not on disk yet.
    unsaved: bool,
}

impl Tracker {
    /// Load the record from `store` and start a session on the system clock.
    pub fn new(config: TrackerConfig, store: RecordStore) -> Result<Self, SonaraError> {
        Self::with_clock(config, store, Box::new(SystemClock::new()))
    }

    pub fn with_clock(
        config: TrackerConfig,
        store: RecordStore,
        clock: Box<dyn Clock>,
    ) -> Result<Self, SonaraError> {
        config.validate()?;
        let record = store.load()?;
        tracing::info!(
            path = %store.path().display(),
            sessions = record.total_sessions,
            streak = record.daily_streak,
            "Loaded patient record"
        );

        Ok(Self {
            session: Session::new(config.target, config.counter()),
            config,
            record,
            store,
            clock,
            replay: None,
            recorded: false,
            unsaved: false,
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Current time on the active clock.
    #[must_use]
    pub fn now(&self) -> Moment {
        match &self.replay {
            Some(replay) => replay.now(),
            None => self.clock.now(),
        }
    }

    fn moment_for(&mut self, frame: &Frame) -> Moment {
        let Some(ts) = frame.timestamp_ms else {
            return self.now();
        };
        let replay = self.replay.get_or_insert_with(|| {
            tracing::debug!(first_timestamp_ms = ts, "Timing frames by their timestamps");
            replay_clock(ts)
        });
        replay.set(ts);
        replay.now()
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Count fingers in `frame` and advance the session.
    pub fn handle_frame(&mut self, frame: &Frame) -> FrameUpdate {
        let moment = self.moment_for(frame);
        let observation = count_frame(frame, self.config.min_hand_score);
        let outcome = self.session.observe(observation, &moment);

        match &outcome {
            StepOutcome::Idle => {}
            StepOutcome::Started => {
                tracing::info!(fingers = %observation, "Hand detected, session timer started");
            }
            StepOutcome::Repetition(entry) => {
                tracing::info!(
                    number = entry.session_exercise_number,
                    target = self.session.target(),
                    exercise = %entry.exercise_name,
                    rate = %entry.rate,
                    "Exercise counted"
                );
            }
            StepOutcome::Completed(entry) => {
                tracing::info!(
                    number = entry.session_exercise_number,
                    elapsed_secs = self.session.elapsed_ms(moment.monotonic_ms) / 1000,
                    "Session completed. Exercise target reached."
                );
                self.record_session(&moment);
                self.save();
            }
        }

        FrameUpdate {
            observation,
            outcome,
        }
    }

    /// Pause or resume. Fails once the session is complete.
    pub fn toggle_pause(&mut self) -> Result<PauseChange, SonaraError> {
        let moment = self.now();
        let change = self.session.toggle_pause(&moment)?;
        match change {
            PauseChange::Paused => tracing::info!("Session paused"),
            PauseChange::Resumed => tracing::info!("Session resumed"),
        }
        Ok(change)
    }

    /// Apply a user control.
    pub fn handle_control(&mut self, control: Control) -> Flow {
        match control {
            Control::Pause => {
                if let Err(e) = self.toggle_pause() {
                    tracing::warn!("{}. Cannot pause.", e);
                }
                Flow::Continue
            }
            Control::Reset => {
                self.restart();
                tracing::info!("Session reset");
                Flow::Continue
            }
            Control::Stats => Flow::ShowStats,
            Control::Quit => Flow::Quit,
        }
    }

    /// Start a new session, discarding the current one.
    pub fn restart(&mut self) {
        self.session.reset();
        self.recorded = false;
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    #[must_use]
    pub fn overlay(&self) -> OverlayView {
        OverlayView::build(
            &self.session,
            self.record.daily_streak,
            self.now().monotonic_ms,
        )
    }

    #[must_use]
    pub fn stats_report(&self) -> StatsReport {
        StatsReport::new(
            &self.record,
            Some((self.session.count(), self.session.target())),
            RECENT_SESSIONS,
        )
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Apply the end-of-session save policy.
    pub fn finish(&mut self) -> Result<(), SonaraError> {
        if !self.recorded && self.session.count() > 0 && !self.session.is_complete() {
            tracing::info!(
                count = self.session.count(),
                target = self.session.target(),
                "Recording unfinished session"
            );
            let moment = self.now();
            self.record_session(&moment);
        }

        if self.unsaved {
            self.store.save(&self.record)?;
            self.unsaved = false;
            tracing::info!(path = %self.store.path().display(), "Progress saved");
        }
        Ok(())
    }

    fn record_session(&mut self, moment: &Moment) {
        self.record.record_session(self.session.summary(moment));
        self.recorded = true;
        self.unsaved = true;
    }

    /// Save now; on failure keep the changes pending for [`Tracker::finish`].
    fn save(&mut self) {
        match self.store.save(&self.record) {
            Ok(()) => {
                self.unsaved = false;
                tracing::info!(path = %self.store.path().display(), "Progress saved");
            }
            Err(e) => tracing::error!("Failed to save progress: {}", e),
        }
    }

    // =========================================================================
    // MAIN LOOP
    // =========================================================================

    /// Feed every event from `source`, redrawing the overlay as it changes.
    ///
    /// Does not apply the save policy; call [`Tracker::finish`] afterwards,
    /// also when this returns an error.
    pub fn run<S, W>(
        &mut self,
        source: &mut S,
        renderer: &mut TerminalRenderer<W>,
    ) -> Result<RunEnd, SonaraError>
    where
        S: LandmarkSource + ?Sized,
        W: Write,
    {
        renderer.render(&self.overlay())?;
        loop {
            let Some(event) = source.next_event()? else {
                tracing::info!("Input ended");
                return Ok(RunEnd::EndOfInput);
            };

            match event {
                InputEvent::Frame(frame) => {
                    self.handle_frame(&frame);
                }
                InputEvent::Control(control) => {
                    if control == Control::Reset {
                        renderer.unpin();
                    }
                    match self.handle_control(control) {
                        Flow::Continue => {}
                        Flow::ShowStats => renderer.stats(&self.stats_report())?,
                        Flow::Quit => return Ok(RunEnd::Quit),
                    }
                }
            }
            renderer.render(&self.overlay())?;
        }
    }
}

/// A replay clock whose wall time at `first_ts` is the current local time.
fn replay_clock(first_ts: u64) -> ManualClock {
    let now = Local::now().naive_local();
    let anchor = i64::try_from(first_ts)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .and_then(|offset| now.checked_sub_signed(offset))
        .unwrap_or(now);
    ManualClock::new(anchor)
}

// =============================================================================
// TESTS
// =============================================================================
