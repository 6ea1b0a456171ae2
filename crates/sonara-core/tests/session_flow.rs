//! End-to-end tests: detector frames through finger counting, the session
//! state machine and the persistent record.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{NaiveDate, NaiveDateTime};
use sonara_core::{
    Clock, CounterConfig, Frame, Hand, Handedness, Landmark, ManualClock, OverlayView,
    PatientRecord, Session, SessionState, StepOutcome, count_frame,
    primitives::{DEFAULT_MIN_HAND_SCORE, LANDMARK_COUNT},
    record_from_json, record_to_json,
};

fn anchor(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .and_then(|d| d.and_hms_opt(17, 45, 0))
        .unwrap()
}

/// A right hand with the first `extended` fingers (thumb first) extended.
fn right_hand(extended: usize) -> Hand {
    let mut landmarks = [Landmark::new(0.5, 0.6, 0.0); LANDMARK_COUNT];
    // Thumb: IP joint at x = 0.45; the tip moves left of it when extended.
    landmarks[3] = Landmark::new(0.45, 0.6, 0.0);
    landmarks[4] = Landmark::new(if extended >= 1 { 0.35 } else { 0.5 }, 0.6, 0.0);
    for (i, tip) in [8usize, 12, 16, 20].into_iter().enumerate() {
        landmarks[tip - 2] = Landmark::new(0.5, 0.5, 0.0);
        let y = if extended >= i + 2 { 0.3 } else { 0.55 };
        landmarks[tip] = Landmark::new(0.5, y, 0.0);
    }
    Hand::from_landmarks(Handedness::Right, 0.95, &landmarks).unwrap()
}

struct Replay {
    clock: ManualClock,
    session: Session,
}

impl Replay {
    fn new(day: u32, target: u32) -> Self {
        Self {
            clock: ManualClock::new(anchor(day)),
            session: Session::new(target, CounterConfig::default()),
        }
    }

    fn frame(&mut self, at_ms: u64, frame: Frame) -> StepOutcome {
        self.clock.set(at_ms);
        let observation = count_frame(&frame, DEFAULT_MIN_HAND_SCORE);
        self.session.observe(observation, &self.clock.now())
    }
}

#[test]
fn alternating_fist_and_palm_completes_session() {
    let mut replay = Replay::new(12, 4);

    assert_eq!(replay.frame(0, Frame::empty()), StepOutcome::Idle);
    assert_eq!(
        replay.frame(500, Frame::new(vec![right_hand(0)])),
        StepOutcome::Started
    );

    let mut completed = None;
    for i in 1..=4u64 {
        let hand = if i % 2 == 1 { right_hand(5) } else { right_hand(0) };
        let outcome = replay.frame(500 + i * 1_500, Frame::new(vec![hand]));
        if let StepOutcome::Completed(entry) = outcome {
            completed = Some(entry);
        }
    }

    let entry = completed.expect("target reached");
    assert_eq!(entry.session_exercise_number, 4);
    assert_eq!(entry.exercise_name, "Closed Fist Exercise");
    assert_eq!(replay.session.state(), SessionState::Complete);
    // 4 exercises in 6 s of activity = 40.0 per minute
    assert_eq!(replay.session.rate(100_000).to_string(), "40.0");
}

#[test]
fn quick_flicker_is_debounced() {
    let mut replay = Replay::new(12, 10);
    replay.frame(0, Frame::new(vec![right_hand(0)]));
    replay.frame(1_200, Frame::new(vec![right_hand(2)]));
    // 300 ms later: too soon to count again.
    assert_eq!(
        replay.frame(1_500, Frame::new(vec![right_hand(3)])),
        StepOutcome::Idle
    );
    assert_eq!(replay.session.count(), 1);
}

#[test]
fn hand_leaving_view_does_not_count() {
    let mut replay = Replay::new(12, 10);
    replay.frame(0, Frame::new(vec![right_hand(1)]));
    assert_eq!(replay.frame(3_000, Frame::empty()), StepOutcome::Idle);
    assert_eq!(
        replay.frame(6_000, Frame::new(vec![right_hand(1)])),
        StepOutcome::Idle
    );
    assert_eq!(replay.session.count(), 0);
}

#[test]
fn sessions_on_consecutive_days_build_a_streak() {
    let mut record = PatientRecord::new();

    for day in [12, 13, 14] {
        let mut replay = Replay::new(day, 2);
        replay.frame(0, Frame::new(vec![right_hand(0)]));
        replay.frame(2_000, Frame::new(vec![right_hand(5)]));
        replay.frame(4_000, Frame::new(vec![right_hand(0)]));
        assert!(replay.session.is_complete());
        record.record_session(replay.session.summary(&replay.clock.now()));
    }

    assert_eq!(record.daily_streak, 3);
    assert_eq!(record.total_exercises, 6);

    // The record survives a trip through its on-disk format.
    let restored = record_from_json(&record_to_json(&record).unwrap()).unwrap();
    assert_eq!(restored, record);

    let overlay = OverlayView::build(&Session::new(20, CounterConfig::default()), 3, 0);
    assert_eq!(overlay.feedback.message, "Let's Begin Your Therapy! 3 Day Streak!");
}
