//! # Property-Based Tests
//!
//! Invariants of the finger rule, the repetition counter and the session timer.

// Mirroring landmarks negates coordinates.
#![allow(clippy::float_arithmetic)]

use chrono::NaiveDate;
use proptest::collection::vec;
use proptest::prelude::*;
use sonara_core::{
    CounterConfig, Frame, Hand, Handedness, Landmark, Moment, Observation, Rate,
    RepetitionCounter, Session, count_fingers, count_frame, primitives::LANDMARK_COUNT,
};

fn moment(ms: u64) -> Moment {
    let local = NaiveDate::from_ymd_opt(2026, 9, 1)
        .and_then(|d| d.and_hms_opt(7, 0, 0))
        .expect("valid date");
    Moment::new(ms, local)
}

fn arb_landmark() -> impl Strategy<Value = Landmark> {
    (0.0f32..1.0, 0.0f32..1.0, -0.2f32..0.2).prop_map(|(x, y, z)| Landmark::new(x, y, z))
}

fn arb_hand() -> impl Strategy<Value = Hand> {
    (
        prop_oneof![Just(Handedness::Left), Just(Handedness::Right)],
        0.0f32..=1.0,
        vec(arb_landmark(), LANDMARK_COUNT),
    )
        .prop_map(|(handedness, score, landmarks)| {
            Hand::from_landmarks(handedness, score, &landmarks).expect("21 landmarks")
        })
}

/// Either "no hand" or a finger count of one or two hands.
fn arb_observation() -> impl Strategy<Value = Observation> {
    prop_oneof![Just(Observation::NoHand), (0u8..=10).prop_map(Observation::Fingers)]
}

/// A timeline of strictly increasing timestamps with observations.
fn arb_timeline() -> impl Strategy<Value = Vec<(u64, Observation)>> {
    vec((1u64..3_000, arb_observation()), 1..120).prop_map(|steps| {
        let mut t = 0;
        steps
            .into_iter()
            .map(|(dt, obs)| {
                t += dt;
                (t, obs)
            })
            .collect()
    })
}

proptest! {
    /// One hand never shows more than five fingers.
    #[test]
    fn single_hand_count_is_bounded(hand in arb_hand()) {
        prop_assert!(count_fingers(&hand) <= 5);
    }

    /// A frame never exceeds ten fingers, whatever the detector sends.
    #[test]
    fn frame_count_is_bounded(hands in vec(arb_hand(), 0..5)) {
        let observation = count_frame(&Frame::new(hands), 0.0);
        if let Some(n) = observation.fingers() {
            prop_assert!(n <= 10);
        }
    }

    /// Mirroring a hand horizontally and swapping its label keeps the count.
    #[test]
    fn mirrored_hand_counts_the_same(hand in arb_hand()) {
        let mut mirrored = hand.clone();
        mirrored.handedness = match hand.handedness {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        };
        for landmark in &mut mirrored.landmarks {
            landmark.x = -landmark.x;
        }
        prop_assert_eq!(count_fingers(&hand), count_fingers(&mirrored));
    }

    /// Counted repetitions are always more than the debounce window apart.
    #[test]
    fn repetitions_respect_debounce(timeline in arb_timeline(), debounce in 0u64..2_000) {
        let mut counter = RepetitionCounter::new(CounterConfig {
            debounce_ms: debounce,
            count_hand_absence: true,
        });
        let mut last: Option<u64> = None;
        for (t, obs) in timeline {
            if counter.observe(obs, t, true) {
                if let Some(prev) = last {
                    prop_assert!(t - prev > debounce);
                }
                last = Some(t);
            }
        }
    }

    /// Elapsed time never exceeds wall time and never decreases.
    #[test]
    fn elapsed_is_monotonic_and_bounded(
        timeline in arb_timeline(),
        pauses in vec(any::<bool>(), 120),
    ) {
        let mut session = Session::new(1_000, CounterConfig::default());
        let mut previous = 0;
        for (i, (t, obs)) in timeline.into_iter().enumerate() {
            if pauses[i] {
                let _ = session.toggle_pause(&moment(t));
            }
            session.observe(obs, &moment(t));
            let elapsed = session.elapsed_ms(t);
            prop_assert!(elapsed <= t);
            prop_assert!(elapsed >= previous);
            previous = elapsed;
        }
    }

    /// The session count matches its log and never passes the target.
    #[test]
    fn count_matches_log(timeline in arb_timeline(), target in 1u32..15) {
        let mut session = Session::new(target, CounterConfig::default());
        for (t, obs) in timeline {
            session.observe(obs, &moment(t));
        }
        prop_assert_eq!(session.count() as usize, session.log().len());
        prop_assert!(session.count() <= target);
        prop_assert!(session.progress_percent() <= 100);
    }

    /// Rates are zero exactly when nothing has been counted.
    #[test]
    fn rate_zero_iff_no_exercises(count in 0u32..500, elapsed in 1u64..=1_200_000) {
        let rate = Rate::from_counts(count, elapsed);
        if count == 0 {
            prop_assert!(rate.is_zero());
        } else {
            // One exercise in 20 minutes is 0.05 per minute, which rounds up to 0.1.
            prop_assert!(!rate.is_zero());
        }
    }
}
