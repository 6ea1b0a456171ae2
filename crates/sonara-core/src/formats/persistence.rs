//! # Persistence Format
//!
//! JSON serialization for the patient record.
//!
//! Format: a single pretty-printed JSON object (2-space indent), dates as
//! `YYYY-MM-DD`. Unknown fields are ignored and missing fields take their
//! defaults, so records written by older versions keep loading.
//!
//! ## Size limit
//!
//! Payloads larger than [`MAX_RECORD_SIZE`] are rejected before parsing.

use crate::primitives::MAX_RECORD_SIZE;
use crate::stats::PatientRecord;
use crate::types::SonaraError;

/// Serialize a record to pretty JSON bytes.
///
/// This is a pure transformation - no file I/O.
pub fn record_to_json(record: &PatientRecord) -> Result<Vec<u8>, SonaraError> {
    let mut bytes = serde_json::to_vec_pretty(record)
        .map_err(|e| SonaraError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserialize a record from JSON bytes.
///
/// This is a pure transformation - no file I/O.
pub fn record_from_json(bytes: &[u8]) -> Result<PatientRecord, SonaraError> {
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(SonaraError::Serialization(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_RECORD_SIZE
        )));
    }

    serde_json::from_slice(bytes).map_err(|e| {
        SonaraError::Serialization(format!("Failed to parse patient record: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::Difficulty;
    use crate::session::{ExerciseEntry, Rate};
    use crate::stats::SessionSummary;
    use chrono::NaiveDate;

    fn sample_record() -> PatientRecord {
        let mut record = PatientRecord::new();
        record.record_session(SessionSummary {
            date: NaiveDate::from_ymd_opt(2026, 4, 9).expect("valid date"),
            exercises_completed: 1,
            session_duration: 42,
            target_achieved: false,
            exercise_log: vec![ExerciseEntry {
                time: "10:11:12".to_string(),
                finger_count: 3,
                exercise_name: "Three-Finger Stretch".to_string(),
                difficulty: Some(Difficulty::Intermediate),
                session_exercise_number: 1,
                rate: Rate(14),
            }],
        });
        record
    }

    #[test]
    fn json_layout() {
        let bytes = record_to_json(&sample_record()).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf-8");

        assert!(text.contains("\"last_session_date\": \"2026-04-09\""));
        assert!(text.contains("\"daily_streak\": 1"));
        assert!(text.contains("\"exercises_per_minute_x10\": 14"));
        assert!(text.contains("\"difficulty\": \"Intermediate\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn save_load_save_is_stable() {
        let first = record_to_json(&sample_record()).expect("serialize");
        let restored = record_from_json(&first).expect("deserialize");
        assert_eq!(restored, sample_record());
        let second = record_to_json(&restored).expect("serialize again");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_fields_default() {
        let record = record_from_json(br#"{"total_sessions": 4}"#).expect("parse");
        assert_eq!(record.total_sessions, 4);
        assert_eq!(record.daily_streak, 0);
        assert!(record.last_session_date.is_none());
        assert!(record.session_history.is_empty());
    }

    #[test]
    fn null_date_is_accepted() {
        let record = record_from_json(br#"{"last_session_date": null}"#).expect("parse");
        assert!(record.last_session_date.is_none());
    }

    #[test]
    fn record_with_decimal_rates_loads() {
        let text = br#"{
            "total_exercises": 2,
            "total_sessions": 1,
            "last_session_date": "2026-04-09",
            "daily_streak": 1,
            "session_history": [{
                "date": "2026-04-09",
                "exercises_completed": 2,
                "session_duration": 17,
                "target_achieved": false,
                "exercise_log": [
                    {"time": "10:11:12", "finger_count": 3,
                     "exercise_name": "Three-Finger Stretch", "difficulty": "Intermediate",
                     "session_exercise_number": 1, "exercises_per_minute": 8.6},
                    {"time": "10:11:20", "finger_count": -1, "exercise_name": "",
                     "difficulty": "", "session_exercise_number": 2,
                     "exercises_per_minute": 0}
                ]
            }]
        }"#;
        let record = record_from_json(text).expect("parse");

        let log = &record.session_history[0].exercise_log;
        assert_eq!(log[0].rate, Rate(86));
        assert_eq!(log[0].difficulty, Some(Difficulty::Intermediate));
        assert_eq!(log[1].rate, Rate(0));
        assert_eq!(log[1].difficulty, None);

        let saved = String::from_utf8(record_to_json(&record).expect("serialize")).expect("utf-8");
        assert!(saved.contains("\"difficulty\": \"\""));
        assert!(saved.contains("\"exercises_per_minute_x10\": 86"));
    }

    #[test]
    fn sparse_history_entries_default() {
        let record = record_from_json(
            br#"{"session_history": [{"exercises_completed": 3, "exercise_log": [{}]}]}"#,
        )
        .expect("parse");
        let summary = &record.session_history[0];
        assert_eq!(summary.exercises_completed, 3);
        assert!(!summary.target_achieved);
        assert_eq!(summary.exercise_log[0], ExerciseEntry::default());
    }

    #[test]
    fn unknown_difficulty_rejected() {
        let text = br#"{"session_history": [{"exercise_log": [{"difficulty": "Extreme"}]}]}"#;
        assert!(matches!(
            record_from_json(text),
            Err(SonaraError::Serialization(_))
        ));
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            record_from_json(b"not json"),
            Err(SonaraError::Serialization(_))
        ));
    }

    #[test]
    fn oversized_payload_rejected_before_parsing() {
        let bytes = vec![b' '; MAX_RECORD_SIZE + 1];
        let err = record_from_json(&bytes).expect_err("too large");
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
