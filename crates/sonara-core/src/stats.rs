//! # Statistics Module
//!
//! The persistent per-user record: lifetime totals, the daily streak and a
//! bounded history of session summaries.
//!
//! ## Streak rule
//!
//! The streak counts consecutive calendar days with at least one recorded
//! session. Recording on the day after the last session extends it,
//! recording on the same day leaves it unchanged, and any gap resets it to 1.

use crate::primitives::HISTORY_LIMIT;
use crate::session::ExerciseEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// SESSION SUMMARY
// =============================================================================

/// What is kept of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub exercises_completed: u32,
    /// Active time in whole seconds.
    pub session_duration: u64,
    pub target_achieved: bool,
    pub exercise_log: Vec<ExerciseEntry>,
}

impl SessionSummary {
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.target_achieved {
            "Completed"
        } else {
            "In Progress"
        }
    }
}

// =============================================================================
// PATIENT RECORD
// =============================================================================

/// Lifetime statistics for one user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    pub total_exercises: u64,
    pub total_sessions: u64,
    pub daily_streak: u32,
    pub last_session_date: Option<NaiveDate>,
    pub session_history: Vec<SessionSummary>,
}

impl PatientRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished session, updating totals, streak and history.
    ///
    /// The session's own date is taken as "today".
    pub fn record_session(&mut self, summary: SessionSummary) {
        let today = summary.date;
        if self.last_session_date != Some(today) {
            let yesterday = today.pred_opt();
            self.daily_streak = if yesterday.is_some() && self.last_session_date == yesterday {
                self.daily_streak.saturating_add(1)
            } else {
                1
            };
            self.last_session_date = Some(today);
        }

        self.total_exercises = self
            .total_exercises
            .saturating_add(u64::from(summary.exercises_completed));
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.session_history.push(summary);

        if self.session_history.len() > HISTORY_LIMIT {
            let excess = self.session_history.len() - HISTORY_LIMIT;
            self.session_history.drain(..excess);
        }
    }

    /// The last `n` sessions, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[SessionSummary] {
        let start = self.session_history.len().saturating_sub(n);
        &self.session_history[start..]
    }
}

// =============================================================================
// STATS REPORT
// =============================================================================

/// The printable statistics view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub total_sessions: u64,
    pub total_exercises: u64,
    pub daily_streak: u32,
    /// `(count, target)` of the session in progress, if any.
    pub current_session: Option<(u32, u32)>,
    pub recent_sessions: Vec<SessionSummary>,
}

impl StatsReport {
    #[must_use]
    pub fn new(record: &PatientRecord, current_session: Option<(u32, u32)>, recent: usize) -> Self {
        Self {
            total_sessions: record.total_sessions,
            total_exercises: record.total_exercises,
            daily_streak: record.daily_streak,
            current_session,
            recent_sessions: record.recent(recent).to_vec(),
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "PATIENT STATISTICS")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Sessions: {}", self.total_sessions)?;
        writeln!(f, "Total Exercises: {}", self.total_exercises)?;
        writeln!(f, "Daily Streak: {}", self.daily_streak)?;
        if let Some((count, target)) = self.current_session {
            writeln!(f, "Current Session: {} / {}", count, target)?;
        }
        writeln!(f)?;
        writeln!(f, "Recent Sessions:")?;
        if self.recent_sessions.is_empty() {
            writeln!(f, "  (none yet)")?;
        }
        for s in &self.recent_sessions {
            writeln!(
                f,
                "  {}: {} exercises - {}",
                s.date.format("%Y-%m-%d"),
                s.exercises_completed,
                s.status_label()
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).expect("valid date")
    }

    fn summary(date: NaiveDate, count: u32, done: bool) -> SessionSummary {
        SessionSummary {
            date,
            exercises_completed: count,
            session_duration: 60,
            target_achieved: done,
            exercise_log: Vec::new(),
        }
    }

    #[test]
    fn first_session_starts_streak() {
        let mut record = PatientRecord::new();
        record.record_session(summary(day(5), 20, true));

        assert_eq!(record.daily_streak, 1);
        assert_eq!(record.last_session_date, Some(day(5)));
        assert_eq!(record.total_exercises, 20);
        assert_eq!(record.total_sessions, 1);
    }

    #[test]
    fn consecutive_days_extend_streak() {
        let mut record = PatientRecord::new();
        record.record_session(summary(day(5), 20, true));
        record.record_session(summary(day(6), 20, true));
        record.record_session(summary(day(7), 4, false));
        assert_eq!(record.daily_streak, 3);
        assert_eq!(record.total_exercises, 44);
    }

    #[test]
    fn same_day_keeps_streak() {
        let mut record = PatientRecord::new();
        record.record_session(summary(day(5), 20, true));
        record.record_session(summary(day(6), 20, true));
        record.record_session(summary(day(6), 3, false));
        assert_eq!(record.daily_streak, 2);
        assert_eq!(record.total_sessions, 3);
    }

    #[test]
    fn gap_resets_streak() {
        let mut record = PatientRecord::new();
        record.record_session(summary(day(5), 20, true));
        record.record_session(summary(day(6), 20, true));
        record.record_session(summary(day(9), 20, true));
        assert_eq!(record.daily_streak, 1);
        assert_eq!(record.last_session_date, Some(day(9)));
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let mut record = PatientRecord::new();
        record.record_session(summary(day(31), 5, false));
        let feb_first = NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date");
        record.record_session(summary(feb_first, 5, false));
        assert_eq!(record.daily_streak, 2);
    }

    #[test]
    fn history_is_bounded() {
        let mut record = PatientRecord::new();
        for i in 0..(HISTORY_LIMIT as u32 + 5) {
            record.record_session(summary(day(1), i, false));
        }
        assert_eq!(record.session_history.len(), HISTORY_LIMIT);
        assert_eq!(record.session_history[0].exercises_completed, 5);
        assert_eq!(record.total_sessions, HISTORY_LIMIT as u64 + 5);
    }

    #[test]
    fn recent_returns_tail() {
        let mut record = PatientRecord::new();
        for i in 1..=7 {
            record.record_session(summary(day(i), i, true));
        }
        let recent: Vec<u32> = record.recent(5).iter().map(|s| s.exercises_completed).collect();
        assert_eq!(recent, vec![3, 4, 5, 6, 7]);
        assert_eq!(record.recent(100).len(), 7);
    }

    #[test]
    fn report_lists_recent_sessions() {
        let mut record = PatientRecord::new();
        record.record_session(summary(day(2), 20, true));
        record.record_session(summary(day(3), 7, false));

        let text = StatsReport::new(&record, Some((4, 20)), 5).to_string();
        assert!(text.contains("Total Sessions: 2"));
        assert!(text.contains("Daily Streak: 2"));
        assert!(text.contains("Current Session: 4 / 20"));
        assert!(text.contains("2026-01-02: 20 exercises - Completed"));
        assert!(text.contains("2026-01-03: 7 exercises - In Progress"));
    }
}
