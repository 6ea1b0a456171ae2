//! # Clock Module
//!
//! Time sources for the session engine.
//!
//! The engine never reads the time itself. Every operation that depends on
//! time receives a [`Moment`], which pairs a monotonic millisecond counter
//! (used for all duration arithmetic) with the local wall-clock time (used
//! for calendar dates and log timestamps).

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

// =============================================================================
// MOMENT
// =============================================================================

/// A point in time as seen by the session engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    /// Milliseconds on a monotonic clock. Only differences are meaningful.
    pub monotonic_ms: u64,
    /// Local wall-clock time.
    pub local: NaiveDateTime,
}

impl Moment {
    #[must_use]
    pub const fn new(monotonic_ms: u64, local: NaiveDateTime) -> Self {
        Self {
            monotonic_ms,
            local,
        }
    }

    /// Calendar date in local time.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    /// Time of day as `HH:MM:SS`.
    #[must_use]
    pub fn time_label(&self) -> String {
        self.local.format("%H:%M:%S").to_string()
    }
}

// =============================================================================
// CLOCK TRAIT
// =============================================================================

/// A source of [`Moment`]s.
pub trait Clock: Send + Sync {
    fn now(&self) -> Moment;
}

/// The real clock: `Instant` for monotonic time, `chrono::Local` for wall time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Moment {
        let elapsed = self.origin.elapsed().as_millis();
        Moment {
            monotonic_ms: u64::try_from(elapsed).unwrap_or(u64::MAX),
            local: Local::now().naive_local(),
        }
    }
}

/// A clock that only moves when told to.
///
/// Used to replay recorded detector streams with their own timestamps, and
/// in tests. The wall-clock part is `anchor + offset`. The offset never goes
/// backwards: setting an earlier value than the current one is ignored.
#[derive(Debug)]
pub struct ManualClock {
    anchor: NaiveDateTime,
    offset_ms: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self {
            anchor,
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Anchor the clock at the current local time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Move the clock to `offset_ms` after the anchor (never backwards).
    pub fn set(&self, offset_ms: u64) {
        self.offset_ms.fetch_max(offset_ms, Ordering::SeqCst);
    }

    /// Move the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        let current = self.offset_ms.load(Ordering::SeqCst);
        self.set(current.saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Moment {
        let offset_ms = self.offset_ms.load(Ordering::SeqCst);
        let delta = i64::try_from(offset_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX);
        let local = self
            .anchor
            .checked_add_signed(delta)
            .unwrap_or(NaiveDateTime::MAX);
        Moment {
            monotonic_ms: offset_ms,
            local,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
