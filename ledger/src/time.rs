//! # Time
//!
//! The ledger measures time in microseconds since the Unix epoch. A
//! [`Clock`] is the host's time service; the executor reads it once per
//! operation and hands the contract that single [`TimePoint`], so two checks
//! inside one operation can never disagree about what "now" is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// TimePoint
// ---------------------------------------------------------------------------

/// Microseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(u64);

impl TimePoint {
    /// The epoch itself.
    pub const EPOCH: TimePoint = TimePoint(0);

    /// Wraps a microsecond count.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Builds a time point from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// The microsecond count.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// `self + micros`, or `None` on overflow.
    pub fn checked_add_micros(&self, micros: u64) -> Option<TimePoint> {
        self.0.checked_add(micros).map(TimePoint)
    }

    /// Converts to a chrono timestamp for display and APIs.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let micros = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp_micros(micros)
    }
}

impl From<DateTime<Utc>> for TimePoint {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(u64::try_from(dt.timestamp_micros()).unwrap_or(0))
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}us", self.0),
        }
    }
}

impl fmt::Debug for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// The host's time service.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> TimePoint;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePoint {
        TimePoint::from(Utc::now())
    }
}

/// A clock that only moves when told to. Used by tests and deterministic
/// replays, where vesting windows have to open on command.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Starts the clock at `start`.
    pub fn new(start: TimePoint) -> Self {
        Self {
            micros: AtomicU64::new(start.as_micros()),
        }
    }

    /// Jumps to `at`.
    pub fn set(&self, at: TimePoint) {
        self.micros.store(at.as_micros(), Ordering::SeqCst);
    }

    /// Moves forward by `micros`, saturating at the end of time.
    pub fn advance(&self, micros: u64) {
        let _ = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(micros))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePoint {
        TimePoint(self.micros.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_on_command() {
        let clock = ManualClock::new(TimePoint::from_secs(10));
        assert_eq!(clock.now(), TimePoint::from_micros(10_000_000));
        clock.advance(500);
        assert_eq!(clock.now().as_micros(), 10_000_500);
        clock.set(TimePoint::EPOCH);
        assert_eq!(clock.now(), TimePoint::EPOCH);
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::new(TimePoint::from_micros(u64::MAX - 1));
        clock.advance(10);
        assert_eq!(clock.now().as_micros(), u64::MAX);
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(
            TimePoint::from_micros(5).checked_add_micros(5),
            Some(TimePoint::from_micros(10))
        );
        assert_eq!(TimePoint::from_micros(u64::MAX).checked_add_micros(1), None);
    }

    #[test]
    fn system_clock_is_after_2020() {
        let now = SystemClock.now();
        assert!(now > TimePoint::from_secs(1_577_836_800));
    }

    #[test]
    fn datetime_round_trip() {
        let dt = DateTime::from_timestamp(1_700_000_000, 123_000).unwrap();
        let tp = TimePoint::from(dt);
        assert_eq!(tp.as_micros(), 1_700_000_000_000_123);
        assert_eq!(tp.to_datetime(), Some(dt));
    }
}
