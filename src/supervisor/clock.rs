// src/supervisor/clock.rs

//! Pure scheduling state for the supervisor.
//!
//! No IO and no sleeping: callers pass the current instant in, which keeps
//! the restart decision testable without a runtime.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Tracks when the child last came up and when the next scheduled restart
/// is due.
#[derive(Debug, Clone, Copy)]
pub struct RestartClock {
    interval: Duration,
    last_restart: Option<Instant>,
}

impl RestartClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_restart: None,
        }
    }

    /// Instant of the most recent successful start, if any.
    pub fn last_restart(&self) -> Option<Instant> {
        self.last_restart
    }

    /// Record a successful start. Failed attempts must not call this.
    pub fn record_start(&mut self, at: Instant) {
        self.last_restart = Some(at);
    }

    /// Time since the last successful start; zero before the first one.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.last_restart
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO)
    }

    /// True once a full interval has passed since the last successful start.
    pub fn restart_due(&self, now: Instant) -> bool {
        self.last_restart.is_some() && self.elapsed(now) >= self.interval
    }

    /// Time left until the next scheduled restart, floored to whole
    /// seconds. Negative when overdue.
    pub fn remaining(&self, now: Instant) -> Remaining {
        let elapsed = self.elapsed(now);
        let secs = if elapsed <= self.interval {
            whole_secs((self.interval - elapsed).as_secs())
        } else {
            let overdue = elapsed - self.interval;
            let rounded_up = overdue.as_secs() + u64::from(overdue.subsec_nanos() > 0);
            -whole_secs(rounded_up)
        };
        Remaining { secs }
    }
}

fn whole_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Signed whole seconds until the next scheduled restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub secs: i64,
}

impl Remaining {
    pub fn hours(&self) -> i64 {
        self.secs.div_euclid(3600)
    }

    pub fn minutes(&self) -> i64 {
        self.secs.rem_euclid(3600) / 60
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours(), self.minutes())
    }
}

/// Whether a wall-clock reading (seconds since the epoch) sits exactly on a
/// status boundary.
///
/// Only exact hits count, so with a poll interval that does not divide the
/// boundary most boundaries are skipped.
pub fn is_status_boundary(epoch_secs: u64, every: Duration) -> bool {
    match every.as_secs() {
        0 => false,
        step => epoch_secs % step == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

    #[test]
    fn nothing_is_due_before_the_first_start() {
        let clock = RestartClock::new(SIX_HOURS);
        let now = Instant::now();
        assert!(!clock.restart_due(now + SIX_HOURS * 2));
        assert_eq!(clock.elapsed(now), Duration::ZERO);
        assert_eq!(clock.last_restart(), None);
    }

    #[test]
    fn due_exactly_at_the_interval() {
        let start = Instant::now();
        let mut clock = RestartClock::new(SIX_HOURS);
        clock.record_start(start);

        assert!(!clock.restart_due(start + SIX_HOURS - Duration::from_secs(1)));
        assert!(clock.restart_due(start + SIX_HOURS));
        assert!(clock.restart_due(start + SIX_HOURS + Duration::from_secs(30)));
    }

    #[test]
    fn recording_a_start_resets_the_schedule() {
        let start = Instant::now();
        let mut clock = RestartClock::new(SIX_HOURS);
        clock.record_start(start);
        let later = start + SIX_HOURS;
        clock.record_start(later);

        assert!(!clock.restart_due(later + Duration::from_secs(60)));
        assert_eq!(clock.last_restart(), Some(later));
    }

    #[test]
    fn remaining_counts_down_and_goes_negative() {
        let start = Instant::now();
        let mut clock = RestartClock::new(SIX_HOURS);
        clock.record_start(start);

        let r = clock.remaining(start + Duration::from_secs(30 * 60));
        assert_eq!((r.hours(), r.minutes()), (5, 30));
        assert_eq!(r.to_string(), "5h 30m");

        let r = clock.remaining(start + SIX_HOURS + Duration::from_secs(30));
        assert_eq!(r.secs, -30);
        assert_eq!(r.to_string(), "-1h 59m");
    }

    #[test]
    fn remaining_only_truncates_once() {
        let start = Instant::now();
        let mut clock = RestartClock::new(SIX_HOURS);
        clock.record_start(start);

        // 21539.5s left: floor to 21539, not 21600 - 60.
        let r = clock.remaining(start + Duration::from_millis(60_500));
        assert_eq!(r.secs, 21_539);
        assert_eq!(r.to_string(), "5h 58m");

        // Overdue by 0.5s floors to -1s.
        let r = clock.remaining(start + SIX_HOURS + Duration::from_millis(500));
        assert_eq!(r.secs, -1);
        assert_eq!(r.to_string(), "-1h 59m");
    }

    #[test]
    fn status_boundary_requires_exact_multiple() {
        let five_minutes = Duration::from_secs(300);
        assert!(is_status_boundary(1_700_000_100, five_minutes));
        assert!(!is_status_boundary(1_700_000_101, five_minutes));
        assert!(!is_status_boundary(1_700_000_100, Duration::from_millis(500)));
    }
}
