//! Injectable time source.
//!
//! The engine never reads the system clock directly: all time comes from
//! a [`Clock`] supplied at construction. The clock owns the host's time
//! zone and reports "now" with that zone's UTC offset already applied, so
//! calendar bucketing and UTC bookkeeping both derive from one reading.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Source of the current instant in the host-configured time zone.
pub trait Clock {
    /// Current instant with the zone's UTC offset applied.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current instant in UTC, derived from [`Clock::now`].
    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock in the system's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock pinned to one instant, advanced manually.
///
/// Clones share the same instant, so a test can keep a handle and move
/// time forward after handing a clone to the engine.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Rc<Cell<DateTime<FixedOffset>>>,
}

impl FixedClock {
    pub fn at(instant: DateTime<FixedOffset>) -> Self {
        Self {
            instant: Rc::new(Cell::new(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<FixedOffset>) {
        self.instant.set(instant);
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.instant.set(self.instant.get() + delta);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fixed_clock_clones_share_the_instant() {
        let start: DateTime<FixedOffset> = "2022-07-16T08:30:00-07:00".parse().unwrap();
        let clock = FixedClock::at(start);
        let handle = clock.clone();

        handle.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
    }

    #[test]
    fn now_utc_strips_the_offset() {
        let local: DateTime<FixedOffset> = "2023-01-01T01:00:00-07:00".parse().unwrap();
        let clock = FixedClock::at(local);
        assert_eq!(
            clock.now_utc(),
            "2023-01-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}
