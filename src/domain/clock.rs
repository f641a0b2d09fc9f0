#[cfg(test)]
use std::sync::Mutex;

use time::{OffsetDateTime, Time, UtcOffset};

use super::day::Day;

/// Source of "now" for everything that depends on the calendar.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Day {
        Day::from_date(self.now().date())
    }

    fn yesterday(&self) -> Day {
        self.today().previous()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn with_offset_hours(hours: i8) -> Self {
        let offset = UtcOffset::from_hms(hours, 0, 0).unwrap_or(UtcOffset::UTC);
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock pinned to a settable instant.
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// The next local midnight. Yesterday's record can be submitted until then.
pub fn next_midnight(clock: &dyn Clock) -> Option<OffsetDateTime> {
    let now = clock.now();
    let tomorrow = now.date().next_day()?;
    Some(tomorrow.with_time(Time::MIDNIGHT).assume_offset(now.offset()))
}

/// Whole seconds from now until `deadline`, never negative.
pub fn seconds_until(clock: &dyn Clock, deadline: OffsetDateTime) -> i64 {
    (deadline - clock.now()).whole_seconds().max(0)
}
