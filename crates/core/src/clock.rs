//! Source of "now" for every day boundary in the crate.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Used to drive day rollovers in tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock pinned to noon of `date`.
    pub fn at_noon(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let clock = FixedClock::at_noon(start);
        assert_eq!(clock.today(), start);

        clock.advance_days(1);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        clock.advance(Duration::hours(12));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
