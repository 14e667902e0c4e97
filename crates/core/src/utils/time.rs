use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// Slack added past midnight so a wake-up lands safely inside the new day.
pub const MIDNIGHT_SLACK: std::time::Duration = std::time::Duration::from_millis(100);

/// Get the start of day (00:00:00) for a given timestamp
pub fn start_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_hms_opt(0, 0, 0).unwrap_or(dt)
}

/// Get the start of the following day
pub fn start_of_next_day(dt: NaiveDateTime) -> NaiveDateTime {
    start_of_day(dt) + Duration::days(1)
}

/// Time left until the next local midnight, plus [`MIDNIGHT_SLACK`].
pub fn until_next_midnight(now: NaiveDateTime) -> std::time::Duration {
    let remaining = (start_of_next_day(now) - now)
        .to_std()
        .unwrap_or(std::time::Duration::ZERO);

    remaining + MIDNIGHT_SLACK
}

/// Every date in `[start, end)`, one day at a time.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d < end)
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidInput(format!("Invalid month: {}-{:02}", year, month)))?;

    let next_month = if start.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    let end = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| Error::InvalidInput(format!("Month out of range: {}-{:02}", year, month)))?;

    Ok((start, end))
}

/// The next moment at or after `now` whose wall time is `at`.
/// If today's occurrence has already passed, tomorrow's is returned.
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if now > today {
        today + Duration::days(1)
    } else {
        today
    }
}
