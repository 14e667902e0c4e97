//! Collaborator contracts consumed by the ledger and the streak calculator.
//!
//! The SQLite DAOs in [`crate::db`] are the shipped implementations; anything
//! else satisfying these traits can be injected instead.

use chrono::NaiveDate;

use crate::config::StreakMode;
use crate::error::Result;
use crate::models::{ActivityEntry, DayStatus, NewActivityEntry};

pub trait EntryStore: Send + Sync {
    fn insert(&self, entry: &NewActivityEntry) -> Result<ActivityEntry>;

    /// Sum of all durations logged for `date`, zero when nothing was logged.
    fn sum_duration_for_date(&self, date: NaiveDate) -> Result<i64>;

    fn earliest_date(&self) -> Result<Option<NaiveDate>>;

    /// Entries for one day ordered by timestamp.
    fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<ActivityEntry>>;

    /// Entries in `[start, end]` ordered by date then timestamp.
    fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ActivityEntry>>;

    /// Removes one entry, returning whether it existed.
    fn delete(&self, id: i64) -> Result<bool>;

    /// Removes every entry for `date`, returning how many were deleted.
    fn delete_for_date(&self, date: NaiveDate) -> Result<usize>;
}

/// Result of a status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Written,
    /// The stored row already matched.
    Unchanged,
    /// A finalized row with different content is in place and was kept.
    RejectedFinalized(DayStatus),
}

pub trait StatusStore: Send + Sync {
    fn get(&self, date: NaiveDate) -> Result<Option<DayStatus>>;

    /// Replace-by-date write. Must never overwrite a finalized row with
    /// different content, and must make that check atomically with the write.
    fn upsert(&self, status: &DayStatus) -> Result<UpsertOutcome>;

    fn earliest_date(&self) -> Result<Option<NaiveDate>>;

    fn unfinalized_before(&self, date: NaiveDate) -> Result<Vec<DayStatus>>;

    fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DayStatus>>;
}

pub trait SettingsProvider: Send + Sync {
    /// The goal as currently configured. Not validated here.
    fn current_goal_minutes(&self) -> Result<i64>;

    fn streak_mode(&self) -> Result<StreakMode> {
        Ok(StreakMode::default())
    }
}
