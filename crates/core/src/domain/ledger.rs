//! Day status ledger: one authoritative row per calendar day.
//!
//! Live rows (today, or a past day not yet processed) are rewritten as
//! entries arrive. Finalized rows are terminal and are never rewritten.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::models::{ActivityEntry, DayStatus, NewActivityEntry};
use crate::store::{EntryStore, SettingsProvider, StatusStore, UpsertOutcome};
use crate::utils::time::days_between;

/// One mutex per date, so work on the same day serializes while work on
/// different days proceeds independently. Entries are dropped once no
/// caller holds them.
#[derive(Default)]
struct DayLocks {
    locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl DayLocks {
    fn with_day<T>(&self, date: NaiveDate, f: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(self.locks.lock().entry(date).or_default());

        let result = {
            let _guard = lock.lock();
            f()
        };

        // Clones only happen under the map lock, so two owners here means
        // the map and us.
        let mut locks = self.locks.lock();
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&date);
        }

        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

pub struct DayStatusLedger {
    entries: Arc<dyn EntryStore>,
    statuses: Arc<dyn StatusStore>,
    settings: Arc<dyn SettingsProvider>,
    locks: DayLocks,
}

impl DayStatusLedger {
    pub fn new(
        entries: Arc<dyn EntryStore>,
        statuses: Arc<dyn StatusStore>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            entries,
            statuses,
            settings,
            locks: DayLocks::default(),
        }
    }

    /// The configured goal, rejected if it is not a positive number of minutes.
    pub fn current_goal(&self) -> Result<i64> {
        let goal = self.settings.current_goal_minutes()?;
        if goal <= 0 {
            error!(goal, "Configured daily goal is not positive");
            return Err(Error::InvalidGoal(goal));
        }
        Ok(goal)
    }

    /// Append an entry and rewrite its day's live status with the current goal.
    ///
    /// If the status cannot be written the entry is removed again, so a
    /// failed call leaves no minutes behind.
    pub fn record_activity(&self, entry: &NewActivityEntry) -> Result<(ActivityEntry, DayStatus)> {
        self.locks.with_day(entry.date, || {
            if let Some(existing) = self.statuses.get(entry.date)?
                && existing.finalized
            {
                error!(date = %entry.date, "Refusing to log activity against a finalized day");
                return Err(Error::InvariantViolation(format!(
                    "cannot log activity for {}: the day is already finalized",
                    entry.date
                )));
            }

            let goal = self.current_goal()?;
            let stored = self.entries.insert(entry)?;

            let written = self
                .entries
                .sum_duration_for_date(entry.date)
                .and_then(|total| {
                    let status = DayStatus::live(entry.date, total, goal);
                    self.write(&status)?;
                    Ok(status)
                });

            let status = match written {
                Ok(status) => status,
                Err(e) => {
                    self.discard_entry(&stored);
                    return Err(e);
                }
            };

            debug!(
                date = %status.date,
                total = status.total_duration,
                goal = status.daily_goal,
                completed = status.completed,
                "Recorded activity"
            );

            Ok((stored, status))
        })
    }

    /// Recompute a live day's row against the current goal.
    ///
    /// Returns `None` when the day has neither entries nor a row; such a day
    /// is left unmaterialized.
    pub fn refresh_live_status(&self, date: NaiveDate) -> Result<Option<DayStatus>> {
        self.locks.with_day(date, || {
            let existing = self.statuses.get(date)?;
            self.ensure_live(date, existing.as_ref())?;

            let total = self.entries.sum_duration_for_date(date)?;
            if existing.is_none() && total == 0 {
                return Ok(None);
            }

            let status = DayStatus::live(date, total, self.current_goal()?);
            self.write(&status)?;
            Ok(Some(status))
        })
    }

    /// Delete every entry for `date` and bring its live row back in line.
    ///
    /// The row is zeroed first; if the delete then fails the previous row is
    /// put back.
    pub fn clear_day(&self, date: NaiveDate) -> Result<usize> {
        self.locks.with_day(date, || {
            let existing = self.statuses.get(date)?;
            self.ensure_live(date, existing.as_ref())?;

            if existing.is_some() {
                self.write(&DayStatus::live(date, 0, self.current_goal()?))?;
            }

            let deleted = match self.entries.delete_for_date(date) {
                Ok(deleted) => deleted,
                Err(e) => {
                    if let Some(previous) = existing {
                        self.restore_status(&previous);
                    }
                    return Err(e);
                }
            };

            info!(%date, deleted, "Cleared day");
            Ok(deleted)
        })
    }

    /// Close out every day before `today` that is missing a row or still live.
    ///
    /// Walks forward one day at a time from the earliest date known to either
    /// store, so any number of skipped days is filled in. Safe to run
    /// repeatedly and from several callers; returns how many rows it closed.
    pub fn finalize_past_days(&self, today: NaiveDate) -> Result<usize> {
        let start = match (self.entries.earliest_date()?, self.statuses.earliest_date()?) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return Ok(0),
        };

        if start >= today {
            return Ok(0);
        }

        let already_closed: HashSet<NaiveDate> = self
            .statuses
            .in_range(start, today)?
            .into_iter()
            .filter(|s| s.finalized && s.date < today)
            .map(|s| s.date)
            .collect();

        let mut fallback_goal = None;
        let mut closed = 0;

        for date in days_between(start, today) {
            if already_closed.contains(&date) {
                continue;
            }
            if self.finalize_day(date, &mut fallback_goal)? {
                closed += 1;
            }
        }

        if closed > 0 {
            info!(from = %start, until = %today, closed, "Finalized past days");
        }

        Ok(closed)
    }

    /// Sum of the minutes logged for `date`, read consistently with the
    /// day's writers.
    pub fn live_total(&self, date: NaiveDate) -> Result<i64> {
        self.locks
            .with_day(date, || self.entries.sum_duration_for_date(date))
    }

    pub fn get_status(&self, date: NaiveDate) -> Result<Option<DayStatus>> {
        self.locks.with_day(date, || self.statuses.get(date))
    }

    /// Replace the row for `status.date`. Rewriting a finalized row with
    /// different content is an invariant violation.
    pub fn upsert(&self, status: &DayStatus) -> Result<()> {
        self.locks.with_day(status.date, || self.write(status))
    }

    pub fn statuses_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DayStatus>> {
        self.statuses.in_range(start, end)
    }

    pub fn unfinalized_before(&self, date: NaiveDate) -> Result<Vec<DayStatus>> {
        self.statuses.unfinalized_before(date)
    }

    fn finalize_day(&self, date: NaiveDate, fallback_goal: &mut Option<i64>) -> Result<bool> {
        self.locks.with_day(date, || {
            let existing = self.statuses.get(date)?;
            if existing.is_some_and(|s| s.finalized) {
                return Ok(false);
            }

            let total = self.entries.sum_duration_for_date(date)?;
            let goal = match existing {
                Some(live) => live.daily_goal,
                None => match *fallback_goal {
                    Some(goal) => goal,
                    None => {
                        let goal = self.current_goal()?;
                        *fallback_goal = Some(goal);
                        goal
                    }
                },
            };

            let status = DayStatus::closed(date, total, goal);
            match self.statuses.upsert(&status)? {
                UpsertOutcome::Written | UpsertOutcome::Unchanged => Ok(true),
                UpsertOutcome::RejectedFinalized(_) => {
                    debug!(%date, "Day was finalized by another writer");
                    Ok(false)
                }
            }
        })
    }

    fn ensure_live(&self, date: NaiveDate, existing: Option<&DayStatus>) -> Result<()> {
        if existing.is_some_and(|s| s.finalized) {
            error!(%date, "Attempted to modify a finalized day");
            return Err(Error::InvariantViolation(format!(
                "day {} is finalized and cannot change",
                date
            )));
        }
        Ok(())
    }

    fn discard_entry(&self, entry: &ActivityEntry) {
        match self.entries.delete(entry.id) {
            Ok(_) => warn!(
                id = entry.id,
                date = %entry.date,
                "Removed activity after its day status could not be written"
            ),
            Err(e) => error!(
                id = entry.id,
                date = %entry.date,
                error = %e,
                "Could not remove activity after a failed status write"
            ),
        }
    }

    fn restore_status(&self, previous: &DayStatus) {
        if let Err(e) = self.statuses.upsert(previous) {
            error!(
                date = %previous.date,
                error = %e,
                "Could not restore day status after a failed clear"
            );
        }
    }

    fn write(&self, status: &DayStatus) -> Result<()> {
        match self.statuses.upsert(status)? {
            UpsertOutcome::Written | UpsertOutcome::Unchanged => Ok(()),
            UpsertOutcome::RejectedFinalized(current) => {
                error!(
                    date = %current.date,
                    "Rejected overwrite of a finalized day status"
                );
                Err(Error::InvariantViolation(format!(
                    "day {} is finalized and cannot be overwritten",
                    current.date
                )))
            }
        }
    }
}
