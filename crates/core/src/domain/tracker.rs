//! Caller-facing API: the UI and the reminder scheduler talk to this.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::config::ReminderTime;
use crate::db::{ActivityDao, Database, DayStatusDao};
use crate::domain::ledger::DayStatusLedger;
use crate::domain::listeners::{ListenerId, ProgressListeners};
use crate::domain::streak::StreakCalculator;
use crate::error::Result;
use crate::models::{
    ActivityEntry, ActivityType, DayStatus, MonthOverview, NewActivityEntry, ProgressUpdate,
    TodayProgress,
};
use crate::scheduler::DayRolloverTimer;
use crate::store::{EntryStore, SettingsProvider, StatusStore};
use crate::utils::time::{month_bounds, next_occurrence};

pub const STORAGE_DB_FILENAME: &str = "storage.db";

pub struct StreakTracker {
    clock: Arc<dyn Clock>,
    entries: Arc<dyn EntryStore>,
    ledger: Arc<DayStatusLedger>,
    streak: StreakCalculator,
    listeners: ProgressListeners,
}

impl StreakTracker {
    pub fn new(
        clock: Arc<dyn Clock>,
        entries: Arc<dyn EntryStore>,
        statuses: Arc<dyn StatusStore>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        let ledger = Arc::new(DayStatusLedger::new(
            Arc::clone(&entries),
            statuses,
            Arc::clone(&settings),
        ));
        let streak = StreakCalculator::new(Arc::clone(&ledger), settings);

        Self {
            clock,
            entries,
            ledger,
            streak,
            listeners: ProgressListeners::default(),
        }
    }

    /// Open the SQLite store under `data_dir` and wire it up.
    pub fn open<P: AsRef<Path>>(
        data_dir: P,
        clock: Arc<dyn Clock>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Result<Self> {
        let db = Arc::new(Database::open(data_dir.as_ref().join(STORAGE_DB_FILENAME))?);

        Ok(Self::new(
            clock,
            Arc::new(ActivityDao::new(Arc::clone(&db))),
            Arc::new(DayStatusDao::new(db)),
            settings,
        ))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn ledger(&self) -> &DayStatusLedger {
        &self.ledger
    }

    /// Log a session against today.
    pub fn log_activity(&self, activity_type: ActivityType, minutes: i64) -> Result<ActivityEntry> {
        let entry = NewActivityEntry::new(activity_type, minutes, self.clock.now())?;
        let (stored, status) = self.ledger.record_activity(&entry)?;

        info!(
            date = %status.date,
            activity = %activity_type,
            minutes,
            total = status.total_duration,
            goal = status.daily_goal,
            "Logged activity"
        );

        self.publish(status.date);
        Ok(stored)
    }

    pub fn calculate_streak(&self) -> Result<u32> {
        self.streak.calculate_streak(self.today())
    }

    pub fn is_streak_at_risk(&self) -> Result<bool> {
        self.streak.is_streak_at_risk(self.today())
    }

    pub fn finalize_past_days(&self) -> Result<usize> {
        self.ledger.finalize_past_days(self.today())
    }

    pub fn today_progress(&self) -> Result<TodayProgress> {
        self.streak.today_progress(self.today())
    }

    pub fn today_activities(&self) -> Result<Vec<ActivityEntry>> {
        self.entries.entries_for_date(self.today())
    }

    pub fn month_overview(&self, year: i32, month: u32) -> Result<MonthOverview> {
        let (start, end) = month_bounds(year, month)?;

        Ok(MonthOverview {
            start,
            end,
            entries: self.entries.entries_in_range(start, end)?,
            statuses: self.ledger.statuses_in_range(start, end)?,
        })
    }

    /// Delete everything logged today.
    pub fn clear_today(&self) -> Result<usize> {
        let today = self.today();
        let deleted = self.ledger.clear_day(today)?;
        self.publish(today);
        Ok(deleted)
    }

    /// Re-snapshot today's row after the goal setting changed.
    pub fn refresh_today(&self) -> Result<Option<DayStatus>> {
        let today = self.today();
        let status = self.ledger.refresh_live_status(today)?;
        self.publish(today);
        Ok(status)
    }

    /// Close out the days that ended and recompute the streak.
    pub fn handle_day_change(&self) -> Result<u32> {
        let today = self.today();
        let closed = self.ledger.finalize_past_days(today)?;
        let streak = self.streak.calculate_streak(today)?;

        info!(%today, closed, streak, "Handled day change");

        self.publish(today);
        Ok(streak)
    }

    /// Whether a reminder should go out now.
    pub fn should_remind(&self) -> Result<bool> {
        self.is_streak_at_risk()
    }

    /// Next time a reminder at `reminder` should fire.
    pub fn next_reminder_at(&self, reminder: ReminderTime) -> Result<NaiveDateTime> {
        Ok(next_occurrence(self.clock.now(), reminder.as_time()?))
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ProgressUpdate) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Start a timer that runs [`StreakTracker::handle_day_change`] at every
    /// local midnight. The timer holds only a weak reference to the tracker.
    pub fn spawn_rollover_timer(self: &Arc<Self>) -> Result<DayRolloverTimer> {
        let tracker = Arc::downgrade(self);

        DayRolloverTimer::start(Arc::clone(&self.clock), move |_| {
            if let Some(tracker) = tracker.upgrade()
                && let Err(e) = tracker.handle_day_change()
            {
                error!(error = %e, "Failed to handle day change");
            }
        })
    }

    fn publish(&self, today: NaiveDate) {
        if self.listeners.is_empty() {
            return;
        }

        let update = self.streak.today_progress(today).and_then(|progress| {
            let streak = self.streak.calculate_streak(today)?;
            Ok(ProgressUpdate { progress, streak })
        });

        match update {
            Ok(update) => self.listeners.notify(&update),
            Err(e) => warn!(error = %e, "Could not compute progress update for listeners"),
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{Settings, SettingsStore};
    use crate::error::Error;

    struct Fixture {
        tracker: Arc<StreakTracker>,
        clock: Arc<FixedClock>,
        settings: Arc<SettingsStore>,
    }

    fn setup() -> Fixture {
        let clock = Arc::new(FixedClock::at_noon(
            NaiveDate::from_ymd_opt(2024, 9, 10).unwrap(),
        ));
        let settings = Arc::new(SettingsStore::in_memory(Settings::default()));
        let db = Arc::new(Database::open_in_memory().unwrap());

        let tracker = Arc::new(StreakTracker::new(
            clock.clone(),
            Arc::new(ActivityDao::new(Arc::clone(&db))),
            Arc::new(DayStatusDao::new(db)),
            settings.clone(),
        ));

        Fixture {
            tracker,
            clock,
            settings,
        }
    }

    #[test]
    fn test_log_activity_updates_progress() {
        let f = setup();

        f.tracker.log_activity(ActivityType::Running, 20).unwrap();
        f.tracker.log_activity(ActivityType::Aerobic, 15).unwrap();

        let progress = f.tracker.today_progress().unwrap();
        assert_eq!(progress.total, 35);
        assert_eq!(progress.goal, 30);
        assert!(progress.is_complete());
        assert_eq!(progress.remaining(), 0);
        assert_eq!(f.tracker.today_activities().unwrap().len(), 2);
        assert_eq!(f.tracker.calculate_streak().unwrap(), 1);
    }

    #[test]
    fn test_log_activity_rejects_bad_duration() {
        let f = setup();
        let result = f.tracker.log_activity(ActivityType::Swimming, 0);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_streak_carries_across_days() {
        let f = setup();

        for _ in 0..3 {
            f.tracker.log_activity(ActivityType::Running, 30).unwrap();
            f.clock.advance_days(1);
        }

        assert_eq!(f.tracker.calculate_streak().unwrap(), 3);
        assert!(f.tracker.should_remind().unwrap());

        f.tracker.log_activity(ActivityType::Running, 30).unwrap();
        assert_eq!(f.tracker.calculate_streak().unwrap(), 4);
        assert!(!f.tracker.should_remind().unwrap());
    }

    #[test]
    fn test_refresh_today_after_goal_change() {
        let f = setup();
        f.tracker.log_activity(ActivityType::Running, 40).unwrap();

        f.settings.set_daily_goal(60).unwrap();
        let status = f.tracker.refresh_today().unwrap().unwrap();
        assert_eq!(status.daily_goal, 60);
        assert!(!status.completed);
    }

    #[test]
    fn test_clear_today() {
        let f = setup();
        f.tracker.log_activity(ActivityType::Running, 40).unwrap();

        assert_eq!(f.tracker.clear_today().unwrap(), 1);
        let progress = f.tracker.today_progress().unwrap();
        assert_eq!(progress.total, 0);
        assert_eq!(progress.remaining(), 30);
        assert_eq!(f.tracker.calculate_streak().unwrap(), 0);
    }

    #[test]
    fn test_month_overview() {
        let f = setup();
        f.tracker.log_activity(ActivityType::Running, 40).unwrap();
        f.clock.advance_days(25);
        f.tracker.finalize_past_days().unwrap();

        let september = f.tracker.month_overview(2024, 9).unwrap();
        assert_eq!(september.entries.len(), 1);
        // Sep 10 through Sep 30
        assert_eq!(september.statuses.len(), 21);
        let tenth = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        assert!(september.status_for(tenth).unwrap().completed);
        assert_eq!(september.entries_for(tenth).count(), 1);

        let october = f.tracker.month_overview(2024, 10).unwrap();
        assert_eq!(october.statuses.len(), 4);
        assert!(october.entries.is_empty());
    }

    #[test]
    fn test_listeners_see_live_progress() {
        let f = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = f.tracker.subscribe(move |update| sink.lock().push(*update));

        f.tracker.log_activity(ActivityType::Running, 10).unwrap();
        f.tracker.log_activity(ActivityType::Running, 25).unwrap();

        {
            let seen = seen.lock();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].progress.total, 10);
            assert_eq!(seen[0].streak, 0);
            assert_eq!(seen[1].progress.total, 35);
            assert_eq!(seen[1].streak, 1);
        }

        assert!(f.tracker.unsubscribe(id));
        f.tracker.log_activity(ActivityType::Running, 5).unwrap();
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_handle_day_change_finalizes_yesterday() {
        let f = setup();
        f.tracker.log_activity(ActivityType::Running, 40).unwrap();
        let logged_on = f.tracker.today();

        f.clock.advance_days(1);
        assert_eq!(f.tracker.handle_day_change().unwrap(), 1);

        let status = f.tracker.ledger().get_status(logged_on).unwrap().unwrap();
        assert!(status.finalized);
        assert!(status.completed);
    }

    #[test]
    fn test_rollover_timer_notifies_listeners() {
        let f = setup();
        f.tracker.log_activity(ActivityType::Running, 40).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        f.tracker.subscribe(move |update| {
            tx.lock().send(*update).ok();
        });

        let timer = f.tracker.spawn_rollover_timer().unwrap();
        f.clock.advance_days(1);
        timer.wake();

        let update = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(update.progress.date, f.tracker.today());
        assert_eq!(update.progress.total, 0);
        assert_eq!(update.streak, 1);
    }

    #[test]
    fn test_next_reminder_at() {
        let f = setup();
        let reminder = ReminderTime::new(20, 0).unwrap();

        let next = f.tracker.next_reminder_at(reminder).unwrap();
        assert_eq!(next, f.tracker.today().and_hms_opt(20, 0, 0).unwrap());

        let morning = ReminderTime::new(7, 30).unwrap();
        let next = f.tracker.next_reminder_at(morning).unwrap();
        let tomorrow = f.tracker.today().succ_opt().unwrap();
        assert_eq!(next, tomorrow.and_hms_opt(7, 30, 0).unwrap());
    }
}
