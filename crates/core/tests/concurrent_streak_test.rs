use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::NaiveDate;
use streak_core::db::{ActivityDao, Database, DayStatusDao};
use streak_core::{
    ActivityType, FixedClock, Settings, SettingsStore, StatusStore, StreakMode, StreakTracker,
};

const LOGGING_THREADS: usize = 4;
const LOGS_PER_THREAD: usize = 10;
const MINUTES_PER_LOG: i64 = 1;
const HISTORY_DAYS: i64 = 5;
const GOAL: i64 = 30;

struct Setup {
    tracker: Arc<StreakTracker>,
    clock: Arc<FixedClock>,
    statuses: Arc<DayStatusDao>,
}

fn setup() -> Setup {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let db = Arc::new(Database::open_in_memory().unwrap());
    let clock = Arc::new(FixedClock::at_noon(start));
    let statuses = Arc::new(DayStatusDao::new(Arc::clone(&db)));
    let settings = Arc::new(SettingsStore::in_memory(Settings {
        daily_goal_minutes: GOAL,
        streak_mode: StreakMode::Grace,
        ..Settings::default()
    }));

    let tracker = Arc::new(StreakTracker::new(
        clock.clone(),
        Arc::new(ActivityDao::new(db)),
        statuses.clone(),
        settings,
    ));

    // A run of goal-met days ending yesterday.
    for _ in 0..HISTORY_DAYS {
        tracker.log_activity(ActivityType::Running, GOAL).unwrap();
        clock.advance_days(1);
    }

    Setup {
        tracker,
        clock,
        statuses,
    }
}

#[test]
fn test_logging_while_streak_is_read() {
    let s = setup();
    let today = s.tracker.today();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let tracker = Arc::clone(&s.tracker);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut seen = Vec::new();
            while !done.load(Ordering::SeqCst) {
                let streak = tracker.calculate_streak().expect("streak read failed");
                tracker.is_streak_at_risk().expect("risk read failed");
                seen.push(streak);
            }
            seen
        })
    };

    let loggers: Vec<_> = (0..LOGGING_THREADS)
        .map(|_| {
            let tracker = Arc::clone(&s.tracker);
            thread::spawn(move || {
                for _ in 0..LOGS_PER_THREAD {
                    tracker
                        .log_activity(ActivityType::Aerobic, MINUTES_PER_LOG)
                        .expect("log failed");
                }
            })
        })
        .collect();

    for handle in loggers {
        handle.join().expect("logger panicked");
    }
    done.store(true, Ordering::SeqCst);
    let seen = reader.join().expect("reader panicked");

    // Readers only ever see the run alone or the run plus a completed today,
    // and never go backwards.
    let run = HISTORY_DAYS as u32;
    assert!(seen.iter().all(|s| *s == run || *s == run + 1));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));

    let logged = (LOGGING_THREADS * LOGS_PER_THREAD) as i64 * MINUTES_PER_LOG;
    let progress = s.tracker.today_progress().unwrap();
    assert_eq!(progress.total, logged, "Lost or duplicated minutes");

    let status = s.statuses.get(today).unwrap().unwrap();
    assert!(!status.finalized);
    assert_eq!(status.total_duration, logged);

    assert!(s.statuses.unfinalized_before(today).unwrap().is_empty());
    assert_eq!(s.tracker.calculate_streak().unwrap(), run + 1);
}

#[test]
fn test_logging_across_a_midnight_rollover() {
    let s = setup();
    let yesterday = s.tracker.today();

    // Half the logs land before midnight, then the clock moves on while
    // loggers and the rollover handler run together.
    for _ in 0..(GOAL / 2) {
        s.tracker.log_activity(ActivityType::Swimming, 1).unwrap();
    }
    s.clock.advance_days(1);
    let today = s.tracker.today();

    let rollover = {
        let tracker = Arc::clone(&s.tracker);
        thread::spawn(move || tracker.handle_day_change().expect("rollover failed"))
    };
    let loggers: Vec<_> = (0..LOGGING_THREADS)
        .map(|_| {
            let tracker = Arc::clone(&s.tracker);
            thread::spawn(move || {
                for _ in 0..LOGS_PER_THREAD {
                    tracker
                        .log_activity(ActivityType::Running, MINUTES_PER_LOG)
                        .expect("log failed");
                }
            })
        })
        .collect();

    rollover.join().expect("rollover panicked");
    for handle in loggers {
        handle.join().expect("logger panicked");
    }

    // Yesterday closed with only its own minutes; the run broke there.
    let closed = s.statuses.get(yesterday).unwrap().unwrap();
    assert!(closed.finalized);
    assert_eq!(closed.total_duration, GOAL / 2);
    assert!(!closed.completed);
    assert!(s.statuses.unfinalized_before(today).unwrap().is_empty());

    // Same answer as running the logs one after another.
    let logged = (LOGGING_THREADS * LOGS_PER_THREAD) as i64 * MINUTES_PER_LOG;
    assert_eq!(s.tracker.today_progress().unwrap().total, logged);
    assert_eq!(s.tracker.calculate_streak().unwrap(), 1);
}
