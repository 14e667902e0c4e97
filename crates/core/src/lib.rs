//! Daily activity logging with per-day goal snapshots and streak tracking.

pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ReminderTime, Settings, SettingsStore, StreakMode};
pub use domain::{DayStatusLedger, StreakCalculator, StreakTracker};
pub use error::{Error, Result};
pub use models::{
    ActivityEntry, ActivityType, DayState, DayStatus, MonthOverview, NewActivityEntry,
    ProgressUpdate, TodayProgress,
};
pub use scheduler::DayRolloverTimer;
pub use store::{EntryStore, SettingsProvider, StatusStore, UpsertOutcome};
