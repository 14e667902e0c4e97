pub mod activity;
pub mod day_status;
pub mod progress;

pub use activity::{ActivityEntry, ActivityType, NewActivityEntry};
pub use day_status::{DayState, DayStatus};
pub use progress::{MonthOverview, ProgressUpdate, TodayProgress};
