pub mod ledger;
pub mod listeners;
pub mod streak;
pub mod tracker;

pub use ledger::DayStatusLedger;
pub use listeners::{ListenerId, ProgressListeners};
pub use streak::StreakCalculator;
pub use tracker::StreakTracker;
