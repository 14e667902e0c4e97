pub mod activities;
pub mod day_status;

pub use activities::ActivityDao;
pub use day_status::DayStatusDao;
