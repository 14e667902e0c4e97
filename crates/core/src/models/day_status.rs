use chrono::NaiveDate;

/// Goal attainment for one calendar day.
///
/// `daily_goal` is a snapshot of the goal at the time the row was last
/// written, so later goal changes never reach back into history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStatus {
    pub date: NaiveDate,
    pub total_duration: i64,
    pub daily_goal: i64,
    pub completed: bool,
    pub finalized: bool,
}

impl DayStatus {
    /// Status for a day that can still receive entries.
    pub fn live(date: NaiveDate, total_duration: i64, daily_goal: i64) -> Self {
        Self {
            date,
            total_duration,
            daily_goal,
            completed: total_duration >= daily_goal,
            finalized: false,
        }
    }

    /// Closed-out status for a past day.
    pub fn closed(date: NaiveDate, total_duration: i64, daily_goal: i64) -> Self {
        Self {
            finalized: true,
            ..Self::live(date, total_duration, daily_goal)
        }
    }
}

/// Where a single day sits in its lifecycle. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Unstarted,
    LivePartial,
    LiveComplete,
    FinalizedComplete,
    FinalizedIncomplete,
}

impl DayState {
    pub fn of(status: Option<&DayStatus>) -> Self {
        match status {
            None => Self::Unstarted,
            Some(s) if s.finalized && s.completed => Self::FinalizedComplete,
            Some(s) if s.finalized => Self::FinalizedIncomplete,
            Some(s) if s.completed => Self::LiveComplete,
            Some(_) => Self::LivePartial,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalizedComplete | Self::FinalizedIncomplete)
    }
}
