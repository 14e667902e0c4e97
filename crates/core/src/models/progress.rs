use chrono::NaiveDate;

use crate::models::{ActivityEntry, DayStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayProgress {
    pub date: NaiveDate,
    pub total: i64,
    pub goal: i64,
}

impl TodayProgress {
    pub fn is_complete(&self) -> bool {
        self.total >= self.goal
    }

    pub fn remaining(&self) -> i64 {
        (self.goal - self.total).max(0)
    }
}

/// Pushed to progress listeners whenever today's aggregate or the streak moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: TodayProgress,
    pub streak: u32,
}

/// Everything a calendar view needs for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOverview {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub entries: Vec<ActivityEntry>,
    pub statuses: Vec<DayStatus>,
}

impl MonthOverview {
    pub fn status_for(&self, date: NaiveDate) -> Option<&DayStatus> {
        self.statuses.iter().find(|s| s.date == date)
    }

    pub fn entries_for(&self, date: NaiveDate) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter().filter(move |e| e.date == date)
    }
}
