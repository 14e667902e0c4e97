use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Running,
    Aerobic,
    Swimming,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [Self::Running, Self::Aerobic, Self::Swimming];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Aerobic => "AEROBIC",
            Self::Swimming => "SWIMMING",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "AEROBIC" => Ok(Self::Aerobic),
            "SWIMMING" => Ok(Self::Swimming),
            other => Err(Error::InvalidInput(format!("unknown activity type: {other}"))),
        }
    }
}

/// A logged exercise session as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub activity_type: ActivityType,
    pub duration: i64,
    pub timestamp: NaiveDateTime,
}

/// An entry that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivityEntry {
    pub date: NaiveDate,
    pub activity_type: ActivityType,
    pub duration: i64,
    pub timestamp: NaiveDateTime,
}

impl NewActivityEntry {
    pub fn new(activity_type: ActivityType, duration: i64, timestamp: NaiveDateTime) -> Result<Self> {
        if duration <= 0 {
            return Err(Error::InvalidInput(format!(
                "Duration must be a positive number of minutes, got {}",
                duration
            )));
        }

        Ok(Self {
            date: timestamp.date(),
            activity_type,
            duration,
            timestamp,
        })
    }

    pub fn with_id(self, id: i64) -> ActivityEntry {
        ActivityEntry {
            id,
            date: self.date,
            activity_type: self.activity_type,
            duration: self.duration,
            timestamp: self.timestamp,
        }
    }
}
