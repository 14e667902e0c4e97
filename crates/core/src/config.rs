//! TOML-backed user settings.
//!
//! Stores the daily goal, the reminder time and the streak mode. The file
//! lives next to the database as `settings.toml`; a missing file yields the
//! defaults and is written on first save.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::SettingsProvider;

pub const SETTINGS_FILENAME: &str = "settings.toml";
pub const DEFAULT_DAILY_GOAL: i64 = 30;
pub const GOAL_OPTIONS: [i64; 5] = [15, 30, 60, 90, 120];

/// How an unfinished "today" affects the streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMode {
    /// Today adds one once complete, and never breaks the run ending yesterday.
    #[default]
    Grace,
    /// The streak is zero until today's goal is met.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTime {
    #[serde(default = "default_reminder_hour")]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        let time = Self { hour, minute };
        time.as_time()?;
        Ok(time)
    }

    pub fn as_time(&self) -> Result<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Invalid reminder time {:02}:{:02}",
                self.hour, self.minute
            ))
        })
    }
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self {
            hour: default_reminder_hour(),
            minute: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_daily_goal")]
    pub daily_goal_minutes: i64,
    #[serde(default)]
    pub streak_mode: StreakMode,
    #[serde(default)]
    pub reminder: ReminderTime,
}

fn default_daily_goal() -> i64 {
    DEFAULT_DAILY_GOAL
}
fn default_reminder_hour() -> u32 {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal_minutes: DEFAULT_DAILY_GOAL,
            streak_mode: StreakMode::default(),
            reminder: ReminderTime::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Settings cached in memory and persisted on every change.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Load from disk, or start from defaults when the file does not exist yet.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let settings = match std::fs::read_to_string(&path) {
            Ok(content) => Settings::from_toml(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file, using defaults");
                Settings::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            current: RwLock::new(settings),
        })
    }

    /// Settings that never touch the filesystem.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            current: RwLock::new(settings),
        }
    }

    pub fn get(&self) -> Settings {
        self.current.read().clone()
    }

    pub fn set_daily_goal(&self, minutes: i64) -> Result<()> {
        if minutes <= 0 {
            return Err(Error::InvalidGoal(minutes));
        }
        self.update(|s| s.daily_goal_minutes = minutes)
    }

    pub fn set_reminder(&self, reminder: ReminderTime) -> Result<()> {
        reminder.as_time()?;
        self.update(|s| s.reminder = reminder)
    }

    pub fn set_streak_mode(&self, mode: StreakMode) -> Result<()> {
        self.update(|s| s.streak_mode = mode)
    }

    fn update<F: FnOnce(&mut Settings)>(&self, f: F) -> Result<()> {
        let mut current = self.current.write();
        let mut next = current.clone();
        f(&mut next);

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, next.to_toml()?)?;
            debug!(path = %path.display(), "Saved settings");
        }

        *current = next;
        Ok(())
    }
}

impl SettingsProvider for SettingsStore {
    fn current_goal_minutes(&self) -> Result<i64> {
        Ok(self.current.read().daily_goal_minutes)
    }

    fn streak_mode(&self) -> Result<StreakMode> {
        Ok(self.current.read().streak_mode)
    }
}
