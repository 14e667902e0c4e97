use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error};

use crate::config::StreakMode;
use crate::domain::ledger::DayStatusLedger;
use crate::error::{Error, Result};
use crate::models::TodayProgress;
use crate::store::SettingsProvider;

/// Derives the current streak from today's live total and the finalized ledger.
pub struct StreakCalculator {
    ledger: Arc<DayStatusLedger>,
    settings: Arc<dyn SettingsProvider>,
}

impl StreakCalculator {
    pub fn new(ledger: Arc<DayStatusLedger>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self { ledger, settings }
    }

    /// Today's live total against the current goal. Sums the entries rather
    /// than reading today's stored row, which may carry an older goal.
    pub fn today_progress(&self, today: NaiveDate) -> Result<TodayProgress> {
        let goal = self.ledger.current_goal()?;
        let total = self.ledger.live_total(today)?;

        Ok(TodayProgress {
            date: today,
            total,
            goal,
        })
    }

    /// Number of consecutive goal-met days ending today (or yesterday, in
    /// grace mode, while today is still open).
    pub fn calculate_streak(&self, today: NaiveDate) -> Result<u32> {
        self.ledger.finalize_past_days(today)?;

        let today_complete = self.today_progress(today)?.is_complete();
        if !today_complete && self.settings.streak_mode()? == StreakMode::Strict {
            return Ok(0);
        }

        let mut streak = u32::from(today_complete);
        let mut date = today;

        while let Some(previous) = date.pred_opt() {
            date = previous;

            match self.ledger.get_status(date)? {
                Some(status) if !status.finalized => {
                    error!(%date, "Found a live row behind today after finalization");
                    return Err(Error::InvariantViolation(format!(
                        "day {} is still live after finalization",
                        date
                    )));
                }
                Some(status) if status.completed => streak += 1,
                _ => break,
            }
        }

        debug!(%today, streak, today_complete, "Calculated streak");
        Ok(streak)
    }

    pub fn is_streak_at_risk(&self, today: NaiveDate) -> Result<bool> {
        Ok(!self.today_progress(today)?.is_complete())
    }
}
