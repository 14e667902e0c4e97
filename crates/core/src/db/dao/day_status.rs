use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::Database;
use crate::error::Result;
use crate::models::DayStatus;
use crate::store::{StatusStore, UpsertOutcome};

const STATUS_COLUMNS: &str = "date, total_duration, daily_goal, completed, finalized";

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<DayStatus> {
    Ok(DayStatus {
        date: row.get(0)?,
        total_duration: row.get(1)?,
        daily_goal: row.get(2)?,
        completed: row.get(3)?,
        finalized: row.get(4)?,
    })
}

fn select_status(conn: &Connection, date: NaiveDate) -> Result<Option<DayStatus>> {
    let status = conn
        .query_row(
            &format!("SELECT {STATUS_COLUMNS} FROM day_status WHERE date = ?1"),
            params![date],
            status_from_row,
        )
        .optional()?;

    Ok(status)
}

#[derive(Clone)]
pub struct DayStatusDao {
    db: Arc<Database>,
}

impl DayStatusDao {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl StatusStore for DayStatusDao {
    fn get(&self, date: NaiveDate) -> Result<Option<DayStatus>> {
        self.db.with_connection(|conn| select_status(conn, date))
    }

    fn upsert(&self, status: &DayStatus) -> Result<UpsertOutcome> {
        self.db.transaction(|tx| {
            match select_status(tx, status.date)? {
                Some(current) if current == *status => return Ok(UpsertOutcome::Unchanged),
                Some(current) if current.finalized => {
                    return Ok(UpsertOutcome::RejectedFinalized(current));
                }
                _ => {}
            }

            tx.execute(
                r#"
                INSERT INTO day_status (date, total_duration, daily_goal, completed, finalized)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(date) DO UPDATE SET
                    total_duration = excluded.total_duration,
                    daily_goal = excluded.daily_goal,
                    completed = excluded.completed,
                    finalized = excluded.finalized
                "#,
                params![
                    status.date,
                    status.total_duration,
                    status.daily_goal,
                    status.completed,
                    status.finalized,
                ],
            )?;

            Ok(UpsertOutcome::Written)
        })
    }

    fn earliest_date(&self) -> Result<Option<NaiveDate>> {
        self.db.with_connection(|conn| {
            let earliest = conn.query_row("SELECT MIN(date) FROM day_status", [], |row| {
                row.get::<_, Option<NaiveDate>>(0)
            })?;

            Ok(earliest)
        })
    }

    fn unfinalized_before(&self, date: NaiveDate) -> Result<Vec<DayStatus>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STATUS_COLUMNS} FROM day_status
                 WHERE finalized = 0 AND date < ?1
                 ORDER BY date ASC"
            ))?;

            let statuses = stmt
                .query_map(params![date], status_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(statuses)
        })
    }

    fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DayStatus>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STATUS_COLUMNS} FROM day_status
                 WHERE date BETWEEN ?1 AND ?2
                 ORDER BY date ASC"
            ))?;

            let statuses = stmt
                .query_map(params![start, end], status_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(statuses)
        })
    }
}
