use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Row, ToSql, params};

use crate::db::Database;
use crate::error::Result;
use crate::models::{ActivityEntry, ActivityType, NewActivityEntry};
use crate::store::EntryStore;

const ENTRY_COLUMNS: &str = "id, date, activity_type, duration, timestamp";

impl ToSql for ActivityType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ActivityType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<ActivityType>()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
    Ok(ActivityEntry {
        id: row.get(0)?,
        date: row.get(1)?,
        activity_type: row.get(2)?,
        duration: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

#[derive(Clone)]
pub struct ActivityDao {
    db: Arc<Database>,
}

impl ActivityDao {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl EntryStore for ActivityDao {
    fn insert(&self, entry: &NewActivityEntry) -> Result<ActivityEntry> {
        self.db.with_connection(|conn| {
            conn.execute(
                r#"
                INSERT INTO activities (date, activity_type, duration, timestamp)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![entry.date, entry.activity_type, entry.duration, entry.timestamp],
            )?;

            Ok(entry.clone().with_id(conn.last_insert_rowid()))
        })
    }

    fn sum_duration_for_date(&self, date: NaiveDate) -> Result<i64> {
        self.db.with_connection(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COALESCE(SUM(duration), 0) FROM activities WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )?;

            Ok(total)
        })
    }

    fn earliest_date(&self) -> Result<Option<NaiveDate>> {
        self.db.with_connection(|conn| {
            let earliest = conn.query_row("SELECT MIN(date) FROM activities", [], |row| {
                row.get::<_, Option<NaiveDate>>(0)
            })?;

            Ok(earliest)
        })
    }

    fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<ActivityEntry>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM activities
                 WHERE date = ?1
                 ORDER BY timestamp ASC, id ASC"
            ))?;

            let entries = stmt
                .query_map(params![date], entry_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(entries)
        })
    }

    fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ActivityEntry>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM activities
                 WHERE date BETWEEN ?1 AND ?2
                 ORDER BY date ASC, timestamp ASC, id ASC"
            ))?;

            let entries = stmt
                .query_map(params![start, end], entry_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(entries)
        })
    }

    fn delete(&self, id: i64) -> Result<bool> {
        self.db.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM activities WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }

    fn delete_for_date(&self, date: NaiveDate) -> Result<usize> {
        self.db.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM activities WHERE date = ?1", params![date])?;
            Ok(deleted)
        })
    }
}
