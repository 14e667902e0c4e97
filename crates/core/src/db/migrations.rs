use rusqlite::Connection;
use tracing::debug;

use crate::{Error, Result};

const SCHEMA_VERSION: i32 = 3;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    ensure_migration_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(Error::Internal(format!(
            "Database schema version ({}) is newer than supported version ({}). Please update \
             the application.",
            current_version, SCHEMA_VERSION
        )));
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        apply_migration(conn, version).map_err(|e| {
            Error::Internal(format!("Failed to apply migration {}: {}", version, e))
        })?;
        debug!(version, "Applied schema migration");
    }

    Ok(())
}

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migration (
            id INTEGER PRIMARY KEY
        )",
        [],
    )?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let version = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM migration", [], |row| {
        row.get(0)
    })?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO migration (id) VALUES (?1)", [version])?;
    Ok(())
}

fn apply_migration(conn: &mut Connection, version: i32) -> Result<()> {
    let tx = conn.transaction()?;

    match version {
        1 => migration_v1(&tx)?,
        2 => migration_v2(&tx)?,
        3 => migration_v3(&tx)?,
        _ => {
            return Err(Error::Internal(format!(
                "Unknown migration version: {}",
                version
            )));
        }
    }

    set_schema_version(&tx, version)?;
    tx.commit()?;

    Ok(())
}

fn migration_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE activities(
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            date TEXT NOT NULL,
            activity_type TEXT NOT NULL CHECK(activity_type IN (
                'RUNNING', 'AEROBIC', 'SWIMMING'
            )),
            duration INTEGER NOT NULL CHECK(duration > 0),
            timestamp TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn migration_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE day_status(
            date TEXT PRIMARY KEY NOT NULL,
            total_duration INTEGER NOT NULL,
            daily_goal INTEGER NOT NULL,
            completed INTEGER NOT NULL,
            finalized INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn migration_v3(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_activities_date_timestamp
            ON activities(date, timestamp);

        CREATE INDEX IF NOT EXISTS idx_day_status_unfinalized
            ON day_status(date) WHERE finalized = 0;
        "#,
    )?;
    Ok(())
}
