use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection as SqliteConnection};
use tokio_rusqlite::Connection;

use crate::error::Result;

use super::schema::{MIGRATIONS, SCHEMA};

/// Handle to the dashboard database. Cheap to clone; all clones share one
/// background connection.
#[derive(Clone)]
pub struct Repository {
    pub(super) conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            run_migrations(conn);
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

fn run_migrations(conn: &SqliteConnection) {
    for migration in MIGRATIONS {
        if let Err(e) = conn.execute_batch(migration) {
            tracing::debug!("Skipping migration `{}`: {}", migration, e);
        }
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Run `UPDATE <table> SET ... WHERE id = ?` over only the fields present.
/// Returns the number of rows changed (0 when `fields` is empty).
pub(super) fn update_fields(
    conn: &SqliteConnection,
    table: &str,
    id: &str,
    mut fields: Vec<(&'static str, Value)>,
    touch_updated_at: bool,
) -> rusqlite::Result<usize> {
    if fields.is_empty() {
        return Ok(0);
    }

    let mut sets: Vec<String> = fields
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect();
    if touch_updated_at {
        sets.push("updated_at = datetime('now')".to_string());
    }

    let sql = format!("UPDATE {} SET {} WHERE id = ?", table, sets.join(", "));
    fields.push(("id", Value::Text(id.to_string())));

    conn.execute(&sql, params_from_iter(fields.into_iter().map(|(_, v)| v)))
}

pub(super) fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

pub(super) fn flag(value: bool) -> Value {
    Value::Integer(value as i64)
}

pub(super) fn optional_text(value: Option<String>) -> Value {
    value.map(Value::Text).unwrap_or(Value::Null)
}

pub(super) fn json_text<T: serde::Serialize>(value: &T) -> Value {
    Value::Text(serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()))
}

pub(super) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

pub(super) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Read a required timestamp column, falling back to now for legacy rows.
pub(super) fn timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

pub(super) fn optional_timestamp(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_datetime(&s)))
}

pub(super) fn json_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_are_idempotent_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.db");
        let path = path.to_str().unwrap();

        Repository::new(path).await.unwrap();
        let repo = Repository::new(path).await.unwrap();

        let columns = repo
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('todos')")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        for column in ["due_date", "project_item_id", "github_id"] {
            assert_eq!(columns.iter().filter(|c| *c == column).count(), 1);
        }
    }

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        assert!(parse_datetime("2026-01-11 12:34:56").is_some());
        assert!(parse_datetime("2026-01-11T12:34:56+00:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
