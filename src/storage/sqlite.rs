use super::MetadataIndex;
use crate::error::Result;
use crate::types::SpecRecord;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schemas (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        app_name    TEXT NOT NULL,
        app_version TEXT NOT NULL,
        file_path   TEXT NOT NULL,
        created_at  TEXT DEFAULT (datetime('now')),
        UNIQUE(app_name, app_version)
    );
"#;

const SELECT_COLUMNS: &str = "SELECT id, app_name, app_version, file_path, created_at FROM schemas";

/// SQLite-backed index. Each operation opens its own connection, which is
/// closed when it drops at the end of the call on every exit path.
pub struct SqliteIndex {
    db_path: PathBuf,
}

impl SqliteIndex {
    /// Open (creating if needed) the database file and the `schemas` table.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let index = Self { db_path };
        let conn = index.connect()?;
        conn.execute_batch(CREATE_TABLE)?;
        info!("Metadata index ready at {}", index.db_path.display());
        Ok(index)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }
}

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Rows written by this crate carry RFC 3339; rows defaulted by SQLite carry
/// `YYYY-MM-DD HH:MM:SS` in UTC.
fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|n| n.and_utc()),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SpecRecord> {
    let created_at: String = row.get(4)?;
    let created_at = parse_timestamp(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(SpecRecord {
        id: row.get(0)?,
        app_name: row.get(1)?,
        app_version: row.get(2)?,
        file_path: row.get(3)?,
        created_at,
    })
}

impl MetadataIndex for SqliteIndex {
    fn find_by_name_version(
        &self,
        app_name: &str,
        app_version: &str,
    ) -> Result<Option<SpecRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE app_name = ?1 AND app_version = ?2"),
                params![app_name, app_version],
                row_to_record,
            )
            .optional()?;
        Ok(row)
    }

    fn find_all_by_name(&self, app_name: &str) -> Result<Vec<SpecRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE app_name = ?1"))?;
        let rows = stmt
            .query_map(params![app_name], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<SpecRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), params![id], row_to_record)
            .optional()?;
        Ok(row)
    }

    fn insert(&self, app_name: &str, app_version: &str, file_path: &str) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO schemas (app_name, app_version, file_path, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![app_name, app_version, file_path, now_text()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted schema row {} for {} {}", id, app_name, app_version);
        Ok(id)
    }

    fn update_path(&self, id: i64, file_path: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE schemas SET file_path = ?1, created_at = ?2 WHERE id = ?3",
            params![file_path, now_text(), id],
        )?;
        Ok(())
    }

    fn touch_timestamp(&self, id: i64) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE schemas SET created_at = ?1 WHERE id = ?2",
            params![now_text(), id],
        )?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<SpecRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let rows = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.connect()?;
        let removed = conn.execute("DELETE FROM schemas", [])?;
        conn.execute("DELETE FROM sqlite_sequence WHERE name = 'schemas'", [])?;
        Ok(removed)
    }
}
