use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

const AUDIT_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS uploads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    datetime TEXT NOT NULL,
    username TEXT NOT NULL,
    width INTEGER NOT NULL,
    filename TEXT NOT NULL,
    status INTEGER NOT NULL,
    log INTEGER NOT NULL,
    site TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_uploads_filename ON uploads(filename);
"#;

/// Rows are written once, before any image I/O, and never updated.
pub const STATUS_ATTEMPTED: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub datetime: DateTime<Utc>,
    pub username: String,
    pub width: u32,
    pub filename: String,
    pub status: i64,
    pub log: bool,
    pub site: String,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}px ({})", self.filename, self.width, self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuditRecord {
    pub id: i64,
    pub record: AuditRecord,
}

pub trait AuditStore {
    /// Persist one record and return its row id.
    fn insert(&mut self, record: &AuditRecord) -> Result<i64>;
}

pub struct SqliteAuditStore {
    connection: Connection,
}

impl SqliteAuditStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database parent directory {}", parent.display())
            })?;
        }
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        connection
            .busy_timeout(Duration::from_secs(5))
            .context("failed to set sqlite busy timeout")?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL journal mode")?;

        let store = Self { connection };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.connection
            .execute_batch(AUDIT_SCHEMA_SQL)
            .context("failed to initialize audit schema")
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM uploads", [], |row| row.get(0))
            .context("failed to count audit rows")?;
        usize::try_from(count).context("audit row count does not fit into usize")
    }

    /// Newest rows first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredAuditRecord>> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT id, datetime, username, width, filename, status, log, site
                 FROM uploads ORDER BY id DESC LIMIT ?1",
            )
            .context("failed to prepare audit query")?;
        let limit = i64::try_from(limit).context("limit does not fit into i64")?;
        let rows = statement
            .query_map([limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .context("failed to run audit query")?;

        let mut out = Vec::new();
        for row in rows {
            let (id, datetime, username, width, filename, status, log, site) =
                row.context("failed to decode audit row")?;
            let datetime = DateTime::parse_from_rfc3339(&datetime)
                .with_context(|| format!("invalid datetime in audit row {id}: {datetime}"))?
                .with_timezone(&Utc);
            out.push(StoredAuditRecord {
                id,
                record: AuditRecord {
                    datetime,
                    username,
                    width: u32::try_from(width)
                        .with_context(|| format!("invalid width in audit row {id}"))?,
                    filename,
                    status,
                    log,
                    site,
                },
            });
        }
        Ok(out)
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&mut self, record: &AuditRecord) -> Result<i64> {
        self.connection
            .execute(
                "INSERT INTO uploads (datetime, username, width, filename, status, log, site)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.datetime.to_rfc3339(),
                    record.username,
                    i64::from(record.width),
                    record.filename,
                    record.status,
                    record.log,
                    record.site,
                ],
            )
            .with_context(|| format!("failed to insert audit row for {}", record.filename))?;
        Ok(self.connection.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;

    fn record(filename: &str, width: u32) -> AuditRecord {
        AuditRecord {
            datetime: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            username: "Alice".to_string(),
            width,
            filename: filename.to_string(),
            status: STATUS_ATTEMPTED,
            log: true,
            site: "uk.wikipedia".to_string(),
        }
    }

    #[test]
    fn insert_and_read_back_newest_first() {
        let temp = tempdir().expect("tempdir");
        let mut store = SqliteAuditStore::open(&temp.path().join("data").join("audit.db"))
            .expect("open store");

        let first = store.insert(&record("File:One.png", 800)).expect("insert");
        let second = store.insert(&record("File:Two.jpg", 640)).expect("insert");
        assert!(second > first);
        assert_eq!(store.count().expect("count"), 2);

        let rows = store.recent(10).expect("recent");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[0].record, record("File:Two.jpg", 640));
        assert_eq!(rows[1].record.filename, "File:One.png");

        assert_eq!(store.recent(1).expect("recent").len(), 1);
    }

    #[test]
    fn reopening_keeps_existing_rows() {
        let temp = tempdir().expect("tempdir");
        let db_path = temp.path().join("audit.db");
        {
            let mut store = SqliteAuditStore::open(&db_path).expect("open store");
            store.insert(&record("File:One.png", 800)).expect("insert");
        }
        let store = SqliteAuditStore::open(&db_path).expect("reopen store");
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn display_matches_log_line_format() {
        assert_eq!(
            record("File:One.png", 800).to_string(),
            "File:One.png to 800px (Alice)"
        );
    }
}
