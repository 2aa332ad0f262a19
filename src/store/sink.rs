//! The terminal consumer: an embedded SQLite table of subject-line stats.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::model::StatRecord;

/// Owns the single connection to the stats database.
///
/// Explicit lifecycle, no process-wide state: `open`, `ensure_schema`,
/// `insert`, `commit`, `close`. Inserts accumulate in an explicit batch
/// transaction that `commit` closes; rows written since the last commit are
/// lost on abnormal termination, by design.
pub struct StatsDb {
    conn: Connection,
    path: PathBuf,
    in_batch: bool,
}

impl StatsDb {
    /// Open (creating if needed) the database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened stats database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            in_batch: false,
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Idempotent table creation; the id column is the primary key.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS email_stats(id TEXT PRIMARY KEY, date TEXT, subject INT)",
            [],
        )?;
        Ok(())
    }

    /// Insert-or-ignore one record.
    ///
    /// A colliding id is a silent no-op (first write wins, expected when
    /// re-scanning overlapping sources). Returns whether a row was actually
    /// written.
    pub fn insert(&mut self, record: &StatRecord) -> Result<bool> {
        if !self.in_batch {
            self.conn.execute_batch("BEGIN")?;
            self.in_batch = true;
        }
        let changed = {
            let mut stmt = self.conn.prepare_cached(
                "INSERT OR IGNORE INTO email_stats VALUES (?1, ?2, ?3)",
            )?;
            stmt.execute(params![
                record.id,
                record.date_string(),
                record.subject_chars
            ])?
        };
        Ok(changed > 0)
    }

    /// Durably flush the open batch, if any.
    pub fn commit(&mut self) -> Result<()> {
        if self.in_batch {
            self.conn.execute_batch("COMMIT")?;
            self.in_batch = false;
        }
        Ok(())
    }

    /// Number of rows currently in the table.
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM email_stats", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Commit any open batch and close the connection.
    pub fn close(mut self) -> Result<()> {
        self.commit()?;
        self.conn
            .close()
            .map_err(|(_, e)| ScanError::Database(e))?;
        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, date: (i32, u32, u32), len: i64) -> StatRecord {
        StatRecord {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            subject_chars: len,
        }
    }

    fn open_temp() -> (tempfile::TempDir, StatsDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = StatsDb::open(dir.path().join("stats.db")).unwrap();
        db.ensure_schema().unwrap();
        (dir, db)
    }

    #[test]
    fn test_schema_is_idempotent() {
        let (_dir, db) = open_temp();
        db.ensure_schema().unwrap();
        db.ensure_schema().unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_id_first_write_wins() {
        let (_dir, mut db) = open_temp();

        assert!(db.insert(&record("<a@x>", (2004, 1, 5), 2)).unwrap());
        // Same id, different payload: silently ignored, not updated.
        assert!(!db.insert(&record("<a@x>", (2010, 6, 1), 99)).unwrap());
        db.commit().unwrap();

        assert_eq!(db.count().unwrap(), 1);
        let (date, len): (String, i64) = db
            .connection()
            .query_row(
                "SELECT date, subject FROM email_stats WHERE id = '<a@x>'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(date, "2004-01-05");
        assert_eq!(len, 2);
    }

    #[test]
    fn test_commit_without_batch_is_a_no_op() {
        let (_dir, mut db) = open_temp();
        db.commit().unwrap();
        db.commit().unwrap();
    }

    #[test]
    fn test_rows_survive_close_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");

        let mut db = StatsDb::open(&path).unwrap();
        db.ensure_schema().unwrap();
        db.insert(&record("<a@x>", (2004, 1, 5), 2)).unwrap();
        db.insert(&record("<b@x>", (2005, 2, 6), 7)).unwrap();
        db.close().unwrap();

        let db = StatsDb::open(&path).unwrap();
        assert_eq!(db.count().unwrap(), 2);
    }
}
