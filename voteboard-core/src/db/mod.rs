//! SQLite persistence layer.
//!
//! A single [`Database`] handle wraps the connection behind a mutex and
//! is cheap to clone across request handlers. All timestamps are stored
//! as RFC 3339 TEXT, ids as UUID TEXT.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::Result;

mod features;
mod projects;
mod schema;
mod stats;
mod votes;

pub use stats::{StatusCount, TopFeature};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database at the platform-default data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_db_path())
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        // journal_mode reports the resulting mode as a row, so it
        // can't go through execute_batch.
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        // Cascading deletes need foreign keys enabled per connection.
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Ok(())
    }

    /// Create all tables and indexes if they don't exist.
    pub fn migrate(&self) -> Result<()> {
        self.conn().execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock means another thread panicked mid-statement;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "voteboard")
        .map(|dirs| dirs.data_dir().join("voteboard.db"))
        .unwrap_or_else(|| PathBuf::from("voteboard.db"))
}

pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_id(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProjectInput;

    #[test]
    fn data_survives_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voteboard.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        db.create_project(CreateProjectInput {
            name: "Persistent".into(),
            slug: "persistent".into(),
            description: None,
            is_active: true,
            github_owner: None,
            github_repo: None,
            github_token: None,
        })
        .unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        // Migration is idempotent on an existing database.
        db.migrate().unwrap();
        let project = db.get_project_by_slug("persistent").unwrap().unwrap();
        assert_eq!(project.name, "Persistent");
    }
}
