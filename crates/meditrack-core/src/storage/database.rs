//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Meditation sessions, keyed by user
//! - Key-value store for application state (the CLI keeps its timer here)

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::StoreError;
use crate::session::{to_iso_string, NewSession, SessionQuery, SessionRecord, SessionStore};
use crate::validation::parse_iso_date;

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/meditrack/meditrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Self::open_at(dir.join("meditrack.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id          TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL,
                session_start_time  TEXT NOT NULL,
                duration_seconds    INTEGER NOT NULL CHECK (duration_seconds > 0),
                session_end_time    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_start
                ON sessions(user_id, session_start_time);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl SessionStore for Database {
    fn insert(&self, user_id: &str, session: &NewSession) -> Result<String, StoreError> {
        if session.duration_seconds == 0 {
            return Err(StoreError::Rejected("duration_seconds must be positive".into()));
        }
        let session_id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO sessions (session_id, user_id, session_start_time, duration_seconds, session_end_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                user_id,
                to_iso_string(&session.session_start_time),
                session.duration_seconds as i64,
                to_iso_string(&session.session_end_time()),
            ],
        )?;
        Ok(session_id)
    }

    fn query(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, user_id, session_start_time, duration_seconds, session_end_time
             FROM sessions
             WHERE user_id = ?1 AND session_start_time >= ?2 AND session_start_time <= ?3
             ORDER BY session_start_time ASC",
        )?;
        let rows = stmt.query_map(
            params![
                query.user_id,
                to_iso_string(&query.start),
                to_iso_string(&query.end),
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            let (session_id, user_id, start, duration, end) = row?;
            let corrupt = |message: &str| StoreError::CorruptRow {
                session_id: session_id.clone(),
                message: message.to_string(),
            };
            let session_start_time = parse_iso_date(&start).ok_or_else(|| corrupt("bad start time"))?;
            let session_end_time = parse_iso_date(&end).ok_or_else(|| corrupt("bad end time"))?;
            let duration_seconds = u64::try_from(duration).map_err(|_| corrupt("negative duration"))?;
            records.push(SessionRecord {
                session_id,
                user_id,
                session_start_time,
                duration_seconds,
                session_end_time,
            });
        }
        Ok(records)
    }
}
