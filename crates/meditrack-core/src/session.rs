//! Session records and the store seam.
//!
//! Timestamps travel as ISO-8601 strings in the `2023-01-02T10:00:00.000Z`
//! shape (UTC, millisecond precision). Every stored start time uses exactly
//! that shape, so range filters can compare the text directly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A session as submitted by a client, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    #[serde(with = "iso_millis")]
    pub session_start_time: DateTime<Utc>,
    pub duration_seconds: u64,
}

impl NewSession {
    pub fn new(session_start_time: DateTime<Utc>, duration_seconds: u64) -> Self {
        Self {
            session_start_time,
            duration_seconds,
        }
    }

    /// `session_start_time + duration_seconds`.
    pub fn session_end_time(&self) -> DateTime<Utc> {
        self.session_start_time + Duration::seconds(self.duration_seconds as i64)
    }
}

/// A persisted meditation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    #[serde(with = "iso_millis")]
    pub session_start_time: DateTime<Utc>,
    pub duration_seconds: u64,
    #[serde(with = "iso_millis")]
    pub session_end_time: DateTime<Utc>,
}

impl SessionRecord {
    /// Calendar day (`YYYY-MM-DD`, UTC) the session started on.
    pub fn day(&self) -> String {
        to_iso_string(&self.session_start_time)[..10].to_string()
    }
}

/// Range filter for [`SessionStore::query`]. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub user_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Persistence for session records.
pub trait SessionStore {
    /// Insert a session for `user_id`, returning the generated session id.
    fn insert(&self, user_id: &str, session: &NewSession) -> Result<String, StoreError>;

    /// All sessions for the user whose start time lies in the query range,
    /// ordered by start time ascending.
    fn query(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>, StoreError>;
}

/// Formats a UTC instant the way the wire format and the store expect it.
pub fn to_iso_string(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Serde adapter for ISO-8601 timestamps with millisecond precision.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&super::to_iso_string(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        crate::validation::parse_iso_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
    }
}
