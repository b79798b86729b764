use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SaveStatus, TimerStatus};

/// Every timer state change produces an Event.
/// The CLI prints them as JSON; a UI would render from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Periodic display refresh while running.
    TimerTick {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The run ended and the timer is back at `initial`.
    TimerStopped {
        duration_secs: u64,
        save_status: SaveStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        at: DateTime<Utc>,
    },
    /// Full state snapshot.
    StateSnapshot {
        status: TimerStatus,
        elapsed_secs: u64,
        display: String,
        save_status: SaveStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        started_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}
