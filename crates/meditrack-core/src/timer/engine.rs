//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It holds no clock
//! and spawns nothing: every command takes the current instant, and the
//! owner is responsible for calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Initial -> Running <-> Paused
//! Running | Paused -> Stopped -> Initial
//! ```
//!
//! Elapsed time is always derived from `now - segment_start`, never from a
//! count of ticks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Initial,
    Running,
    Paused,
    /// Transient: the run has ended and its save is in flight.
    Stopped,
}

/// A finished run, ready to be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedRun {
    /// Instant of the first `start()` of the run.
    pub started_at: Option<DateTime<Utc>>,
    /// Active (non-paused) seconds.
    pub duration_secs: u64,
}

/// Core timer engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEngine {
    status: TimerStatus,
    /// Seconds from segments completed before the current running segment.
    accumulated_secs: u64,
    /// Start of the current running segment (ms since epoch).
    #[serde(default)]
    segment_start_ms: Option<u64>,
    /// First `start()` of this run (ms since epoch).
    #[serde(default)]
    overall_start_ms: Option<u64>,
    /// Highest value handed out by `display_secs`.
    #[serde(default)]
    high_water_secs: u64,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn accumulated_secs(&self) -> u64 {
        self.accumulated_secs
    }

    pub fn overall_start(&self) -> Option<DateTime<Utc>> {
        self.overall_start_ms.and_then(ms_to_datetime)
    }

    pub fn segment_start(&self) -> Option<DateTime<Utc>> {
        self.segment_start_ms.and_then(ms_to_datetime)
    }

    /// Seconds to display at `now_ms`.
    ///
    /// Equals `accumulated` unless running. Never lower than a value
    /// previously returned for this run, even if the clock steps back.
    pub fn display_secs(&self, now_ms: u64) -> u64 {
        match self.status {
            TimerStatus::Running => self.running_total(now_ms).max(self.high_water_secs),
            _ => self.accumulated_secs,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Initial {
            return None;
        }
        self.status = TimerStatus::Running;
        self.accumulated_secs = 0;
        self.high_water_secs = 0;
        self.segment_start_ms = Some(now_ms);
        self.overall_start_ms = Some(now_ms);
        Some(Event::TimerStarted {
            at: ms_to_datetime(now_ms)?,
        })
    }

    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.fold_segment(now_ms);
        self.status = TimerStatus::Paused;
        Some(Event::TimerPaused {
            elapsed_secs: self.accumulated_secs,
            at: ms_to_datetime(now_ms)?,
        })
    }

    pub fn resume(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Paused {
            return None;
        }
        self.status = TimerStatus::Running;
        self.segment_start_ms = Some(now_ms);
        Some(Event::TimerResumed {
            elapsed_secs: self.accumulated_secs,
            at: ms_to_datetime(now_ms)?,
        })
    }

    /// Call periodically while running. Returns `None` in any other state.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        let elapsed = self.display_secs(now_ms);
        self.high_water_secs = elapsed;
        Some(Event::TimerTick {
            elapsed_secs: elapsed,
            at: ms_to_datetime(now_ms)?,
        })
    }

    /// Ends the run and moves to `Stopped`.
    ///
    /// From `Initial` this resets to defaults and reports nothing. The
    /// caller is expected to `reset()` once the run has been dealt with.
    pub fn stop(&mut self, now_ms: u64) -> Option<CompletedRun> {
        match self.status {
            TimerStatus::Running => self.fold_segment(now_ms),
            TimerStatus::Paused => {}
            TimerStatus::Initial | TimerStatus::Stopped => {
                self.reset();
                return None;
            }
        }
        self.status = TimerStatus::Stopped;
        Some(CompletedRun {
            started_at: self.overall_start(),
            duration_secs: self.accumulated_secs,
        })
    }

    /// Back to `Initial` with every counter cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn running_total(&self, now_ms: u64) -> u64 {
        let segment_ms = self
            .segment_start_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0);
        self.accumulated_secs + segment_ms / 1000
    }

    fn fold_segment(&mut self, now_ms: u64) {
        self.accumulated_secs = self.display_secs(now_ms);
        self.high_water_secs = self.accumulated_secs;
        self.segment_start_ms = None;
    }
}

fn ms_to_datetime(ms: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(i64::try_from(ms).ok()?)
}
