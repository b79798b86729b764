//! Timer controller: owns the engine, its clock and its ticker, and runs
//! the stop-save-reset sequence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::engine::{TimerEngine, TimerStatus};
use super::format::format_hhmmss;
use super::ticker::{Ticker, TICK_PERIOD};
use crate::auth::TokenStore;
use crate::events::Event;
use crate::persistence::{SaveOutcome, SessionSaver, SessionSink};

/// How long a settled save status stays visible.
pub const DEFAULT_SAVE_STATUS_CLEAR: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Success,
    Error,
}

pub struct TimerController<C, K> {
    engine: TimerEngine,
    clock: C,
    ticker: K,
    save_status: SaveStatus,
    settled_at_ms: Option<u64>,
    clear_after: Duration,
}

impl<C: Clock, K: Ticker> TimerController<C, K> {
    pub fn new(clock: C, ticker: K) -> Self {
        Self::with_engine(TimerEngine::new(), clock, ticker)
    }

    /// Resume control of a previously saved engine. A running engine gets
    /// its ticker restarted.
    pub fn with_engine(engine: TimerEngine, clock: C, mut ticker: K) -> Self {
        if engine.status() == TimerStatus::Running {
            ticker.start(TICK_PERIOD);
        }
        Self {
            engine,
            clock,
            ticker,
            save_status: SaveStatus::Idle,
            settled_at_ms: None,
            clear_after: DEFAULT_SAVE_STATUS_CLEAR,
        }
    }

    pub fn with_save_status_clear(mut self, clear_after: Duration) -> Self {
        self.clear_after = clear_after;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn ticker(&self) -> &K {
        &self.ticker
    }

    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    pub fn display_secs(&self) -> u64 {
        self.engine.display_secs(self.clock.now_ms())
    }

    /// Current save status. `success`/`error` fall back to `idle` once
    /// the clear delay has passed.
    pub fn save_status(&self) -> SaveStatus {
        match (self.save_status, self.settled_at_ms) {
            (SaveStatus::Success | SaveStatus::Error, Some(settled)) => {
                let shown_ms = self.clock.now_ms().saturating_sub(settled);
                if u128::from(shown_ms) >= self.clear_after.as_millis() {
                    SaveStatus::Idle
                } else {
                    self.save_status
                }
            }
            (status, _) => status,
        }
    }

    pub fn snapshot(&self) -> Event {
        let elapsed = self.display_secs();
        Event::StateSnapshot {
            status: self.status(),
            elapsed_secs: elapsed,
            display: format_hhmmss(elapsed as i64),
            save_status: self.save_status(),
            started_at: self.engine.overall_start(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start(self.clock.now_ms())?;
        self.set_save_status(SaveStatus::Idle);
        self.ticker.start(TICK_PERIOD);
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause(self.clock.now_ms())?;
        self.ticker.stop();
        Some(event)
    }

    pub fn resume(&mut self) -> Option<Event> {
        let event = self.engine.resume(self.clock.now_ms())?;
        self.ticker.start(TICK_PERIOD);
        Some(event)
    }

    pub fn tick(&mut self) -> Option<Event> {
        self.engine.tick(self.clock.now_ms())
    }

    /// Ends the run, saves it, and returns the timer to `initial`.
    ///
    /// From `initial` nothing happens and `None` is returned. Otherwise the
    /// save is awaited to completion and the engine is reset on every path.
    /// If the returned future is dropped mid-save the engine is still reset
    /// and the save status settles to `error`.
    pub async fn stop<T, S>(&mut self, saver: &SessionSaver<T, S>) -> Option<Event>
    where
        T: TokenStore,
        S: SessionSink,
    {
        let run = self.engine.stop(self.clock.now_ms())?;
        self.ticker.stop();
        self.set_save_status(SaveStatus::Saving);

        let outcome = {
            let _reset = ResetOnDrop(self);
            saver.submit(run.started_at, run.duration_secs as i64).await
        };

        let (status, session_id, error) = match outcome {
            SaveOutcome::Skipped => (SaveStatus::Idle, None, None),
            SaveOutcome::Success { session_id } => (SaveStatus::Success, Some(session_id), None),
            SaveOutcome::Error(failure) => {
                (SaveStatus::Error, None, Some(failure.reason().to_string()))
            }
        };
        self.set_save_status(status);

        Some(Event::TimerStopped {
            duration_secs: run.duration_secs,
            save_status: status,
            session_id,
            error,
            at: self.clock.now(),
        })
    }

    /// Hands back the engine for persistence.
    pub fn into_engine(self) -> TimerEngine {
        self.engine
    }

    fn set_save_status(&mut self, status: SaveStatus) {
        self.save_status = status;
        self.settled_at_ms = match status {
            SaveStatus::Success | SaveStatus::Error => Some(self.clock.now_ms()),
            SaveStatus::Idle | SaveStatus::Saving => None,
        };
    }
}

struct ResetOnDrop<'a, C: Clock, K: Ticker>(&'a mut TimerController<C, K>);

impl<C: Clock, K: Ticker> Drop for ResetOnDrop<'_, C, K> {
    fn drop(&mut self) {
        self.0.engine.reset();
        if self.0.save_status == SaveStatus::Saving {
            self.0.set_save_status(SaveStatus::Error);
        }
    }
}
