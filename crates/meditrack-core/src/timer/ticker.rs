//! Periodic tick sources.
//!
//! A tick only asks the owner to recompute display time from the clock.
//! Late or dropped ticks therefore never skew the elapsed time.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Display refresh period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Starts and stops a recurring tick.
pub trait Ticker {
    fn start(&mut self, period: Duration);
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

/// Ticker driven by the caller. Records how it was used.
#[derive(Debug, Default, Clone)]
pub struct ManualTicker {
    active: bool,
    starts: usize,
    stops: usize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn stops(&self) -> usize {
        self.stops
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, _period: Duration) {
        self.active = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        if self.active {
            self.stops += 1;
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Ticker backed by a tokio interval task. Each tick is delivered as a
/// `()` on the receiver returned from [`TokioTicker::new`].
///
/// Must be started from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTicker {
    tx: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl TokioTicker {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, task: None }, rx)
    }
}

impl Ticker for TokioTicker {
    fn start(&mut self, period: Duration) {
        self.stop();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_ticker_counts_transitions() {
        let mut ticker = ManualTicker::new();
        ticker.stop();
        assert_eq!(ticker.stops(), 0);
        ticker.start(TICK_PERIOD);
        assert!(ticker.is_active());
        ticker.stop();
        assert!(!ticker.is_active());
        assert_eq!((ticker.starts(), ticker.stops()), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_ticker_delivers_ticks_until_stopped() {
        let (mut ticker, mut rx) = TokioTicker::new();
        ticker.start(TICK_PERIOD);
        assert!(ticker.is_active());

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert_eq!(rx.recv().await, Some(()));

        ticker.stop();
        assert!(!ticker.is_active());
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
