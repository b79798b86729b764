mod clock;
mod controller;
mod engine;
mod format;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{SaveStatus, TimerController, DEFAULT_SAVE_STATUS_CLEAR};
pub use engine::{CompletedRun, TimerEngine, TimerStatus};
pub use format::format_hhmmss;
pub use ticker::{ManualTicker, Ticker, TokioTicker, TICK_PERIOD};
