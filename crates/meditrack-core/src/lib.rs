//! # MediTrack Core Library
//!
//! Core logic for the MediTrack meditation timer. The CLI and the backend
//! server are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: A wall-clock-based state machine counting active seconds.
//!   The caller drives display refreshes through an injected ticker.
//! - **Persistence**: Turns a stopped run into a session record and submits
//!   it with the stored API token
//! - **Analytics**: Daily totals, averages and streaks over a date range
//! - **Storage**: SQLite session store and TOML configuration
//! - **Auth**: Token storage, API token signing, allow-list and Google sign-in
//!
//! ## Key Components
//!
//! - [`TimerController`]: Timer state machine plus its stop-save-reset sequence
//! - [`AnalyticsAggregator`]: Range validation and aggregation
//! - [`Database`]: Session persistence
//! - [`ApiClient`]: HTTP client for the backend
//! - [`Config`]: Application configuration management

pub mod analytics;
pub mod api;
pub mod auth;
pub mod error;
pub mod events;
pub mod persistence;
pub mod session;
pub mod storage;
pub mod timer;
pub mod validation;

pub use analytics::{AnalyticsAggregator, AnalyticsError, AnalyticsResult, AnalyticsSummary};
pub use api::ApiClient;
pub use error::{ApiError, AuthError, ConfigError, CoreError, PayloadError, RangeError, StoreError};
pub use events::Event;
pub use persistence::{SaveFailure, SaveOutcome, SessionSaver, SessionSink};
pub use session::{NewSession, SessionQuery, SessionRecord, SessionStore};
pub use storage::{Config, Database};
pub use timer::{Clock, SaveStatus, SystemClock, TimerController, TimerEngine, TimerStatus};
