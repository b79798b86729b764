//! Session persistence adapter.
//!
//! Turns a finished timer run into a [`NewSession`] and submits it through
//! an authenticated [`SessionSink`]. Every step yields a tagged outcome; no
//! failure escapes as an error, so the timer can always reset afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::TokenStore;
use crate::error::ApiError;
use crate::session::{to_iso_string, NewSession};
use crate::validation::is_positive_number;

/// Where finished sessions are sent.
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Submit one session with a bearer token. Returns the generated id.
    async fn insert_session(&self, token: &str, session: &NewSession) -> Result<String, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveFailure {
    /// No token could be read from the token store.
    TokenUnavailable,
    /// The sink failed or was unreachable.
    StoreFailed {
        status: Option<u16>,
        body: Option<String>,
    },
}

impl SaveFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            SaveFailure::TokenUnavailable => "token-unavailable",
            SaveFailure::StoreFailed { .. } => "store-failed",
        }
    }
}

impl std::fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Zero-length or never-started run. Nothing was sent.
    Skipped,
    Success { session_id: String },
    Error(SaveFailure),
}

/// Submits finished runs. One attempt per run, no retry.
#[derive(Debug)]
pub struct SessionSaver<T, S> {
    tokens: T,
    sink: S,
}

impl<T: TokenStore, S: SessionSink> SessionSaver<T, S> {
    pub fn new(tokens: T, sink: S) -> Self {
        Self { tokens, sink }
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn submit(&self, started_at: Option<DateTime<Utc>>, duration_secs: i64) -> SaveOutcome {
        let Some(started_at) = started_at else {
            return SaveOutcome::Skipped;
        };
        if !is_positive_number(duration_secs as f64) {
            return SaveOutcome::Skipped;
        }

        let token = match self.tokens.get_token() {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                tracing::error!("no API token stored; cannot save session");
                return SaveOutcome::Error(SaveFailure::TokenUnavailable);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to retrieve API token; cannot save session");
                return SaveOutcome::Error(SaveFailure::TokenUnavailable);
            }
        };

        let session = NewSession::new(started_at, duration_secs as u64);
        tracing::info!(
            session_start_time = %to_iso_string(&session.session_start_time),
            duration_seconds = session.duration_seconds,
            "saving session"
        );

        match self.sink.insert_session(&token, &session).await {
            Ok(session_id) => {
                tracing::info!(%session_id, "session saved");
                SaveOutcome::Success { session_id }
            }
            Err(e) => {
                let status = e.status();
                let body = e.body().map(str::to_string);
                tracing::error!(
                    error = %e,
                    status = ?status,
                    body = ?body,
                    "failed to save session"
                );
                SaveOutcome::Error(SaveFailure::StoreFailed { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, NewSession)>>,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl SessionSink for RecordingSink {
        async fn insert_session(&self, token: &str, session: &NewSession) -> Result<String, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((token.to_string(), session.clone()));
            match self.fail_with {
                Some(status) => Err(ApiError::Status {
                    status,
                    body: Some(r#"{"error":"Failed to save session"}"#.into()),
                }),
                None => Ok("session-1".into()),
            }
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn zero_duration_is_skipped_without_a_call() {
        let saver = SessionSaver::new(MemoryTokenStore::with_token("t"), RecordingSink::default());
        assert_eq!(saver.submit(Some(start()), 0).await, SaveOutcome::Skipped);
        assert_eq!(saver.submit(Some(start()), -3).await, SaveOutcome::Skipped);
        assert_eq!(saver.submit(None, 60).await, SaveOutcome::Skipped);
        assert!(saver.sink().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_token_fails_before_the_sink() {
        let saver = SessionSaver::new(MemoryTokenStore::new(), RecordingSink::default());
        assert_eq!(
            saver.submit(Some(start()), 60).await,
            SaveOutcome::Error(SaveFailure::TokenUnavailable)
        );

        let saver = SessionSaver::new(MemoryTokenStore::failing(), RecordingSink::default());
        let outcome = saver.submit(Some(start()), 60).await;
        assert_eq!(outcome, SaveOutcome::Error(SaveFailure::TokenUnavailable));
        assert!(saver.sink().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_sends_exactly_one_payload() {
        let saver = SessionSaver::new(MemoryTokenStore::with_token("tok"), RecordingSink::default());
        let outcome = saver.submit(Some(start()), 1800).await;
        assert_eq!(
            outcome,
            SaveOutcome::Success {
                session_id: "session-1".into()
            }
        );

        let calls = saver.sink().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "tok");
        assert_eq!(calls[0].1.session_start_time, start());
        assert_eq!(calls[0].1.duration_seconds, 1800);
    }

    #[tokio::test]
    async fn sink_failure_is_classified() {
        let sink = RecordingSink {
            fail_with: Some(500),
            ..Default::default()
        };
        let saver = SessionSaver::new(MemoryTokenStore::with_token("tok"), sink);
        match saver.submit(Some(start()), 60).await {
            SaveOutcome::Error(failure) => {
                assert_eq!(failure.reason(), "store-failed");
                assert_eq!(
                    failure,
                    SaveFailure::StoreFailed {
                        status: Some(500),
                        body: Some(r#"{"error":"Failed to save session"}"#.into()),
                    }
                );
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(saver.sink().calls.lock().unwrap().len(), 1);
    }
}
