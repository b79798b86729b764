//! End-to-end session flow tests.
//!
//! A timer run is stopped and saved through the real `ApiClient` against a
//! mocked backend, then analytics are computed over a real SQLite store.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use meditrack_core::auth::MemoryTokenStore;
use meditrack_core::timer::{ManualClock, ManualTicker};
use meditrack_core::{
    AnalyticsAggregator, ApiClient, ApiError, Database, Event, NewSession, SaveStatus,
    SessionSaver, SessionStore, TimerController, TimerStatus,
};
use mockito::Matcher;

// ============================================================================
// Test Helpers
// ============================================================================

fn api_client(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(&format!("{}/api", server.url()), Duration::from_secs(5)).unwrap()
}

fn clock_at(day: u32, hour: u32) -> ManualClock {
    ManualClock::at(Utc.with_ymd_and_hms(2023, 1, day, hour, 0, 0).unwrap())
}

// ============================================================================
// Timer -> ApiClient
// ============================================================================

#[tokio::test]
async fn test_stop_posts_session_with_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .match_header("authorization", "Bearer api-token")
        .match_body(Matcher::Json(serde_json::json!({
            "session_start_time": "2023-01-02T09:00:00.000Z",
            "duration_seconds": 600,
        })))
        .with_status(201)
        .with_body(r#"{"sessionId":"s-1","message":"Session saved successfully"}"#)
        .create_async()
        .await;

    let clock = clock_at(2, 9);
    let saver = SessionSaver::new(MemoryTokenStore::with_token("api-token"), api_client(&server));
    let mut timer = TimerController::new(clock.clone(), ManualTicker::new());

    timer.start();
    clock.advance_secs(600);
    let event = timer.stop(&saver).await.unwrap();

    mock.assert_async().await;
    match event {
        Event::TimerStopped { duration_secs, save_status, session_id, .. } => {
            assert_eq!(duration_secs, 600);
            assert_eq!(save_status, SaveStatus::Success);
            assert_eq!(session_id.as_deref(), Some("s-1"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(timer.status(), TimerStatus::Initial);
}

#[tokio::test]
async fn test_backend_failure_resets_timer() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/sessions")
        .with_status(500)
        .with_body(r#"{"error":"Failed to save session"}"#)
        .create_async()
        .await;

    let clock = clock_at(2, 9);
    let saver = SessionSaver::new(MemoryTokenStore::with_token("api-token"), api_client(&server));
    let mut timer = TimerController::new(clock.clone(), ManualTicker::new());

    timer.start();
    clock.advance_secs(42);
    let event = timer.stop(&saver).await.unwrap();

    assert!(matches!(
        event,
        Event::TimerStopped { save_status: SaveStatus::Error, .. }
    ));
    assert_eq!(timer.status(), TimerStatus::Initial);
    assert_eq!(timer.display_secs(), 0);
}

#[tokio::test]
async fn test_missing_token_never_calls_backend() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/sessions")
        .expect(0)
        .create_async()
        .await;

    let clock = clock_at(2, 9);
    let saver = SessionSaver::new(MemoryTokenStore::new(), api_client(&server));
    let mut timer = TimerController::new(clock.clone(), ManualTicker::new());

    timer.start();
    clock.advance_secs(42);
    timer.stop(&saver).await;

    mock.assert_async().await;
    assert_eq!(timer.save_status(), SaveStatus::Error);
}

// ============================================================================
// ApiClient
// ============================================================================

#[tokio::test]
async fn test_get_analytics_parses_result() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/analytics")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("startDate".into(), "2023-01-01".into()),
            Matcher::UrlEncoded("endDate".into(), "2023-01-08".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"startDate":"2023-01-01","endDate":"2023-01-08",
                "summary":{"totalSessions":2,"totalMinutes":45,"averageMinutesPerDay":6.4,
                           "daysWithSessions":2,"currentStreak":0,"longestStreak":2},
                "dailyTotals":{"2023-01-02":1800,"2023-01-03":900}}"#,
        )
        .create_async()
        .await;

    let result = api_client(&server)
        .get_analytics("tok", "2023-01-01", "2023-01-08")
        .await
        .unwrap();
    assert_eq!(result.summary.total_minutes, 45);
    assert_eq!(result.daily_totals.get("2023-01-03"), Some(&900));
}

#[tokio::test]
async fn test_validation_error_carries_reason_code() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/analytics")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"message":"endDate.beforeStartDate","error":"End date must be after start date."}"#)
        .create_async()
        .await;

    let err = api_client(&server)
        .get_analytics("tok", "2023-01-08", "2023-01-01")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.server_message().as_deref(), Some("endDate.beforeStartDate"));
}

#[tokio::test]
async fn test_exchange_google_token() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/auth/google")
        .match_body(Matcher::Json(serde_json::json!({"googleToken": "g-id"})))
        .with_status(200)
        .with_body(r#"{"apiToken":"issued"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/auth/google")
        .match_body(Matcher::Json(serde_json::json!({"googleToken": "stranger"})))
        .with_status(403)
        .with_body(r#"{"error":"Access denied: your email is not allowed."}"#)
        .create_async()
        .await;

    let client = api_client(&server);
    assert_eq!(client.exchange_google_token("g-id").await.unwrap(), "issued");
    let err = client.exchange_google_token("stranger").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 403, .. }));
}

// ============================================================================
// Analytics over SQLite
// ============================================================================

#[test]
fn test_analytics_over_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(dir.path().join("meditrack.db")).unwrap();
    let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2023, 1, d, h, 0, 0).unwrap();

    db.insert("u1", &NewSession::new(at(2, 7), 1200)).unwrap();
    db.insert("u1", &NewSession::new(at(2, 21), 600)).unwrap();
    db.insert("u1", &NewSession::new(at(3, 7), 900)).unwrap();
    db.insert("u2", &NewSession::new(at(3, 8), 3600)).unwrap();
    db.insert("u1", &NewSession::new(at(20, 7), 900)).unwrap();

    let aggregator = AnalyticsAggregator::new(clock_at(3, 22));
    let result = aggregator
        .get_analytics(&db, "u1", Some("2023-01-01"), Some("2023-01-08"))
        .unwrap();

    assert_eq!(result.summary.total_sessions, 3);
    assert_eq!(result.summary.total_minutes, 45);
    assert_eq!(result.summary.days_with_sessions, 2);
    assert_eq!(result.summary.current_streak, 2);
    assert_eq!(result.summary.longest_streak, 2);
    assert_eq!(result.daily_totals.len(), 2);
    assert_eq!(result.daily_totals["2023-01-02"], 1800);
}
