//! Per-user meditation analytics over a date range.
//!
//! Sessions are bucketed by the UTC calendar day they started on, then
//! summarized into totals, a per-day average and consecutive-day streaks.

mod streak;

pub use streak::{current_streak, longest_streak};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{RangeError, StoreError};
use crate::session::{SessionQuery, SessionRecord, SessionStore};
use crate::timer::Clock;
use crate::validation::{validate_date_range, MAX_DATE_RANGE_DAYS};

/// Summary statistics for a range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Absent from backends that predate it.
    #[serde(default)]
    pub total_sessions: u64,
    pub total_minutes: u64,
    /// One decimal place.
    pub average_minutes_per_day: f64,
    pub days_with_sessions: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResult {
    pub start_date: String,
    pub end_date: String,
    pub summary: AnalyticsSummary,
    /// Seconds per `YYYY-MM-DD`. Days without sessions are absent.
    pub daily_totals: BTreeMap<String, u64>,
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error(transparent)]
    Validation(#[from] RangeError),

    #[error("Failed to fetch analytics data.")]
    Store(#[from] StoreError),
}

/// Sums durations per start day.
pub fn daily_totals(records: &[SessionRecord]) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.day()).or_insert(0) += record.duration_seconds;
    }
    totals
}

// Half-up rounding, matching how the web client rounds.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Builds the summary from bucketed totals.
///
/// `total_days` is the length of the queried period in (fractional) days.
pub fn summarize(
    totals: &BTreeMap<String, u64>,
    total_sessions: u64,
    total_days: f64,
    today: NaiveDate,
) -> AnalyticsSummary {
    let total_seconds: u64 = totals.values().sum();
    let average_minutes_per_day = if total_days > 0.0 {
        round_half_up(total_seconds as f64 / total_days / 60.0 * 10.0) / 10.0
    } else {
        0.0
    };

    let sorted_days: Vec<NaiveDate> = totals
        .keys()
        .filter_map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .collect();

    AnalyticsSummary {
        total_sessions,
        total_minutes: round_half_up(total_seconds as f64 / 60.0) as u64,
        average_minutes_per_day,
        days_with_sessions: totals.len() as u64,
        current_streak: current_streak(&sorted_days, today),
        longest_streak: longest_streak(&sorted_days),
    }
}

/// Validates a range, queries the store and aggregates the result.
pub struct AnalyticsAggregator<C> {
    clock: C,
    max_range_days: u32,
}

impl<C: Clock> AnalyticsAggregator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            max_range_days: MAX_DATE_RANGE_DAYS,
        }
    }

    pub fn with_max_range_days(mut self, max_range_days: u32) -> Self {
        self.max_range_days = max_range_days;
        self
    }

    /// The store is never touched when validation fails.
    pub fn get_analytics<S: SessionStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<AnalyticsResult, AnalyticsError> {
        let range = validate_date_range(start_date, end_date, self.max_range_days)?;

        let query = SessionQuery {
            user_id: user_id.to_string(),
            start: range.start,
            end: range.end,
        };
        let records = store.query(&query).map_err(|e| {
            tracing::error!(
                user_id = %user_id,
                start_date = %range.start_raw,
                end_date = %range.end_raw,
                error = %e,
                "session query failed"
            );
            e
        })?;

        let totals = daily_totals(&records);
        let summary = summarize(
            &totals,
            records.len() as u64,
            range.total_days(),
            self.clock.today(),
        );
        tracing::debug!(
            user_id = %user_id,
            sessions = summary.total_sessions,
            days = summary.days_with_sessions,
            "analytics computed"
        );

        Ok(AnalyticsResult {
            start_date: range.start_raw,
            end_date: range.end_raw,
            summary,
            daily_totals: totals,
        })
    }
}
