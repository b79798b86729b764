use chrono::{Duration, NaiveDate};
use clap::Args;
use meditrack_core::auth::TokenStore;
use meditrack_core::timer::Clock;
use meditrack_core::SystemClock;

#[derive(Args)]
pub struct AnalyticsArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// Day after the last day of the range (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Range length in days when --start/--end are not given
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,
}

/// The last `days` days including today, as `[start, end)` dates.
pub fn default_range(today: NaiveDate, days: u32) -> (String, String) {
    let start = today - Duration::days(i64::from(days) - 1);
    let end = today + Duration::days(1);
    (
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    )
}

pub async fn run(args: AnalyticsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (default_start, default_end) = default_range(SystemClock.today(), args.days);
    let start = args.start.unwrap_or(default_start);
    let end = args.end.unwrap_or(default_end);

    let config = super::load_config()?;
    let token = super::token_store()
        .get_token()?
        .ok_or("not signed in; run `meditrack auth login --google-token <token>`")?;

    let client = super::api_client(&config)?;
    match client.get_analytics(&token, &start, &end).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => match (e.status(), e.server_message()) {
            (Some(400), Some(reason)) => Err(format!("invalid date range: {reason}").into()),
            _ => Err(e.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_covers_today() {
        let today = NaiveDate::from_ymd_opt(2023, 1, 7).unwrap();
        assert_eq!(
            default_range(today, 7),
            ("2023-01-01".to_string(), "2023-01-08".to_string())
        );
        assert_eq!(
            default_range(today, 1),
            ("2023-01-07".to_string(), "2023-01-08".to_string())
        );
    }
}
