//! Consecutive-day streaks over sorted calendar days.

use chrono::{Duration, NaiveDate};

/// Streak ending at the most recent day.
///
/// Zero when there are no days, or when the last day is older than
/// yesterday relative to `today`.
pub fn current_streak(sorted_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&last) = sorted_days.last() else {
        return 0;
    };
    if last < today - Duration::days(1) {
        return 0;
    }

    let mut streak = 1;
    for pair in sorted_days.windows(2).rev() {
        if (pair[1] - pair[0]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Longest run of consecutive days anywhere in the list.
pub fn longest_streak(sorted_days: &[NaiveDate]) -> u32 {
    if sorted_days.is_empty() {
        return 0;
    }

    let mut longest = 1;
    let mut run = 1;
    for pair in sorted_days.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(list: &[&str]) -> Vec<NaiveDate> {
        list.iter()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap())
            .collect()
    }

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let d = days(&["2023-01-05", "2023-01-06", "2023-01-07"]);
        assert_eq!(current_streak(&d, date("2023-01-07")), 3);
        assert_eq!(longest_streak(&d), 3);
    }

    #[test]
    fn gap_stops_the_backward_walk() {
        let d = days(&["2023-01-01", "2023-01-02", "2023-01-05", "2023-01-06", "2023-01-07"]);
        assert_eq!(current_streak(&d, date("2023-01-07")), 3);
        assert_eq!(longest_streak(&d), 3);
    }

    #[test]
    fn last_session_yesterday_keeps_streak() {
        let d = days(&["2023-01-05", "2023-01-06"]);
        assert_eq!(current_streak(&d, date("2023-01-07")), 2);
    }

    #[test]
    fn stale_history_has_no_current_streak() {
        let d = days(&["2023-01-04", "2023-01-05"]);
        assert_eq!(current_streak(&d, date("2023-01-07")), 0);
        assert_eq!(longest_streak(&d), 2);
    }

    #[test]
    fn empty_and_single() {
        assert_eq!(current_streak(&[], date("2023-01-07")), 0);
        assert_eq!(longest_streak(&[]), 0);
        let d = days(&["2023-01-07"]);
        assert_eq!(current_streak(&d, date("2023-01-07")), 1);
        assert_eq!(longest_streak(&d), 1);
    }

    #[test]
    fn longest_run_can_be_in_the_past() {
        let d = days(&[
            "2023-01-01", "2023-01-02", "2023-01-03", "2023-01-04", "2023-01-06",
        ]);
        assert_eq!(longest_streak(&d), 4);
        assert_eq!(current_streak(&d, date("2023-01-06")), 1);
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let d = days(&["2023-01-31", "2023-02-01"]);
        assert_eq!(current_streak(&d, date("2023-02-01")), 2);
    }
}
