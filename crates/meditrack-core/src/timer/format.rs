/// Formats seconds as `HH:MM:SS`. Hours keep growing past 99.
///
/// Negative input is logged and rendered as `00:00:00`.
pub fn format_hhmmss(total_secs: i64) -> String {
    if total_secs < 0 {
        tracing::warn!(total_secs, "format_hhmmss received negative input");
        return "00:00:00".to_string();
    }
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
