mod config;
pub mod database;

pub use config::{AnalyticsConfig, ClientConfig, Config, LogFormat, ServerConfig};
pub use database::Database;

use std::path::PathBuf;

/// Returns `~/.config/meditrack[-dev]/` based on MEDITRACK_ENV.
///
/// Set MEDITRACK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("MEDITRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("meditrack-dev")
    } else {
        base_dir.join("meditrack")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
