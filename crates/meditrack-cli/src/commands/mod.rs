pub mod analytics;
pub mod auth;
pub mod config;
pub mod timer;

use meditrack_core::auth::KeyringTokenStore;
use meditrack_core::{ApiClient, Config};

/// Config file plus environment overrides.
pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    Ok(Config::load()?.with_env_overrides())
}

pub fn api_client(config: &Config) -> Result<ApiClient, Box<dyn std::error::Error>> {
    Ok(ApiClient::new(
        &config.client.api_base_url,
        config.client.request_timeout(),
    )?)
}

/// Keyring slot for the API token; the dev environment gets its own.
pub fn token_store() -> KeyringTokenStore {
    match std::env::var("MEDITRACK_ENV").as_deref() {
        Ok("dev") => KeyringTokenStore::with_service("meditrack-dev"),
        _ => KeyringTokenStore::new(),
    }
}
