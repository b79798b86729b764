//! TOML-based application configuration.
//!
//! Holds the settings for both binaries:
//! - Client: backend URL, request timeout, save-status display time
//! - Server: bind address, database path, allow-list, Google client id, API token secret
//! - Analytics: maximum queryable range
//!
//! Configuration is stored at `~/.config/meditrack/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::validation::MAX_DATE_RANGE_DAYS;

/// Client (CLI) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Seconds a `success`/`error` save status stays visible.
    #[serde(default = "default_save_status_clear_secs")]
    pub save_status_clear_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Defaults to `meditrack.db` in the data directory.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    #[serde(default)]
    pub google_client_id: Option<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/meditrack/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_save_status_clear_secs() -> u64 {
    3
}
fn default_bind_addr() -> String {
    "127.0.0.1:3000".into()
}
fn default_max_range_days() -> u32 {
    MAX_DATE_RANGE_DAYS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            save_status_clear_secs: default_save_status_clear_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: None,
            allowed_emails: Vec::new(),
            google_client_id: None,
            jwt_secret: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_range_days: default_max_range_days(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn save_status_clear(&self) -> Duration {
        Duration::from_secs(self.save_status_clear_secs)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn parse_leaf(
        key: &str,
        existing: &serde_json::Value,
        value: &str,
    ) -> Result<serde_json::Value, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let parsed = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Value::Number(n.into())
            }
            // Lists accept either a JSON array or comma-separated text.
            serde_json::Value::Array(_) => {
                if value.trim_start().starts_with('[') {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                } else {
                    serde_json::Value::Array(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(|s| serde_json::Value::String(s.to_string()))
                            .collect(),
                    )
                }
            }
            serde_json::Value::Object(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };
        Ok(parsed)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').filter(|p| !p.is_empty()).peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;
                let new_value = Self::parse_leaf(key, existing, value)?;
                obj.insert(part.to_string(), new_value);
                return Ok(());
            }
            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/meditrack"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// Optional values (`server.jwt_secret`, ...) are set as strings; the
    /// value type of every other key is kept.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Applies environment overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `MEDITRACK_API_URL`, `MEDITRACK_JWT_SECRET`, `ALLOWED_EMAILS`,
    /// `GOOGLE_CLIENT_ID` and `PORT` from `lookup`.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("MEDITRACK_API_URL") {
            self.client.api_base_url = url;
        }
        if let Some(secret) = lookup("MEDITRACK_JWT_SECRET") {
            self.server.jwt_secret = Some(secret);
        }
        if let Some(emails) = lookup("ALLOWED_EMAILS") {
            self.server.allowed_emails = emails
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(client_id) = lookup("GOOGLE_CLIENT_ID") {
            self.server.google_client_id = Some(client_id);
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => {
                    let host = self
                        .server
                        .bind_addr
                        .rsplit_once(':')
                        .map(|(host, _)| host.to_string())
                        .unwrap_or_else(|| "127.0.0.1".to_string());
                    self.server.bind_addr = format!("{host}:{port}");
                }
                Err(_) => tracing::warn!(port = %port, "ignoring unparseable PORT"),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.client.api_base_url, "http://localhost:3000/api");
        assert_eq!(parsed.analytics.max_range_days, 365);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[server]\nallowed_emails = [\"a@b.c\"]\n").unwrap();
        assert_eq!(parsed.server.allowed_emails, vec!["a@b.c"]);
        assert_eq!(parsed.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(parsed.client.request_timeout_secs, 10);
    }

    #[test]
    fn save_status_clear_reads_client_section() {
        let parsed: Config = toml::from_str("[client]\nsave_status_clear_secs = 7\n").unwrap();
        assert_eq!(parsed.client.save_status_clear(), Duration::from_secs(7));
        assert_eq!(Config::default().client.save_status_clear(), Duration::from_secs(3));
    }

    #[test]
    fn get_by_dotted_key() {
        let cfg = Config::default();
        assert_eq!(cfg.get("client.save_status_clear_secs").as_deref(), Some("3"));
        assert_eq!(cfg.get("server.log_format").as_deref(), Some("text"));
        assert_eq!(cfg.get("server.jwt_secret").as_deref(), Some(""));
        assert!(cfg.get("nope.key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_keeps_value_types() {
        let mut cfg = Config::default();
        cfg.set("client.request_timeout_secs", "30").unwrap();
        cfg.set("server.allowed_emails", "a@x.io, b@x.io").unwrap();
        cfg.set("server.jwt_secret", "s3cret").unwrap();
        cfg.set("server.log_format", "json").unwrap();
        assert_eq!(cfg.client.request_timeout_secs, 30);
        assert_eq!(cfg.server.allowed_emails, vec!["a@x.io", "b@x.io"]);
        assert_eq!(cfg.server.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.server.log_format, LogFormat::Json);
    }

    #[test]
    fn set_rejects_unknown_and_invalid() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("client.nope", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("client.request_timeout_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("server.log_format", "xml"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("analytics.max_range_days", "30").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().analytics.max_range_days, 30);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "client = 5").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("MEDITRACK_API_URL", "https://api.example.com/api"),
            ("MEDITRACK_JWT_SECRET", "k"),
            ("ALLOWED_EMAILS", "one@x.io,,two@x.io "),
            ("GOOGLE_CLIENT_ID", "cid"),
            ("PORT", "8080"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::default().with_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.client.api_base_url, "https://api.example.com/api");
        assert_eq!(cfg.server.jwt_secret.as_deref(), Some("k"));
        assert_eq!(cfg.server.allowed_emails, vec!["one@x.io", "two@x.io"]);
        assert_eq!(cfg.server.google_client_id.as_deref(), Some("cid"));
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn blank_or_bad_env_values_are_ignored() {
        let cfg = Config::default().with_overrides_from(|k| match k {
            "MEDITRACK_JWT_SECRET" => Some("  ".into()),
            "PORT" => Some("eighty".into()),
            _ => None,
        });
        assert_eq!(cfg, Config::default());
    }
}
